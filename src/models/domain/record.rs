use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single question/answer unit extracted from generated output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub question: String,
    pub answer_plain: String,
    pub answer_html: String,
    pub content_hash: String,
}

impl Record {
    pub fn new(
        question: impl Into<String>,
        answer_plain: impl Into<String>,
        answer_html: impl Into<String>,
    ) -> Self {
        let question = question.into().trim().to_string();
        let answer_plain = answer_plain.into().trim().to_string();
        let content_hash = content_hash(&question, &answer_plain);
        Self {
            question,
            answer_plain,
            answer_html: answer_html.into(),
            content_hash,
        }
    }
}

/// sha256 over the case-folded, whitespace-collapsed question and answer.
pub fn content_hash(question: &str, answer_plain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_for_hash(question).as_bytes());
    hasher.update(normalize_for_hash(answer_plain).as_bytes());
    format!("{:x}", hasher.finalize())
}

fn normalize_for_hash(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Why an individual record was discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    EmptyQuestion,
    EmptyAnswer,
    AnswerTooShort,
    QuestionTooShort,
    ErrorMessage,
    FrameworkCode,
    FilePath,
    ProgrammingSyntax,
    SqlStatement,
    JsonResponse,
    CodeBlock,
    ScriptMarker,
    PromptEcho,
    MarkdownSyntax,
    GarbledText,
    RepetitiveText,
    QuestionMarkup,
    DuplicateContent,
    SimilarQuestion,
}

impl RejectionReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::EmptyQuestion => "empty_question",
            RejectionReason::EmptyAnswer => "empty_answer",
            RejectionReason::AnswerTooShort => "answer_too_short",
            RejectionReason::QuestionTooShort => "question_too_short",
            RejectionReason::ErrorMessage => "error_message",
            RejectionReason::FrameworkCode => "framework_code",
            RejectionReason::FilePath => "file_path",
            RejectionReason::ProgrammingSyntax => "programming_syntax",
            RejectionReason::SqlStatement => "sql_statement",
            RejectionReason::JsonResponse => "json_response",
            RejectionReason::CodeBlock => "code_block",
            RejectionReason::ScriptMarker => "script_marker",
            RejectionReason::PromptEcho => "prompt_echo",
            RejectionReason::MarkdownSyntax => "markdown_syntax",
            RejectionReason::GarbledText => "garbled_text",
            RejectionReason::RepetitiveText => "repetitive_text",
            RejectionReason::QuestionMarkup => "question_markup",
            RejectionReason::DuplicateContent => "duplicate_content",
            RejectionReason::SimilarQuestion => "similar_question",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityVerdict {
    pub valid: bool,
    pub reason: Option<RejectionReason>,
}

impl QualityVerdict {
    pub fn pass() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn reject(reason: RejectionReason) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// Discarded candidate, kept only for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub question: String,
    pub answer_plain: String,
    pub reason: RejectionReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_ignores_case_and_spacing() {
        let a = Record::new("What is  solar power?", "It is energy from the sun.", "<p>x</p>");
        let b = Record::new("what is solar power?", "It is  energy from the SUN.", "<p>y</p>");
        assert_eq!(a.content_hash, b.content_hash);
    }

    #[test]
    fn content_hash_differs_for_different_answers() {
        let a = Record::new("What is solar power?", "Energy from the sun.", "");
        let b = Record::new("What is solar power?", "Energy from the wind.", "");
        assert_ne!(a.content_hash, b.content_hash);
    }

    #[test]
    fn record_trims_question_and_answer() {
        let record = Record::new("  How long does it take?  ", "\n About a week. ", "<p>About a week.</p>");
        assert_eq!(record.question, "How long does it take?");
        assert_eq!(record.answer_plain, "About a week.");
    }

    #[test]
    fn rejection_reason_serializes_as_code() {
        let json = serde_json::to_string(&RejectionReason::ErrorMessage).expect("serialize");
        assert_eq!(json, "\"error_message\"");
        assert_eq!(RejectionReason::ErrorMessage.to_string(), "error_message");
    }
}
