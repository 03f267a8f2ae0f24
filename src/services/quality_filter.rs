use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    config::QualityThresholds,
    constants::prompts::PROMPT_ECHO_MARKERS,
    models::domain::{QualityVerdict, RejectionReason},
    services::text_helpers::word_count,
};

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:https?://|www\.)\S+|\b[\w.+-]+@[\w-]+\.[\w.-]+\b")
        .expect("URL_RE is a valid regex pattern")
});

static ERROR_VOCAB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:fatal|parse|syntax) error\b|\bstack ?trace\b|traceback \(most recent call last\)|\buncaught\b|\bcall to undefined\b|\bundefined (?:index|variable|offset|method|property)\b|\bon line \d+\b|\b(?:warning|notice|deprecated):\s+\w+\(|\bsegmentation fault\b|\bnull pointer\b",
    )
    .expect("ERROR_VOCAB_RE is a valid regex pattern")
});
static EXCEPTION_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:[A-Z][a-z]+)+(?:Exception|Error):").expect("EXCEPTION_NAME_RE is a valid regex pattern")
});
static FRAMEWORK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:wp_[a-z_]+|add_action|add_filter|apply_filters|do_action|get_option|update_option|get_post_meta|get_the_[a-z_]+|esc_html|esc_attr|_e|__)\s*\(|\$wpdb\b|\bWP_(?:Query|Error|Post)\b",
    )
    .expect("FRAMEWORK_RE is a valid regex pattern")
});
static FILE_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:/var/www|/usr/(?:local|share|lib)/|/home/[A-Za-z0-9_-]+/|/?wp-(?:content|includes|admin)/|\b[A-Za-z]:\\[A-Za-z0-9_]|[\w/-]+\.(?:php|ini|env|log)\b)",
    )
    .expect("FILE_PATH_RE is a valid regex pattern")
});
static PROGRAMMING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\$[A-Za-z_]\w*\s*(?:=|->|\[)|\bfunction\s*\w*\s*\([^)]*\)\s*\{|\b(?:if|for|foreach|while|switch)\s*\([^)]*\)\s*\{|=>|;\s*\}|\breturn\s+[^.;\s]+\s*;|\b(?:var|let|const)\s+\w+\s*=|\bdef\s+\w+\s*\(|\b\w+\(\)\s*;|\bnew\s+[A-Z]\w*\(",
    )
    .expect("PROGRAMMING_RE is a valid regex pattern")
});
static SQL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bSELECT\s+[\w*,.\s]+\s+FROM\s+\w+|\bINSERT\s+INTO\b|\bUPDATE\s+\w+\s+SET\b|\bDELETE\s+FROM\b|\b(?:DROP|CREATE|ALTER|TRUNCATE)\s+TABLE\b",
    )
    .expect("SQL_RE is a valid regex pattern")
});
static JSON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^\s*[\[{]\s*"|"[A-Za-z_]+"\s*:\s*(?:"|\d|\[|\{|true\b|false\b|null\b)|\{\s*"(?:error|code|message|status|data)""#,
    )
    .expect("JSON_RE is a valid regex pattern")
});
static CODE_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```|`[^`\n]+`|(?i)<(?:code|pre)\b").expect("CODE_BLOCK_RE is a valid regex pattern")
});
static SCRIPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\s*/?\s*script\b|<\?php|<\?xml|<\?=|\?>").expect("SCRIPT_RE is a valid regex pattern")
});
static MARKDOWN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)(?:^|[>\s])#{1,6}\s+\w|(?:^|>)\s*[-*+]\s+\w|(?:^|>)\s*\d+[.)]\s+\w|\*\*[^*]+\*\*|__\w[^_]*__",
    )
    .expect("MARKDOWN_RE is a valid regex pattern")
});
static QUESTION_MARKUP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[A-Za-z/!?][^>]*>|&(?:lt|gt|amp|nbsp|quot);|\*\*|^\s*#|\[/?[a-z_]+\]|`")
        .expect("QUESTION_MARKUP_RE is a valid regex pattern")
});

/// Per-record content check. Verdicts depend only on the inputs and the
/// thresholds it was built with.
#[derive(Clone, Debug, Default)]
pub struct QualityFilter {
    thresholds: QualityThresholds,
}

impl QualityFilter {
    pub fn new(thresholds: QualityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &QualityThresholds {
        &self.thresholds
    }

    pub fn check(&self, question: &str, answer_plain: &str, answer_html: &str) -> QualityVerdict {
        match self.first_violation(question.trim(), answer_plain.trim(), answer_html) {
            Some(reason) => QualityVerdict::reject(reason),
            None => QualityVerdict::pass(),
        }
    }

    fn first_violation(
        &self,
        question: &str,
        answer_plain: &str,
        answer_html: &str,
    ) -> Option<RejectionReason> {
        if question.is_empty() {
            return Some(RejectionReason::EmptyQuestion);
        }
        if answer_plain.is_empty() {
            return Some(RejectionReason::EmptyAnswer);
        }
        if word_count(answer_plain) < self.thresholds.min_answer_words {
            return Some(RejectionReason::AnswerTooShort);
        }
        if word_count(question) < self.thresholds.min_question_words {
            return Some(RejectionReason::QuestionTooShort);
        }

        let scrubbed = URL_RE.replace_all(answer_plain, " ");
        let scrubbed = scrubbed.as_ref();

        if ERROR_VOCAB_RE.is_match(scrubbed) || EXCEPTION_NAME_RE.is_match(scrubbed) {
            return Some(RejectionReason::ErrorMessage);
        }
        if FRAMEWORK_RE.is_match(scrubbed) {
            return Some(RejectionReason::FrameworkCode);
        }
        if FILE_PATH_RE.is_match(scrubbed) {
            return Some(RejectionReason::FilePath);
        }
        if PROGRAMMING_RE.is_match(scrubbed) {
            return Some(RejectionReason::ProgrammingSyntax);
        }
        if SQL_RE.is_match(scrubbed) {
            return Some(RejectionReason::SqlStatement);
        }
        if JSON_RE.is_match(scrubbed) {
            return Some(RejectionReason::JsonResponse);
        }
        if CODE_BLOCK_RE.is_match(answer_plain) || CODE_BLOCK_RE.is_match(answer_html) {
            return Some(RejectionReason::CodeBlock);
        }
        if SCRIPT_RE.is_match(answer_plain) || SCRIPT_RE.is_match(answer_html) {
            return Some(RejectionReason::ScriptMarker);
        }
        if echoes_prompt(answer_plain) {
            return Some(RejectionReason::PromptEcho);
        }
        if MARKDOWN_RE.is_match(answer_plain) || MARKDOWN_RE.is_match(answer_html) {
            return Some(RejectionReason::MarkdownSyntax);
        }
        if self.has_garbled_token(answer_plain) {
            return Some(RejectionReason::GarbledText);
        }
        if self.is_repetitive(answer_plain) {
            return Some(RejectionReason::RepetitiveText);
        }
        if QUESTION_MARKUP_RE.is_match(question) {
            return Some(RejectionReason::QuestionMarkup);
        }
        None
    }

    fn has_garbled_token(&self, text: &str) -> bool {
        text.split_whitespace()
            .filter(|token| !URL_RE.is_match(token))
            .any(|token| token.chars().count() >= self.thresholds.max_token_chars)
    }

    fn is_repetitive(&self, text: &str) -> bool {
        let words: Vec<String> = text
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        let window = self.thresholds.repetition_window;
        if words.len() < window {
            return false;
        }

        let mut counts: HashMap<&[String], usize> = HashMap::new();
        for slice in words.windows(window) {
            let count = counts.entry(slice).or_insert(0);
            *count += 1;
            if *count >= self.thresholds.repetition_limit {
                return true;
            }
        }
        false
    }
}

fn echoes_prompt(answer_plain: &str) -> bool {
    let lower = answer_plain.to_lowercase();
    PROMPT_ECHO_MARKERS.iter().any(|marker| lower.contains(marker))
}
