use serde::{Deserialize, Serialize};

/// Whole-output verdict taxonomy. `Valid` is the only accepting reason.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ValidationReason {
    Valid,
    EmptyOutput,
    NoHeadings,
    NoParagraphs,
    GarbledText { token: String },
    TooFewCleanFaqs { raw: usize, clean: usize },
}

impl ValidationReason {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationReason::Valid => "valid",
            ValidationReason::EmptyOutput => "empty_output",
            ValidationReason::NoHeadings => "no_headings",
            ValidationReason::NoParagraphs => "no_paragraphs",
            ValidationReason::GarbledText { .. } => "garbled_text",
            ValidationReason::TooFewCleanFaqs { .. } => "too_few_clean_faqs",
        }
    }
}

impl std::fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationReason::GarbledText { token } => {
                write!(f, "garbled_text ({})", token)
            }
            ValidationReason::TooFewCleanFaqs { raw, clean } => {
                write!(f, "too_few_clean_faqs (raw={}, clean={})", raw, clean)
            }
            other => write!(f, "{}", other.code()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub record_count: usize,
    pub reason: ValidationReason,
}

impl ValidationResult {
    pub fn accepted(record_count: usize) -> Self {
        Self {
            valid: true,
            record_count,
            reason: ValidationReason::Valid,
        }
    }

    pub fn rejected(reason: ValidationReason, record_count: usize) -> Self {
        Self {
            valid: false,
            record_count,
            reason,
        }
    }
}
