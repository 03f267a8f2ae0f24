use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    config::PipelineConfig,
    models::domain::{ValidationReason, ValidationResult},
    services::{
        record_extractor::{Extraction, RecordExtractor},
        text_helpers::strip_tags_spaced,
    },
};

static QUESTION_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<h3[\s>]").expect("QUESTION_HEADING_RE is a valid regex pattern")
});
static PARAGRAPH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<p[\s>]").expect("PARAGRAPH_RE is a valid regex pattern"));
static LINK_OR_EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:https?://|www\.)\S+|\b[\w.+-]+@[\w-]+\.[\w.-]+\b")
        .expect("LINK_OR_EMAIL_RE is a valid regex pattern")
});

/// Verdict for one normalized output. The extraction is kept whenever the
/// validator got far enough to run it, so callers never parse twice.
#[derive(Debug, Clone)]
pub struct Validation {
    pub result: ValidationResult,
    pub extraction: Option<Extraction>,
}

impl Validation {
    fn rejected(reason: ValidationReason) -> Self {
        Self {
            result: ValidationResult::rejected(reason, 0),
            extraction: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.result.valid
    }
}

/// Whole-output checks, run in a fixed order. The first failure wins.
#[derive(Debug, Clone)]
pub struct StructuralValidator {
    extractor: RecordExtractor,
    garble_chars: usize,
    min_records: usize,
}

impl StructuralValidator {
    pub fn new(extractor: RecordExtractor, garble_chars: usize, min_records: usize) -> Self {
        Self {
            extractor,
            garble_chars,
            min_records,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            RecordExtractor::from_config(config),
            config.output_garble_chars,
            config.min_records,
        )
    }

    pub fn extractor(&self) -> &RecordExtractor {
        &self.extractor
    }

    pub fn validate(&self, normalized: &str) -> Validation {
        if normalized.trim().is_empty() {
            return Validation::rejected(ValidationReason::EmptyOutput);
        }
        if !QUESTION_HEADING_RE.is_match(normalized) {
            return Validation::rejected(ValidationReason::NoHeadings);
        }
        if !PARAGRAPH_RE.is_match(normalized) {
            return Validation::rejected(ValidationReason::NoParagraphs);
        }
        if let Some(token) = self.garbled_token(normalized) {
            return Validation::rejected(ValidationReason::GarbledText { token });
        }

        let extraction = self.extractor.extract(normalized);
        let clean = extraction.clean_count();
        let result = if clean >= self.min_records {
            ValidationResult::accepted(clean)
        } else {
            ValidationResult::rejected(
                ValidationReason::TooFewCleanFaqs {
                    raw: extraction.candidate_count,
                    clean,
                },
                clean,
            )
        };

        Validation {
            result,
            extraction: Some(extraction),
        }
    }

    fn garbled_token(&self, html: &str) -> Option<String> {
        let text = strip_tags_spaced(html);
        let text = LINK_OR_EMAIL_RE.replace_all(&text, " ");
        text.split_whitespace()
            .find(|token| token.chars().count() > self.garble_chars)
            .map(str::to_string)
    }
}
