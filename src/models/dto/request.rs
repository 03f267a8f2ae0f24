use serde::Deserialize;
use validator::Validate;

use crate::models::domain::Variant;

/// Caller-supplied description of one content item to generate an FAQ for.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct GenerateFaqRequest {
    #[validate(length(min = 1, max = 300))]
    pub title: String,

    #[validate(url)]
    pub url: String,

    /// May be left empty in batch files; the batch runner fetches it from `url`.
    #[serde(default)]
    #[validate(length(min = 1, message = "source text cannot be empty"))]
    pub source_text: String,

    #[serde(default = "default_language")]
    #[validate(length(min = 1, max = 40))]
    pub language: String,

    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub allow_external_links: bool,

    #[serde(default)]
    pub variant: Variant,

    /// Phrases the variation guard wants kept out of this batch.
    #[serde(default)]
    pub banned_phrases: Vec<String>,

    /// Topical angle supplied by the variation guard.
    #[serde(default)]
    pub angle: Option<String>,

    /// Correlates calls to the duplicate guard; generated when absent.
    #[serde(default)]
    pub context_tag: Option<String>,
}

fn default_language() -> String {
    "English".to_string()
}

impl GenerateFaqRequest {
    pub fn new(title: impl Into<String>, url: impl Into<String>, source_text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source_text: source_text.into(),
            language: default_language(),
            ..Self::default()
        }
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_angle(mut self, angle: impl Into<String>) -> Self {
        self.angle = Some(angle.into());
        self
    }

    pub fn with_context_tag(mut self, tag: impl Into<String>) -> Self {
        self.context_tag = Some(tag.into());
        self
    }
}
