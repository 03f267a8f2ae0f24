use serde::{Deserialize, Serialize};
use validator::Validate;

/// One call's worth of parameters for the generation service.
///
/// Built once per attempt and never mutated afterwards; escalated retries build
/// a fresh request with the new temperature instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct GenerationRequest {
    #[validate(length(min = 1))]
    pub prompt: String,
    #[validate(length(min = 1))]
    pub model: String,
    #[validate(range(min = 1))]
    pub max_tokens: u32,
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
    pub context_tag: String,
}

impl GenerationRequest {
    pub fn new(
        prompt: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
        context_tag: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens,
            temperature,
            context_tag: context_tag.into(),
        }
    }
}

/// Text returned by the generation service for a given attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOutput {
    pub text: String,
    pub attempt_index: u32,
}

impl RawOutput {
    pub fn empty(attempt_index: u32) -> Self {
        Self {
            text: String::new(),
            attempt_index,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}
