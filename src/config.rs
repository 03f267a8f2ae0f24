use std::{env, time::Duration};

use secrecy::{ExposeSecret, SecretString};
use validator::Validate;

use crate::{
    constants::prompts::{FAQ_FILL_TEMPLATE, FAQ_LONG_TEMPLATE, FAQ_REWRITE_TEMPLATE, FAQ_SHORT_TEMPLATE},
    errors::{AppError, AppResult},
    models::domain::Variant,
};

/// Runtime settings read from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub openai_api_key: SecretString,
    pub openai_api_base: String,
    pub model: String,
    pub base_temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
    pub similarity_threshold: f64,
    pub output_garble_chars: usize,
    pub record_garble_chars: usize,
    pub max_source_chars: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: SecretString::from(env::var("OPENAI_API_KEY").unwrap_or_default()),
            openai_api_base: env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            model: env::var("FAQ_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            base_temperature: parse_env("FAQ_BASE_TEMPERATURE", 0.7),
            max_tokens: parse_env("FAQ_MAX_TOKENS", 2000),
            request_timeout_secs: parse_env("FAQ_REQUEST_TIMEOUT_SECS", 90),
            similarity_threshold: parse_env("FAQ_SIMILARITY_THRESHOLD", 0.7),
            output_garble_chars: parse_env("FAQ_OUTPUT_GARBLE_CHARS", 60),
            record_garble_chars: parse_env("FAQ_RECORD_GARBLE_CHARS", 40),
            max_source_chars: parse_env("FAQ_MAX_SOURCE_CHARS", 12_000),
        }
    }

    /// Rejects settings that would make every generation call fail.
    pub fn validate_for_production(&self) -> AppResult<()> {
        let api_key = self.openai_api_key.expose_secret();

        if api_key.trim().is_empty() {
            return Err(AppError::ValidationError(
                "OPENAI_API_KEY is not set".to_string(),
            ));
        }

        if !self.openai_api_base.starts_with("http") {
            return Err(AppError::ValidationError(format!(
                "OPENAI_API_BASE must be an http(s) URL, got '{}'",
                self.openai_api_base
            )));
        }

        self.pipeline_config().validate()?;
        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            model: self.model.clone(),
            base_temperature: self.base_temperature,
            max_tokens: self.max_tokens,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            similarity_threshold: self.similarity_threshold,
            output_garble_chars: self.output_garble_chars,
            max_source_chars: self.max_source_chars,
            quality: QualityThresholds {
                max_token_chars: self.record_garble_chars,
                ..QualityThresholds::default()
            },
            ..PipelineConfig::default()
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            openai_api_key: SecretString::from("test-key".to_string()),
            openai_api_base: "http://localhost:8080/v1".to_string(),
            model: "test-model".to_string(),
            base_temperature: 0.7,
            max_tokens: 1500,
            request_timeout_secs: 5,
            similarity_threshold: 0.7,
            output_garble_chars: 60,
            record_garble_chars: 40,
            max_source_chars: 12_000,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Per-record content thresholds used by the quality filter.
#[derive(Clone, Debug, PartialEq, Validate)]
pub struct QualityThresholds {
    #[validate(range(min = 1))]
    pub min_answer_words: usize,
    #[validate(range(min = 1))]
    pub min_question_words: usize,
    #[validate(range(min = 8))]
    pub max_token_chars: usize,
    #[validate(range(min = 2))]
    pub repetition_window: usize,
    #[validate(range(min = 2))]
    pub repetition_limit: usize,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_answer_words: 15,
            min_question_words: 3,
            max_token_chars: 40,
            repetition_window: 8,
            repetition_limit: 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PromptTemplates {
    pub short: String,
    pub long: String,
    pub fill: String,
    pub rewrite: String,
}

impl PromptTemplates {
    pub fn for_variant(&self, variant: Variant) -> &str {
        match variant {
            Variant::Short => &self.short,
            Variant::Long => &self.long,
        }
    }
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            short: FAQ_SHORT_TEMPLATE.to_string(),
            long: FAQ_LONG_TEMPLATE.to_string(),
            fill: FAQ_FILL_TEMPLATE.to_string(),
            rewrite: FAQ_REWRITE_TEMPLATE.to_string(),
        }
    }
}

/// Read-only tuning shared by every pipeline invocation.
#[derive(Clone, Debug, PartialEq, Validate)]
pub struct PipelineConfig {
    #[validate(length(min = 1))]
    pub model: String,
    #[validate(range(min = 0.0, max = 2.0))]
    pub base_temperature: f32,
    #[validate(range(min = 0.0, max = 1.0))]
    pub temperature_step: f32,
    #[validate(range(min = 0.0, max = 2.0))]
    pub max_escalated_temperature: f32,
    #[validate(range(min = 1))]
    pub max_tokens: u32,
    pub request_timeout: Duration,
    #[validate(range(min = 1))]
    pub min_records: usize,
    #[validate(range(min = 1, max = 5))]
    pub max_fill_per_request: usize,
    #[validate(range(min = 0.0, max = 1.0))]
    pub similarity_threshold: f64,
    #[validate(range(min = 8))]
    pub output_garble_chars: usize,
    #[validate(range(min = 1))]
    pub max_source_chars: usize,
    #[validate(nested)]
    pub quality: QualityThresholds,
    pub templates: PromptTemplates,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_temperature: 0.7,
            temperature_step: 0.15,
            max_escalated_temperature: 1.2,
            max_tokens: 2000,
            request_timeout: Duration::from_secs(90),
            min_records: 3,
            max_fill_per_request: 5,
            similarity_threshold: 0.7,
            output_garble_chars: 60,
            max_source_chars: 12_000,
            quality: QualityThresholds::default(),
            templates: PromptTemplates::default(),
        }
    }
}

impl PipelineConfig {
    /// Temperature for the 1-based `attempt`; escalation starts on attempt 2.
    pub fn temperature_for_attempt(&self, attempt: u32) -> f32 {
        if attempt <= 1 {
            return self.base_temperature;
        }
        let escalated = self.base_temperature + self.temperature_step * (attempt - 1) as f32;
        escalated.min(self.max_escalated_temperature)
    }
}
