use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    config::PipelineConfig,
    models::{
        domain::{AttemptDiagnostic, GenerationRequest, RawOutput, RejectionReason, RetryState},
        dto::response::ExhaustedReport,
    },
    services::{
        duplicate_guard::{DuplicateGuard, Rewriter},
        generation_client::{generate_with_timeout, GenerationClient},
        output_normalizer::normalize_output,
        prompt_composer::{compose_prompt, PromptContext},
        record_extractor::Extraction,
        structural_validator::StructuralValidator,
    },
};

/// The attempt that passed structural validation, after the duplicate guard.
#[derive(Debug, Clone)]
pub struct AcceptedAttempt {
    pub attempt: u32,
    pub raw_text: String,
    pub normalized: String,
    pub extraction: Extraction,
    pub trail: Vec<AttemptDiagnostic>,
    pub guard_rewrote: bool,
}

#[derive(Debug, Clone)]
pub enum RetryOutcome {
    Accepted(Box<AcceptedAttempt>),
    Exhausted(ExhaustedReport),
}

/// Drives generate, normalize and validate for up to three attempts with
/// escalating temperature.
pub struct RetryController {
    client: Arc<dyn GenerationClient>,
    guard: Arc<dyn DuplicateGuard>,
    validator: StructuralValidator,
    config: Arc<PipelineConfig>,
}

impl RetryController {
    pub fn new(
        client: Arc<dyn GenerationClient>,
        guard: Arc<dyn DuplicateGuard>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            client,
            guard,
            validator: StructuralValidator::from_config(&config),
            config,
        }
    }

    pub async fn run(&self, prompt: &str, context_tag: &str) -> RetryOutcome {
        let mut state = RetryState::new();
        let mut last_raw = String::new();
        let mut last_normalized = String::new();

        while let Some(attempt) = state.advance() {
            let temperature = self.config.temperature_for_attempt(attempt);
            let request = GenerationRequest::new(
                prompt,
                &self.config.model,
                self.config.max_tokens,
                temperature,
                context_tag,
            );

            let (raw, failure) =
                match generate_with_timeout(self.client.as_ref(), &request, self.config.request_timeout)
                    .await
                {
                    Ok(text) => (
                        RawOutput {
                            text,
                            attempt_index: attempt,
                        },
                        None,
                    ),
                    Err(err) => {
                        log::warn!(
                            "Generation attempt {} for {} failed: {}",
                            attempt,
                            context_tag,
                            err
                        );
                        (RawOutput::empty(attempt), Some(err.to_string()))
                    }
                };

            let normalized = normalize_output(&raw.text);
            let validation = self.validator.validate(&normalized);
            log::info!(
                "Attempt {} for {} at temperature {:.2}: {}",
                attempt,
                context_tag,
                temperature,
                validation.result.reason
            );

            let rejected: Vec<RejectionReason> = validation
                .extraction
                .as_ref()
                .map(|extraction| extraction.rejected.iter().map(|r| r.reason).collect())
                .unwrap_or_default();
            let mut diagnostic =
                AttemptDiagnostic::new(attempt, temperature, validation.result.reason.clone())
                    .with_record_count(validation.result.record_count)
                    .with_rejected(rejected);
            let returned_text = failure.is_none();
            if let Some(detail) = failure {
                diagnostic = diagnostic.with_detail(detail);
            }
            state.record(diagnostic);

            match validation.extraction {
                Some(extraction) if validation.result.valid => {
                    let guarded = self
                        .apply_guard(context_tag, temperature, raw.text, normalized, extraction)
                        .await;
                    return RetryOutcome::Accepted(Box::new(AcceptedAttempt {
                        attempt,
                        raw_text: guarded.raw_text,
                        normalized: guarded.normalized,
                        extraction: guarded.extraction,
                        trail: state.trail,
                        guard_rewrote: guarded.rewrote,
                    }));
                }
                // Failed calls carry no text; keep the last output that did.
                _ if returned_text => {
                    last_raw = raw.text;
                    last_normalized = normalized;
                }
                _ => {}
            }
        }

        log::warn!(
            "Generation for {} exhausted after {} attempts",
            context_tag,
            state.attempt
        );
        RetryOutcome::Exhausted(ExhaustedReport {
            attempts: state.trail,
            last_raw,
            last_normalized,
        })
    }

    /// Runs the duplicate guard once. A rewrite must itself pass validation,
    /// otherwise the accepted output stands.
    async fn apply_guard(
        &self,
        context_tag: &str,
        temperature: f32,
        raw_text: String,
        normalized: String,
        extraction: Extraction,
    ) -> GuardedOutput {
        let rewriter = ClientRewriter {
            client: Arc::clone(&self.client),
            template: self.config.templates.rewrite.clone(),
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature,
            context_tag: context_tag.to_string(),
            timeout: self.config.request_timeout,
            used: AtomicBool::new(false),
        };
        let original = GuardedOutput {
            raw_text,
            normalized,
            extraction,
            rewrote: false,
        };

        let guarded = self
            .guard
            .guard_duplicates(context_tag, &original.normalized, &rewriter)
            .await;
        if guarded.trim() == original.normalized.trim() {
            return original;
        }

        let rewritten = normalize_output(&guarded);
        let validation = self.validator.validate(&rewritten);
        match validation.extraction {
            Some(rewritten_extraction) if validation.result.valid => {
                log::info!("Duplicate guard rewrote output for {}", context_tag);
                GuardedOutput {
                    raw_text: guarded,
                    normalized: rewritten,
                    extraction: rewritten_extraction,
                    rewrote: true,
                }
            }
            _ => {
                log::warn!(
                    "Rewritten output for {} failed validation ({}), keeping original",
                    context_tag,
                    validation.result.reason
                );
                original
            }
        }
    }
}

struct GuardedOutput {
    raw_text: String,
    normalized: String,
    extraction: Extraction,
    rewrote: bool,
}

/// Rewriter backed by the generation client. Only the first call reaches
/// the client; later calls return `None`.
struct ClientRewriter {
    client: Arc<dyn GenerationClient>,
    template: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    context_tag: String,
    timeout: Duration,
    used: AtomicBool,
}

#[async_trait]
impl Rewriter for ClientRewriter {
    async fn rewrite(&self, text: &str) -> Option<String> {
        if self.used.swap(true, Ordering::SeqCst) {
            log::debug!("Rewrite for {} already used", self.context_tag);
            return None;
        }

        let context = PromptContext {
            source_text: text.to_string(),
            ..PromptContext::default()
        };
        let prompt = compose_prompt(&self.template, &context, text.chars().count());
        let request = GenerationRequest::new(
            prompt,
            &self.model,
            self.max_tokens,
            self.temperature,
            &self.context_tag,
        );

        match generate_with_timeout(self.client.as_ref(), &request, self.timeout).await {
            Ok(text) => Some(text),
            Err(err) => {
                log::warn!("Rewrite for {} failed: {}", self.context_tag, err);
                None
            }
        }
    }
}
