use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::PipelineConfig,
    errors::{AppError, AppResult},
    models::{
        domain::Batch,
        dto::{
            request::GenerateFaqRequest,
            response::{PipelineDiagnostics, PipelineOutcome},
        },
    },
    services::{
        duplicate_guard::{DuplicateGuard, PassthroughGuard},
        gap_filler::GapFiller,
        generation_client::GenerationClient,
        prompt_composer::{compose_prompt, PromptContext},
        rebuilder::rebuild_html,
        retry_controller::{RetryController, RetryOutcome},
        sanitizer::{AllowListSanitizer, AllowedTags, Sanitizer},
    },
};

/// Generation, validation, extraction and repair for one content item.
///
/// Holds only shared read-only state, so one instance can serve any number
/// of concurrent calls.
pub struct FaqPipeline {
    guard: Arc<dyn DuplicateGuard>,
    sanitizer: Arc<dyn Sanitizer>,
    config: Arc<PipelineConfig>,
    retry: RetryController,
    filler: GapFiller,
}

impl FaqPipeline {
    pub fn new(
        client: Arc<dyn GenerationClient>,
        guard: Arc<dyn DuplicateGuard>,
        sanitizer: Arc<dyn Sanitizer>,
        config: Arc<PipelineConfig>,
    ) -> AppResult<Self> {
        config.validate()?;

        Ok(Self {
            retry: RetryController::new(Arc::clone(&client), Arc::clone(&guard), Arc::clone(&config)),
            filler: GapFiller::new(client, Arc::clone(&config)),
            guard,
            sanitizer,
            config,
        })
    }

    /// Pipeline with the passthrough guard and the allow-list sanitizer.
    pub fn with_defaults(client: Arc<dyn GenerationClient>, config: Arc<PipelineConfig>) -> AppResult<Self> {
        Self::new(
            client,
            Arc::new(PassthroughGuard),
            Arc::new(AllowListSanitizer),
            config,
        )
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn generate(&self, request: GenerateFaqRequest) -> AppResult<PipelineOutcome> {
        request.validate()?;

        let context_tag = request
            .context_tag
            .clone()
            .filter(|tag| !tag.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        log::info!(
            "Generating {} FAQ for '{}' ({})",
            request.variant,
            request.title,
            context_tag
        );

        let context = PromptContext::from_request(&request);
        let prompt = compose_prompt(
            self.config.templates.for_variant(request.variant),
            &context,
            self.config.max_source_chars,
        );
        let prompt = self
            .guard
            .inject_variation(&prompt, request.angle.as_deref(), &context_tag);

        let accepted = match self.retry.run(&prompt, &context_tag).await {
            RetryOutcome::Accepted(accepted) => accepted,
            RetryOutcome::Exhausted(report) => {
                return Err(AppError::ExhaustedRetries(Box::new(report)));
            }
        };
        let accepted = *accepted;
        let extraction = accepted.extraction;

        let mut diagnostics = PipelineDiagnostics {
            attempts: accepted.trail,
            rejected: extraction.rejected,
            extraction_strategy: extraction.strategy,
            guard_rewrote: accepted.guard_rewrote,
            ..PipelineDiagnostics::default()
        };
        let dropped_any = !diagnostics.rejected.is_empty();

        let mut batch = Batch::new(request.variant);
        for record in extraction.records {
            batch.push(record);
        }

        let mut added = 0;
        if !batch.is_full() {
            let pass = self.filler.fill(&mut batch, &context, &context_tag).await;
            added = pass.report.added;
            diagnostics.rejected.extend(pass.rejected);
            diagnostics.fill = Some(pass.report);
        }

        diagnostics.rebuilt = dropped_any || added > 0;
        let html = if diagnostics.rebuilt {
            log::info!(
                "Rebuilding output for {} from {} surviving records",
                context_tag,
                batch.len()
            );
            rebuild_html(
                extraction.leading_header.as_deref(),
                batch.records(),
                extraction.sources_html.as_deref(),
            )
        } else {
            accepted.normalized
        };
        let final_html = self
            .sanitizer
            .clean(&html, &AllowedTags::for_output(request.allow_external_links));

        log::info!(
            "Finished {} with {} records after {} attempt(s)",
            context_tag,
            batch.len(),
            accepted.attempt
        );

        Ok(PipelineOutcome {
            context_tag,
            final_html,
            raw_text: accepted.raw_text,
            records: batch.into_records(),
            attempts_used: accepted.attempt,
            diagnostics,
            generated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::GenerationError,
        models::domain::Variant,
        services::generation_client::MockGenerationClient,
        test_utils::{
            fixtures::{answer_text, faq_html, question_text, records_html},
            scripted::ScriptedGenerationClient,
        },
    };

    fn request() -> GenerateFaqRequest {
        GenerateFaqRequest::new(
            "Heat pumps explained",
            "https://example.com/heat-pumps",
            "Heat pumps move heat from outside air into the home.",
        )
        .with_context_tag("item-42")
    }

    fn pipeline(client: MockGenerationClient) -> FaqPipeline {
        FaqPipeline::with_defaults(Arc::new(client), Arc::new(PipelineConfig::default()))
            .expect("valid config")
    }

    #[tokio::test]
    async fn full_first_attempt_is_returned_without_rebuild() {
        let mut client = MockGenerationClient::new();
        client.expect_generate().times(1).returning(|_| Ok(faq_html(8)));

        let outcome = pipeline(client).generate(request()).await.expect("outcome");

        assert_eq!(outcome.attempts_used, 1);
        assert_eq!(outcome.record_count(), 8);
        assert_eq!(outcome.context_tag, "item-42");
        assert!(!outcome.diagnostics.rebuilt);
        assert!(outcome.diagnostics.fill.is_none());
        assert_eq!(outcome.final_html, faq_html(8));
    }

    #[tokio::test]
    async fn dropped_record_forces_rebuild_without_its_content() {
        let html = format!(
            "{}<h3>Why is my site showing errors?</h3><p>{} Fatal error: Uncaught exception in plugin.</p>",
            faq_html(8),
            answer_text(10)
        );
        let mut client = MockGenerationClient::new();
        client
            .expect_generate()
            .times(1)
            .returning(move |_| Ok(html.clone()));

        let outcome = pipeline(client).generate(request()).await.expect("outcome");

        assert!(outcome.diagnostics.rebuilt);
        assert_eq!(outcome.record_count(), 8);
        assert!(!outcome.final_html.contains("Fatal error"));
        assert!(!outcome.final_html.contains("Why is my site showing errors?"));
        assert!(outcome.final_html.starts_with("<h2>Frequently Asked Questions</h2>"));
    }

    #[tokio::test]
    async fn short_batch_is_filled_and_rebuilt() {
        let mut client = MockGenerationClient::new();
        let mut calls = 0;
        client.expect_generate().times(2).returning(move |_| {
            calls += 1;
            Ok(if calls == 1 {
                faq_html(5)
            } else {
                records_html(5..10)
            })
        });

        let outcome = pipeline(client).generate(request()).await.expect("outcome");

        assert_eq!(outcome.record_count(), 8);
        let fill = outcome.diagnostics.fill.expect("fill ran");
        assert_eq!(fill.requested, 3);
        assert_eq!(fill.added, 3);
        assert!(outcome.diagnostics.rebuilt);
        assert!(outcome.final_html.contains(question_text(7)));
        assert!(!outcome.final_html.contains(question_text(8)));
    }

    #[tokio::test]
    async fn exhaustion_is_a_terminal_error() {
        let mut client = MockGenerationClient::new();
        client
            .expect_generate()
            .times(3)
            .returning(|_| Err(GenerationError::Empty));

        let err = pipeline(client)
            .generate(request().with_variant(Variant::Long))
            .await
            .expect_err("must exhaust");

        assert_eq!(err.error_code(), "exhausted_retries");
        let AppError::ExhaustedRetries(report) = err else {
            panic!("unexpected error");
        };
        assert_eq!(report.reason_codes(), vec!["empty_output"; 3]);
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_the_client() {
        let mut client = MockGenerationClient::new();
        client.expect_generate().times(0);

        let err = pipeline(client)
            .generate(GenerateFaqRequest::new("", "not a url", ""))
            .await
            .expect_err("invalid request");
        assert_eq!(err.error_code(), "invalid_request");
    }

    #[tokio::test]
    async fn fill_prompt_lists_kept_questions() {
        let client = Arc::new(ScriptedGenerationClient::from_texts([
            faq_html(4),
            records_html(4..8),
        ]));
        let pipeline = FaqPipeline::with_defaults(client.clone(), Arc::new(PipelineConfig::default()))
            .expect("valid config");

        let outcome = pipeline.generate(request()).await.expect("outcome");
        assert_eq!(outcome.record_count(), 8);

        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].prompt.contains("PAGE TITLE: Heat pumps explained"));
        assert!(requests[0].prompt.contains("exactly 8 questions"));
        assert!(requests[1].prompt.contains("Write 4 additional FAQ entries"));
        for i in 0..4 {
            assert!(requests[1].prompt.contains(&format!("- {}", question_text(i))));
        }
        assert_eq!(requests[1].context_tag, "item-42");
    }

    #[test]
    fn rejects_invalid_config() {
        let config = PipelineConfig {
            max_fill_per_request: 9,
            ..PipelineConfig::default()
        };
        let result = FaqPipeline::with_defaults(Arc::new(MockGenerationClient::new()), Arc::new(config));
        assert!(result.is_err());
    }
}
