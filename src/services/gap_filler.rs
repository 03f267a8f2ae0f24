use std::sync::Arc;

use crate::{
    config::PipelineConfig,
    models::{
        domain::{Batch, GenerationRequest, RejectedRecord, RejectionReason},
        dto::response::FillReport,
    },
    services::{
        generation_client::{generate_with_timeout, GenerationClient},
        output_normalizer::normalize_output,
        prompt_composer::{compose_prompt, PromptContext},
        record_extractor::RecordExtractor,
        similarity::is_near_duplicate,
    },
};

pub const MAX_FILL_ATTEMPTS: u32 = 2;
const MIN_FILL_TOKENS: u32 = 256;

#[derive(Debug, Clone, Default)]
pub struct FillPass {
    pub report: FillReport,
    pub rejected: Vec<RejectedRecord>,
}

/// Tops up an under-sized batch with supplemental requests. Never fails:
/// errors are recorded in the report and the batch is left as it was.
pub struct GapFiller {
    client: Arc<dyn GenerationClient>,
    extractor: RecordExtractor,
    config: Arc<PipelineConfig>,
}

impl GapFiller {
    pub fn new(client: Arc<dyn GenerationClient>, config: Arc<PipelineConfig>) -> Self {
        Self {
            client,
            extractor: RecordExtractor::from_config(&config),
            config,
        }
    }

    pub async fn fill(&self, batch: &mut Batch, context: &PromptContext, context_tag: &str) -> FillPass {
        let mut pass = FillPass::default();

        for attempt in 1..=MAX_FILL_ATTEMPTS {
            let shortfall = batch.shortfall();
            if shortfall == 0 {
                break;
            }
            let need = shortfall.min(self.config.max_fill_per_request);
            pass.report.attempts = attempt;
            pass.report.requested += need;

            let prompt = compose_prompt(
                &self.config.templates.fill,
                &context
                    .clone()
                    .with_faq_count(need)
                    .with_existing_questions(batch.questions().map(str::to_string).collect()),
                self.config.max_source_chars,
            );
            let request = GenerationRequest::new(
                prompt,
                &self.config.model,
                self.token_budget(need, batch.target_count),
                self.config.base_temperature,
                context_tag,
            );

            log::info!(
                "Fill attempt {} for {}: requesting {} of {} missing records",
                attempt,
                context_tag,
                need,
                shortfall
            );

            let text = match generate_with_timeout(
                self.client.as_ref(),
                &request,
                self.config.request_timeout,
            )
            .await
            {
                Ok(text) => text,
                Err(err) => {
                    log::warn!("Fill attempt {} for {} failed: {}", attempt, context_tag, err);
                    pass.report.errors.push(err.to_string());
                    continue;
                }
            };

            let extraction = self.extractor.extract(&normalize_output(&text));
            pass.rejected.extend(extraction.rejected);

            let mut added_this_attempt = 0;
            for record in extraction.records {
                if batch.is_full() || added_this_attempt >= need {
                    break;
                }
                let reason = if is_near_duplicate(
                    &record.question,
                    batch.questions(),
                    self.config.similarity_threshold,
                ) {
                    Some(RejectionReason::SimilarQuestion)
                } else if batch.contains_hash(&record.content_hash) {
                    Some(RejectionReason::DuplicateContent)
                } else {
                    None
                };

                match reason {
                    Some(reason) => {
                        log::debug!("Fill dropped '{}': {}", record.question, reason);
                        pass.report.dropped_duplicates += 1;
                        pass.rejected.push(RejectedRecord {
                            question: record.question,
                            answer_plain: record.answer_plain,
                            reason,
                        });
                    }
                    None => {
                        if batch.push(record) {
                            added_this_attempt += 1;
                            pass.report.added += 1;
                        }
                    }
                }
            }
        }

        if pass.report.attempts > 0 {
            log::info!(
                "Fill for {} added {} records ({} duplicates dropped), batch now {}/{}",
                context_tag,
                pass.report.added,
                pass.report.dropped_duplicates,
                batch.len(),
                batch.target_count
            );
        }
        pass
    }

    /// Share of the full budget proportional to how many records are asked for.
    fn token_budget(&self, need: usize, target: usize) -> u32 {
        let target = target.max(1) as u64;
        let scaled = u64::from(self.config.max_tokens) * need as u64 / target;
        (scaled as u32).max(MIN_FILL_TOKENS)
    }
}
