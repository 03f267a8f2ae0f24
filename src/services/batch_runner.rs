use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use serde::Serialize;

use crate::{
    errors::{AppError, AppResult},
    models::dto::{request::GenerateFaqRequest, response::PipelineOutcome},
    services::{faq_pipeline::FaqPipeline, page_fetcher::PageFetcher},
};

#[derive(Debug, Clone)]
pub struct BatchItem {
    pub id: String,
    pub request: GenerateFaqRequest,
}

impl BatchItem {
    pub fn new(id: impl Into<String>, request: GenerateFaqRequest) -> Self {
        Self {
            id: id.into(),
            request,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Completed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub id: String,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<PipelineOutcome>,
}

impl ItemReport {
    fn completed(id: String, outcome: PipelineOutcome) -> Self {
        Self {
            id,
            status: ItemStatus::Completed,
            error_code: None,
            error: None,
            outcome: Some(outcome),
        }
    }

    fn failed(id: String, err: &AppError) -> Self {
        Self {
            id,
            status: ItemStatus::Failed,
            error_code: Some(err.error_code()),
            error: Some(err.to_string()),
            outcome: None,
        }
    }

    fn skipped(id: String) -> Self {
        Self {
            id,
            status: ItemStatus::Skipped,
            error_code: None,
            error: None,
            outcome: None,
        }
    }
}

/// Runs the pipeline over many items, one at a time.
pub struct BatchRunner {
    pipeline: Arc<FaqPipeline>,
    fetcher: Option<Arc<dyn PageFetcher>>,
}

impl BatchRunner {
    pub fn new(pipeline: Arc<FaqPipeline>) -> Self {
        Self {
            pipeline,
            fetcher: None,
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// The stop flag is read before each item. An item already in flight
    /// always runs to completion.
    pub async fn run(&self, items: Vec<BatchItem>, stop: &AtomicBool) -> Vec<ItemReport> {
        let total = items.len();
        let mut reports = Vec::with_capacity(total);

        for (index, item) in items.into_iter().enumerate() {
            if stop.load(Ordering::SeqCst) {
                log::info!("Stop requested, skipping item {} of {}", index + 1, total);
                reports.push(ItemReport::skipped(item.id));
                continue;
            }

            log::info!("Processing item {} of {}: {}", index + 1, total, item.id);
            let report = match self.process(&item).await {
                Ok(outcome) => ItemReport::completed(item.id, outcome),
                Err(err) => {
                    log::warn!("Item {} failed: {}", item.id, err);
                    ItemReport::failed(item.id, &err)
                }
            };
            reports.push(report);
        }

        reports
    }

    async fn process(&self, item: &BatchItem) -> AppResult<PipelineOutcome> {
        let mut request = item.request.clone();
        if request.context_tag.is_none() {
            request.context_tag = Some(item.id.clone());
        }

        if request.source_text.trim().is_empty() {
            let fetcher = self.fetcher.as_ref().ok_or_else(|| {
                AppError::FetchError(format!("Item {} has no source text and no fetcher", item.id))
            })?;
            request.source_text = fetcher.fetch(&request.url).await?;
        }

        self.pipeline.generate(request).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        config::PipelineConfig,
        errors::GenerationError,
        models::domain::GenerationRequest,
        services::generation_client::GenerationClient,
        test_utils::fixtures::faq_html,
    };

    /// Answers every call with a full batch and raises the stop flag after the
    /// first one.
    struct StoppingClient {
        stop: Arc<AtomicBool>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GenerationClient for StoppingClient {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
            self.prompts.lock().expect("lock").push(request.prompt.clone());
            self.stop.store(true, Ordering::SeqCst);
            Ok(faq_html(8))
        }
    }

    struct StaticFetcher;

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> AppResult<String> {
            Ok(format!("Fetched body of {}", url))
        }
    }

    fn item(id: &str, source: &str) -> BatchItem {
        BatchItem::new(
            id,
            GenerateFaqRequest::new("Heat pumps", "https://example.com/heat-pumps", source),
        )
    }

    fn runner(client: Arc<StoppingClient>) -> BatchRunner {
        let pipeline = FaqPipeline::with_defaults(client, Arc::new(PipelineConfig::default()))
            .expect("valid config");
        BatchRunner::new(Arc::new(pipeline))
    }

    #[tokio::test]
    async fn stop_flag_skips_remaining_items_only() {
        let stop = Arc::new(AtomicBool::new(false));
        let client = Arc::new(StoppingClient {
            stop: Arc::clone(&stop),
            prompts: Mutex::new(Vec::new()),
        });

        let reports = runner(Arc::clone(&client))
            .run(vec![item("a", "text a"), item("b", "text b"), item("c", "text c")], &stop)
            .await;

        let statuses: Vec<ItemStatus> = reports.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![ItemStatus::Completed, ItemStatus::Skipped, ItemStatus::Skipped]
        );
        assert_eq!(reports[0].outcome.as_ref().map(|o| o.context_tag.as_str()), Some("a"));
        assert_eq!(client.prompts.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn missing_source_without_fetcher_fails_item() {
        let stop = AtomicBool::new(false);
        let client = Arc::new(StoppingClient {
            stop: Arc::new(AtomicBool::new(false)),
            prompts: Mutex::new(Vec::new()),
        });

        let reports = runner(client).run(vec![item("a", "  ")], &stop).await;

        assert_eq!(reports[0].status, ItemStatus::Failed);
        assert_eq!(reports[0].error_code, Some("fetch_failed"));
    }

    #[tokio::test]
    async fn missing_source_is_fetched() {
        let stop = AtomicBool::new(false);
        let client = Arc::new(StoppingClient {
            stop: Arc::new(AtomicBool::new(false)),
            prompts: Mutex::new(Vec::new()),
        });

        let reports = runner(Arc::clone(&client))
            .with_fetcher(Arc::new(StaticFetcher))
            .run(vec![item("a", "")], &stop)
            .await;

        assert_eq!(reports[0].status, ItemStatus::Completed);
        let prompts = client.prompts.lock().expect("lock");
        assert!(prompts[0].contains("Fetched body of https://example.com/heat-pumps"));
    }
}
