use std::{sync::Arc, time::Duration};

use crate::{
    config::Config,
    errors::AppResult,
    services::{BatchRunner, FaqPipeline, HttpPageFetcher, OpenAiGenerationClient, PageFetcher},
};

/// Wires the production collaborators together from one `Config`.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<FaqPipeline>,
    pub fetcher: Arc<dyn PageFetcher>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        config.validate_for_production()?;

        let client = Arc::new(OpenAiGenerationClient::new(&config));
        let pipeline = Arc::new(FaqPipeline::with_defaults(
            client,
            Arc::new(config.pipeline_config()),
        )?);
        let fetcher = Arc::new(HttpPageFetcher::new(
            Duration::from_secs(config.request_timeout_secs),
            config.max_source_chars,
        )?);

        Ok(Self {
            pipeline,
            fetcher,
            config: Arc::new(config),
        })
    }

    pub fn batch_runner(&self) -> BatchRunner {
        BatchRunner::new(Arc::clone(&self.pipeline)).with_fetcher(Arc::clone(&self.fetcher))
    }
}
