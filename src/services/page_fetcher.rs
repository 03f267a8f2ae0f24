use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::{
    errors::{AppError, AppResult},
    services::text_helpers::{element_plain_text, truncate_chars},
};

/// Resolves a page URL to the plain text used as generation source.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> AppResult<String>;
}

pub struct HttpPageFetcher {
    client: reqwest::Client,
    max_chars: usize,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration, max_chars: usize) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()?;
        Ok(Self { client, max_chars })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> AppResult<String> {
        log::info!("Fetching source text from {}", url);

        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let text = page_text(&body, self.max_chars)?;
        if text.is_empty() {
            return Err(AppError::FetchError(format!("No readable text at {}", url)));
        }
        Ok(text)
    }
}

/// Visible body text of an HTML document, truncated to `max_chars`.
pub fn page_text(document: &str, max_chars: usize) -> AppResult<String> {
    let selector = Selector::parse("body")
        .map_err(|e| AppError::InternalError(format!("Invalid body selector: {}", e)))?;
    let html = Html::parse_document(document);
    let text = html
        .select(&selector)
        .next()
        .map(element_plain_text)
        .unwrap_or_default();
    Ok(truncate_chars(&text, max_chars).trim_end().to_string())
}
