pub mod batch_runner;
pub mod duplicate_guard;
pub mod faq_pipeline;
pub mod gap_filler;
pub mod generation_client;
pub mod output_normalizer;
pub mod page_fetcher;
pub mod prompt_composer;
pub mod quality_filter;
pub mod rebuilder;
pub mod record_extractor;
pub mod retry_controller;
pub mod sanitizer;
pub mod similarity;
pub mod structural_validator;
pub mod text_helpers;

pub use batch_runner::{BatchItem, BatchRunner, ItemReport, ItemStatus};
pub use duplicate_guard::{DuplicateGuard, PassthroughGuard, Rewriter};
pub use faq_pipeline::FaqPipeline;
pub use generation_client::{GenerationClient, OpenAiGenerationClient};
pub use page_fetcher::{HttpPageFetcher, PageFetcher};
pub use sanitizer::{AllowListSanitizer, AllowedTags, Sanitizer};
