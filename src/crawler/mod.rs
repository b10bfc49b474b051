//! Crawler module for catalog page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Search page link discovery
//! - Item page resolution and identifier extraction
//! - Overall pipeline coordination

mod coordinator;
mod discoverer;
mod extractor;
mod fetcher;
mod parser;
mod types;

pub use coordinator::{CrawlPipeline, PROGRESS_INTERVAL};
pub use discoverer::LinkDiscoverer;
pub use extractor::{ItemExtractor, RecordStream};
pub use fetcher::{build_http_client, HttpResponse, NetworkFailure, RetryPolicy, RetryingHttpClient};
pub use parser::extract_item_links;
pub use types::{
    CandidateLink, CrawlResult, ExtractedRecord, ProgressEvent, SearchQuery, MAX_PAGES, MIN_PAGES,
};

use crate::config::Config;
use crate::CatalogError;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl on the current task
///
/// This is the simplest entry point: it builds a pipeline, runs it, and
/// returns the outcome. Progress events go to the log. Use
/// [`crate::job::start_crawl`] to run a crawl in the background instead.
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `query` - The validated search query
/// * `cancel` - Cancellation signal
///
/// # Returns
///
/// * `Ok(CrawlResult)` - Crawl completed, found nothing, or was cancelled
/// * `Err(CatalogError)` - Crawl failed
pub async fn crawl(
    config: Config,
    query: &SearchQuery,
    cancel: &CancellationToken,
) -> Result<CrawlResult, CatalogError> {
    let mut pipeline = CrawlPipeline::new(config)?;
    pipeline
        .run(
            query,
            |event| tracing::info!("[{}/{}] {}", event.completed, event.total, event.message),
            cancel,
        )
        .await
}
