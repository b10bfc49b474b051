//! Crawl pipeline - main crawl orchestration logic
//!
//! This module sequences one crawl run:
//! - Discovery of item links over the search result pages
//! - Extraction of identifiers from each item page
//! - Incremental writing of records to the output file
//! - Progress reporting and cooperative cancellation at every step boundary

use crate::config::{validate, Config};
use crate::crawler::discoverer::LinkDiscoverer;
use crate::crawler::extractor::{ItemExtractor, RecordStream};
use crate::crawler::fetcher::RetryingHttpClient;
use crate::crawler::types::{CandidateLink, CrawlResult, ProgressEvent, SearchQuery};
use crate::output::{destination_path, CrawlStatistics, CsvRecordSink, RecordSink, SinkResult};
use crate::state::PipelineState;
use crate::url::CatalogTarget;
use crate::CatalogError;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// A progress event is emitted after this many written records
pub const PROGRESS_INTERVAL: u64 = 10;

/// Progress callback as seen by the pipeline internals
type ProgressFn<'a> = dyn FnMut(ProgressEvent) + Send + 'a;

/// Orchestrates a single crawl run
///
/// A pipeline owns its HTTP client for the duration of one run and cannot
/// be reused: once `run` has been called, the pipeline stays in a terminal
/// state and a second `run` is rejected.
pub struct CrawlPipeline {
    config: Config,
    target: CatalogTarget,
    client: RetryingHttpClient,
    state: PipelineState,
    stats: CrawlStatistics,
}

impl CrawlPipeline {
    /// Creates a new pipeline
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlPipeline)` - Configuration is valid and the client was built
    /// * `Err(CatalogError)` - Invalid configuration or client setup failure
    pub fn new(config: Config) -> Result<Self, CatalogError> {
        validate(&config)?;
        let target = CatalogTarget::from_config(&config.target)?;
        let client = RetryingHttpClient::new(&config.target, &config.http)?;

        Ok(Self {
            config,
            target,
            client,
            state: PipelineState::Idle,
            stats: CrawlStatistics::new(),
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn stats(&self) -> &CrawlStatistics {
        &self.stats
    }

    pub fn target(&self) -> &CatalogTarget {
        &self.target
    }

    /// Runs the crawl
    ///
    /// 1. Fetch search pages `1..=max_pages`, stopping at the first page
    ///    without links
    /// 2. With no links, finish with [`CrawlResult::NoRecords`] and no file
    /// 3. Otherwise open a fresh output file and write one row per record
    ///    as the item pages are resolved
    ///
    /// Cancellation is checked before each search page and before each
    /// record is pulled. Only output failures are returned as errors;
    /// failed pages and items are skipped.
    ///
    /// # Arguments
    ///
    /// * `query` - The validated search query
    /// * `on_progress` - Receives progress events in order
    /// * `cancel` - Cancellation signal set by the driving task
    pub async fn run<F>(
        &mut self,
        query: &SearchQuery,
        mut on_progress: F,
        cancel: &CancellationToken,
    ) -> Result<CrawlResult, CatalogError>
    where
        F: FnMut(ProgressEvent) + Send,
    {
        self.transition(PipelineState::Discovering)?;
        tracing::info!(
            "Starting crawl for '{}' over up to {} pages",
            query.term(),
            query.max_pages()
        );

        let started = Instant::now();
        let result = self.execute(query, &mut on_progress, cancel).await;
        self.stats.elapsed = started.elapsed();

        if let Err(e) = &result {
            tracing::error!("Crawl for '{}' failed: {}", query.term(), e);
            if !self.state.is_terminal() {
                self.state = PipelineState::Failed;
            }
        }

        result
    }

    async fn execute(
        &mut self,
        query: &SearchQuery,
        on_progress: &mut ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> Result<CrawlResult, CatalogError> {
        let Some(links) = self.discover_links(query, on_progress, cancel).await else {
            self.transition(PipelineState::Cancelled)?;
            tracing::info!("Crawl cancelled during discovery, no output written");
            return Ok(CrawlResult::Cancelled {
                partial: None,
                records: 0,
            });
        };

        if links.is_empty() {
            self.transition(PipelineState::Completed)?;
            tracing::info!("No item links found for '{}'", query.term());
            return Ok(CrawlResult::NoRecords);
        }

        self.transition(PipelineState::Extracting)?;
        self.extract_records(query, links, on_progress, cancel).await
    }

    /// Collects item links page by page
    ///
    /// Returns `None` if cancelled at any point before extraction starts.
    /// Links are deduplicated across pages, keeping the order in which they
    /// were first seen.
    async fn discover_links(
        &mut self,
        query: &SearchQuery,
        on_progress: &mut ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> Option<Vec<CandidateLink>> {
        let discoverer = LinkDiscoverer::new(&self.client, &self.target);
        let page_delay = Duration::from_millis(self.config.politeness.page_delay_ms);
        let estimate = u64::from(query.max_pages()) * 2;

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for page in 1..=query.max_pages() {
            if cancel.is_cancelled() {
                return None;
            }

            let page_links = discoverer.discover(query, page).await;
            self.stats.pages_requested += 1;

            if page_links.is_empty() {
                tracing::info!("Search page {} has no links, ending discovery", page);
                break;
            }

            let before = links.len();
            for link in page_links {
                if seen.insert(link.clone()) {
                    links.push(link);
                }
            }

            tracing::info!(
                "Search page {}: {} new links ({} total)",
                page,
                links.len() - before,
                links.len()
            );
            on_progress(ProgressEvent::new(
                u64::from(page),
                estimate,
                format!("Fetched search page {} ({} links so far)", page, links.len()),
            ));

            tokio::time::sleep(page_delay).await;
        }

        self.stats.links_discovered = links.len() as u64;

        // A cancel during the last request or sleep must not open the output
        if cancel.is_cancelled() {
            return None;
        }

        Some(links)
    }

    /// Resolves every link and writes the records as they arrive
    async fn extract_records(
        &mut self,
        query: &SearchQuery,
        links: Vec<CandidateLink>,
        on_progress: &mut ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> Result<CrawlResult, CatalogError> {
        let base = u64::from(query.max_pages());
        let total = base * 2 + links.len() as u64;
        on_progress(ProgressEvent::new(
            base,
            total,
            format!("Extracting {} products...", links.len()),
        ));

        let path = destination_path(
            &self.config.output,
            query.term(),
            chrono::Utc::now().timestamp(),
        )?;
        let mut sink = CsvRecordSink::open(&path)?;
        tracing::info!("Writing records to {}", path.display());

        let item_delay = Duration::from_millis(self.config.politeness.item_delay_ms);
        let extractor = ItemExtractor::new(&self.client, &self.target, item_delay);
        let mut stream = extractor.extract(links).with_cancellation(cancel.clone());

        let progress = ExtractionProgress {
            base,
            total,
            on_progress: &mut *on_progress,
        };
        let cancelled = pump_records(&mut stream, &mut sink, cancel, progress).await?;

        self.stats.items_attempted = stream.attempted();
        self.stats.items_skipped = stream.skipped();
        drop(stream);

        sink.close()?;
        let records = sink.rows_written();
        self.stats.records_written = records;

        if cancelled {
            self.transition(PipelineState::Cancelled)?;
            tracing::info!(
                "Crawl cancelled after {} records, partial output at {}",
                records,
                path.display()
            );
            return Ok(CrawlResult::Cancelled {
                partial: Some(path),
                records,
            });
        }

        on_progress(ProgressEvent::new(
            base + records,
            total,
            format!("Extracted {} products", records),
        ));
        self.transition(PipelineState::Completed)?;
        tracing::info!("Crawl completed: {} records in {}", records, path.display());

        Ok(CrawlResult::Completed { path, records })
    }

    fn transition(&mut self, next: PipelineState) -> Result<(), CatalogError> {
        if !self.state.can_transition_to(next) {
            return Err(CatalogError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        tracing::debug!("Pipeline state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }
}

/// Progress bookkeeping for the extraction phase
struct ExtractionProgress<'a, 'b> {
    /// Steps already accounted to discovery
    base: u64,
    total: u64,
    on_progress: &'a mut ProgressFn<'b>,
}

/// Moves records from the stream into the sink until the stream ends
///
/// Returns `Ok(true)` if the run was cancelled.
async fn pump_records(
    stream: &mut RecordStream<'_>,
    sink: &mut dyn RecordSink,
    cancel: &CancellationToken,
    progress: ExtractionProgress<'_, '_>,
) -> SinkResult<bool> {
    loop {
        if cancel.is_cancelled() {
            return Ok(true);
        }

        let Some(record) = stream.next().await else {
            return Ok(stream.was_interrupted());
        };

        sink.write(&record)?;
        tracing::debug!("Extracted product {}", record.product_id());

        let count = sink.rows_written();
        if count % PROGRESS_INTERVAL == 0 {
            (progress.on_progress)(ProgressEvent::new(
                progress.base + count,
                progress.total,
                format!("Extracted {} products...", count),
            ));
        }
    }
}
