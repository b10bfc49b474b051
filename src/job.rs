//! Background crawl jobs
//!
//! A job runs one pipeline on its own tokio task. The caller keeps a
//! [`CrawlJob`] handle to read progress events, request cancellation, and
//! collect the terminal outcome. Nothing the caller does blocks the crawl.

use crate::config::Config;
use crate::crawler::{CrawlPipeline, CrawlResult, ProgressEvent, SearchQuery};
use crate::output::CrawlStatistics;
use crate::CatalogError;
use std::fmt;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Terminal outcome of a job, as reported to the driving layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Results were written to the file
    Success(PathBuf),

    /// The search found no items; no file was written
    Empty,

    /// The user stopped the crawl; holds the partial file if one exists
    Cancelled(Option<PathBuf>),

    /// The crawl aborted
    Failed(String),
}

impl JobOutcome {
    fn from_result(result: Result<CrawlResult, CatalogError>) -> Self {
        match result {
            Ok(CrawlResult::Completed { path, .. }) => Self::Success(path),
            Ok(CrawlResult::NoRecords) => Self::Empty,
            Ok(CrawlResult::Cancelled { partial, .. }) => Self::Cancelled(partial),
            Err(e) => Self::Failed(e.to_string()),
        }
    }

    /// Path of the output file, if the job produced one
    pub fn output_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Success(path) => Some(path),
            Self::Cancelled(partial) => partial.as_ref(),
            Self::Empty | Self::Failed(_) => None,
        }
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(path) => write!(f, "Crawl complete, file saved to {}", path.display()),
            Self::Empty => write!(f, "No products found"),
            Self::Cancelled(Some(path)) => {
                write!(f, "Crawl cancelled, partial file saved to {}", path.display())
            }
            Self::Cancelled(None) => write!(f, "Crawl cancelled, no file written"),
            Self::Failed(message) => write!(f, "Crawl failed: {}", message),
        }
    }
}

/// Outcome and statistics of a finished job
#[derive(Debug, Clone)]
pub struct JobReport {
    pub outcome: JobOutcome,
    pub stats: CrawlStatistics,
}

/// Handle to a running crawl
pub struct CrawlJob {
    cancel: CancellationToken,
    progress: mpsc::UnboundedReceiver<ProgressEvent>,
    handle: JoinHandle<JobReport>,
}

impl CrawlJob {
    /// Requests cooperative cancellation
    ///
    /// The crawl stops at the next page or record boundary. Requests in
    /// flight are not aborted.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the next progress event
    ///
    /// Returns `None` once the job has finished and all events were read.
    pub async fn next_progress(&mut self) -> Option<ProgressEvent> {
        self.progress.recv().await
    }

    /// Waits for the job to finish
    pub async fn wait(self) -> JobReport {
        match self.handle.await {
            Ok(report) => report,
            Err(e) => JobReport {
                outcome: JobOutcome::Failed(CatalogError::TaskAborted(e.to_string()).to_string()),
                stats: CrawlStatistics::new(),
            },
        }
    }
}

/// Validates the input and starts a crawl on a new tokio task
///
/// Invalid input and configuration are rejected here, before any network
/// activity. Must be called from within a tokio runtime.
///
/// # Example
///
/// ```no_run
/// use catalog_crawler::{start_crawl, Config};
///
/// # async fn example() -> Result<(), catalog_crawler::CatalogError> {
/// let mut job = start_crawl(Config::default(), "monitor", 2)?;
/// while let Some(event) = job.next_progress().await {
///     println!("{}/{} {}", event.completed, event.total, event.message);
/// }
/// println!("{}", job.wait().await.outcome);
/// # Ok(())
/// # }
/// ```
pub fn start_crawl(config: Config, term: &str, max_pages: u32) -> crate::Result<CrawlJob> {
    let query = SearchQuery::new(term, max_pages)?;
    let mut pipeline = CrawlPipeline::new(config)?;

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let (sender, progress) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        let result = pipeline
            .run(
                &query,
                move |event| {
                    // The receiver may be gone if the caller stopped listening
                    let _ = sender.send(event);
                },
                &token,
            )
            .await;

        JobReport {
            outcome: JobOutcome::from_result(result),
            stats: pipeline.stats().clone(),
        }
    });

    Ok(CrawlJob {
        cancel,
        progress,
        handle,
    })
}
