//! Data carried through a crawl run

use crate::QueryError;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Smallest accepted page count
pub const MIN_PAGES: u32 = 1;

/// Largest accepted page count
pub const MAX_PAGES: u32 = 10;

/// A validated search request, the sole input of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    term: String,
    max_pages: u32,
}

impl SearchQuery {
    /// Validates and builds a query
    ///
    /// The term is trimmed and must not be empty. The page count must be in
    /// `1..=10`.
    ///
    /// # Examples
    ///
    /// ```
    /// use catalog_crawler::SearchQuery;
    ///
    /// let query = SearchQuery::new("  monitor ", 3).unwrap();
    /// assert_eq!(query.term(), "monitor");
    /// assert!(SearchQuery::new("", 3).is_err());
    /// assert!(SearchQuery::new("monitor", 11).is_err());
    /// ```
    pub fn new(term: &str, max_pages: u32) -> Result<Self, QueryError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(QueryError::EmptyTerm);
        }

        if !(MIN_PAGES..=MAX_PAGES).contains(&max_pages) {
            return Err(QueryError::PageCountOutOfRange {
                got: max_pages,
                min: MIN_PAGES,
                max: MAX_PAGES,
            });
        }

        Ok(Self {
            term: term.to_string(),
            max_pages,
        })
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }
}

/// An item link as found on a search page (absolute or relative)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateLink(String);

impl CandidateLink {
    pub fn new(href: impl Into<String>) -> Self {
        Self(href.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A product identifier read from a resolved item URL
///
/// Only constructible through [`ExtractedRecord::new`], which enforces a
/// non-empty ASCII alphanumeric identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedRecord {
    product_id: String,
}

impl ExtractedRecord {
    /// Column names, in the order fields are serialized
    pub const FIELDS: &'static [&'static str] = &["product_id"];

    pub fn new(product_id: impl Into<String>) -> Option<Self> {
        let product_id = product_id.into();
        if product_id.is_empty() || !product_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(Self { product_id })
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }
}

/// A progress notification for the driving layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Steps finished so far; never decreases within a run
    pub completed: u64,

    /// Current estimate of total steps; only revised upward
    pub total: u64,

    /// Human-readable description of the step
    pub message: String,
}

impl ProgressEvent {
    pub fn new(completed: u64, total: u64, message: impl Into<String>) -> Self {
        Self {
            completed,
            total,
            message: message.into(),
        }
    }
}

/// Terminal outcome of a run that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlResult {
    /// All links were processed; the file may hold zero rows
    Completed { path: PathBuf, records: u64 },

    /// Discovery found no links; no file was created
    NoRecords,

    /// Stopped by the caller. Cancelling during extraction leaves a valid
    /// partial file; cancelling during discovery leaves none.
    Cancelled { partial: Option<PathBuf>, records: u64 },
}

impl CrawlResult {
    /// Path of the written file, if any
    pub fn output_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Completed { path, .. } => Some(path),
            Self::Cancelled { partial, .. } => partial.as_ref(),
            Self::NoRecords => None,
        }
    }

    /// Number of records written to the output file
    pub fn records(&self) -> u64 {
        match self {
            Self::Completed { records, .. } | Self::Cancelled { records, .. } => *records,
            Self::NoRecords => 0,
        }
    }
}
