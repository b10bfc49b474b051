//! Catalog-Crawler: a polite, cancellable product catalog crawler
//!
//! This crate discovers item links from a paginated search endpoint, visits
//! each item page to read the product identifier embedded in its final URL,
//! and streams the identifiers into a CSV file while reporting progress.

pub mod config;
pub mod crawler;
pub mod job;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Catalog-Crawler operations
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid search query: {0}")]
    InvalidQuery(#[from] QueryError),

    #[error("Output error: {0}")]
    Sink(#[from] output::SinkError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::PipelineState,
        to: state::PipelineState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Crawl task aborted: {0}")]
    TaskAborted(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid identifier pattern: {0}")]
    InvalidPattern(String),
}

/// Rejections for search input, raised before any network activity
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("search term cannot be empty")]
    EmptyTerm,

    #[error("page count must be between {min} and {max}, got {got}")]
    PageCountOutOfRange { got: u32, min: u32, max: u32 },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("URL cannot carry a path: {0}")]
    CannotBeABase(String),

    #[error("Invalid identifier pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Catalog-Crawler operations
pub type Result<T> = std::result::Result<T, CatalogError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{
    CandidateLink, CrawlPipeline, CrawlResult, ExtractedRecord, ProgressEvent, SearchQuery,
};
pub use job::{start_crawl, CrawlJob, JobOutcome};
pub use state::PipelineState;
