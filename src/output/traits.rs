//! Record sink trait and error types
//!
//! This module defines the interface the pipeline writes records through.

use crate::crawler::ExtractedRecord;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write record: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sink for {path} is already closed")]
    Closed { path: PathBuf },
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Destination for extracted records
///
/// Implementations write the header when opened and make each record
/// durable before `write` returns, so a run interrupted between writes
/// leaves a valid file behind.
pub trait RecordSink: Send {
    /// Appends one record
    ///
    /// # Arguments
    ///
    /// * `record` - The record to append
    fn write(&mut self, record: &ExtractedRecord) -> SinkResult<()>;

    /// Flushes and releases the destination
    ///
    /// Calling `close` more than once is a no-op.
    fn close(&mut self) -> SinkResult<()>;

    /// Number of records written so far
    fn rows_written(&self) -> u64;
}
