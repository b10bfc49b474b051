//! Output module for writing crawl results
//!
//! This module handles:
//! - Choosing a fresh result file for each run
//! - Writing records incrementally as CSV
//! - Recording crawl statistics

mod csv_sink;
pub mod stats;
mod traits;

pub use csv_sink::CsvRecordSink;
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{RecordSink, SinkError, SinkResult};

use crate::config::OutputConfig;
use std::path::{Path, PathBuf};

/// Picks the output file for a run, creating the output directory if needed
///
/// The file name is `{prefix}_{term}_{unix_timestamp}.csv`. Characters in
/// the term that are unsafe in file names are replaced with `_`. If the
/// name is already taken, a numeric suffix is added.
///
/// # Arguments
///
/// * `config` - Output directory and file prefix
/// * `term` - The search term of the run
/// * `timestamp` - Unix timestamp of the run start
pub fn destination_path(config: &OutputConfig, term: &str, timestamp: i64) -> SinkResult<PathBuf> {
    let directory = Path::new(&config.directory);
    std::fs::create_dir_all(directory).map_err(|source| SinkError::Open {
        path: directory.to_path_buf(),
        source,
    })?;

    let stem = format!(
        "{}_{}_{}",
        config.file_prefix,
        sanitize_term(term),
        timestamp
    );

    let mut candidate = directory.join(format!("{}.csv", stem));
    let mut suffix = 1;
    while candidate.exists() {
        candidate = directory.join(format!("{}_{}.csv", stem, suffix));
        suffix += 1;
    }

    Ok(candidate)
}

/// Makes a search term safe for use in a file name
fn sanitize_term(term: &str) -> String {
    term.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
