//! Run statistics
//!
//! Counters collected while a pipeline runs, attached to its outcome and
//! printed by the command-line driver.

use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Search pages requested
    pub pages_requested: u64,

    /// Distinct item links collected during discovery
    pub links_discovered: u64,

    /// Item pages requested
    pub items_attempted: u64,

    /// Records written to the output file
    pub records_written: u64,

    /// Links that produced no record
    pub items_skipped: u64,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of discovered links that produced a record, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.links_discovered == 0 {
            return 0.0;
        }
        (self.records_written as f64 / self.links_discovered as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Discovery:");
    println!("  Search pages requested: {}", stats.pages_requested);
    println!("  Item links found: {}", stats.links_discovered);
    println!();

    println!("Extraction:");
    println!("  Item pages requested: {}", stats.items_attempted);
    println!("  Records written: {}", stats.records_written);
    println!("  Links skipped: {}", stats.items_skipped);
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} links produced a record)",
        stats.success_rate(),
        stats.records_written,
        stats.links_discovered
    );
    println!("Elapsed: {:.1}s", stats.elapsed.as_secs_f64());
}
