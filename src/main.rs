//! Catalog-Crawler main entry point
//!
//! This is the command-line interface for the Catalog-Crawler product crawler.

use catalog_crawler::config::{load_config_with_hash, Config};
use catalog_crawler::crawler::{LinkDiscoverer, SearchQuery, MAX_PAGES, MIN_PAGES};
use catalog_crawler::job::{start_crawl, CrawlJob, JobOutcome};
use catalog_crawler::output::print_statistics;
use catalog_crawler::url::CatalogTarget;
use clap::Parser;
use std::future::Future;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Crawler: a polite product catalog crawler
///
/// Searches the catalog for a term, visits every item found on the result
/// pages, and writes the product identifiers to a CSV file. Press Ctrl-C to
/// stop early; rows already written are kept.
#[derive(Parser, Debug)]
#[command(name = "catalog-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A polite product catalog crawler", long_about = None)]
struct Cli {
    /// Search term (e.g. monitor, notebook)
    #[arg(value_name = "TERM")]
    term: String,

    /// Number of search result pages to scan (1-10)
    #[arg(short, long, default_value_t = 3,
          value_parser = clap::value_parser!(u32).range(MIN_PAGES as i64..=MAX_PAGES as i64))]
    pages: u32,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Directory for result files (overrides the configuration)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate input and show what would be requested without crawling
    #[arg(long)]
    dry_run: bool,

    /// Print crawl statistics when done
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => Config::default(),
    };

    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.to_string_lossy().into_owned();
    }

    if cli.dry_run {
        handle_dry_run(&config, &cli.term, cli.pages)?;
        return Ok(());
    }

    handle_crawl(config, &cli.term, cli.pages, cli.stats).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_crawler=info,warn"),
            1 => EnvFilter::new("catalog_crawler=debug,info"),
            2 => EnvFilter::new("catalog_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates input and shows the first request
fn handle_dry_run(config: &Config, term: &str, pages: u32) -> Result<(), Box<dyn std::error::Error>> {
    catalog_crawler::config::validate(config)?;
    let query = SearchQuery::new(term, pages)?;
    let target = CatalogTarget::from_config(&config.target)?;
    let mut first_page = target.search_url(query.term())?;
    first_page
        .query_pairs_mut()
        .extend_pairs(LinkDiscoverer::search_params(1));

    println!("=== Catalog-Crawler Dry Run ===\n");

    println!("Search:");
    println!("  Term: {}", query.term());
    println!("  Pages: up to {}", query.max_pages());
    println!("  First request: {}", first_page);

    println!("\nTarget:");
    println!("  Item marker: {}", target.item_marker);
    println!("  Identifier pattern: {}", target.id_pattern.as_str());
    println!("  User agent: {}", config.target.user_agent);

    println!("\nPoliteness:");
    println!("  Delay after search page: {}ms", config.politeness.page_delay_ms);
    println!("  Delay before item page: {}ms", config.politeness.item_delay_ms);
    println!(
        "  Retries: {} (backoff factor {}s)",
        config.http.max_retries, config.http.backoff_factor
    );

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    term: &str,
    pages: u32,
    show_stats: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting crawl for: '{}'", term);
    tracing::info!("Pages to scan: {}", pages);

    let mut job = start_crawl(config, term, pages)?;

    follow_job(&mut job, tokio::signal::ctrl_c()).await;

    let report = job.wait().await;
    println!("{}", report.outcome);

    if show_stats {
        println!();
        print_statistics(&report.stats);
    }

    match report.outcome {
        JobOutcome::Failed(message) => Err(message.into()),
        _ => Ok(()),
    }
}

/// Logs progress until the job ends, cancelling it once `interrupt` resolves
///
/// The interrupt future is created once by the caller, so a signal that
/// arrives between progress events is not lost. Returns true if the job was
/// interrupted.
async fn follow_job<F: Future>(job: &mut CrawlJob, interrupt: F) -> bool {
    tokio::pin!(interrupt);

    let mut interrupted = false;
    loop {
        tokio::select! {
            event = job.next_progress() => match event {
                Some(event) => {
                    tracing::info!("[{}/{}] {}", event.completed, event.total, event.message)
                }
                None => break,
            },
            _ = &mut interrupt, if !interrupted => {
                tracing::warn!("Cancellation requested, stopping at the next item");
                interrupted = true;
                job.cancel();
            }
        }
    }

    interrupted
}
