//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the Catalog-Harvest catalog crawler.

use anyhow::Context;
use catalog_harvest::config::{load_config_with_hash, validate, Config, EnrichField};
use catalog_harvest::output::print_statistics;
use catalog_harvest::{Coordinator, ResultSink};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Catalog-Harvest: a resilient product-catalog crawler
///
/// Catalog-Harvest walks a paginated shop catalog, enriches every product
/// from its detail page, and saves the records as CSV and XLSX. Press
/// Ctrl-C at any time: everything collected so far is still saved.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resilient product-catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Stop after this many listing pages (0 = unlimited)
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Override the first listing page
    #[arg(long, value_name = "URL")]
    start_url: Option<String>,

    /// Only save products that are in stock
    #[arg(long)]
    in_stock_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration after command-line overrides")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(ExitCode::SUCCESS);
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
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

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(start_url) = &cli.start_url {
        config.crawler.start_url = start_url.clone();
    }
    if cli.in_stock_only {
        config.enrichment.filter_in_stock_only = true;
    }
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Catalog-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Start URL: {}", config.crawler.start_url);
    println!("  Max workers: {}", config.crawler.max_workers);
    match config.crawler.page_limit() {
        Some(limit) => println!("  Max pages: {}", limit),
        None => println!("  Max pages: unlimited"),
    }
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Shutdown grace: {}ms", config.crawler.shutdown_grace_ms);

    println!("\nFetch:");
    println!("  User agent: {}", config.fetch.user_agent);
    println!("  Timeout: {}ms", config.fetch.request_timeout_ms);
    println!(
        "  Retries: {} (backoff {}ms × attempt)",
        config.fetch.retry_count, config.fetch.retry_backoff_base_ms
    );

    println!("\nEnrichment:");
    for field in [
        EnrichField::Category,
        EnrichField::Image,
        EnrichField::Description,
        EnrichField::Availability,
    ] {
        if config.enrichment.wants(field) {
            println!("  - {}", field);
        }
    }
    println!(
        "  In-stock only: {}",
        config.enrichment.filter_in_stock_only
    );

    println!("\nExtraction:");
    println!("  Tile selectors: {}", config.extraction.tile_selectors.join(" | "));
    println!("  Title selectors: {}", config.extraction.title_selectors.join(" | "));
    println!(
        "  Category separator: '{}'",
        config.extraction.category_separator
    );

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!(
        "  Files: {}{}.{{csv,xlsx}}",
        config.output.basename,
        if config.output.timestamped {
            "_<timestamp>"
        } else {
            ""
        }
    );
    if let Some(dir) = &config.output.debug_html_dir {
        println!("  Debug HTML: {}", dir);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<ExitCode> {
    let mut sink = ResultSink::new(&config.output).context("Failed to set up output")?;

    let cancel = CancellationToken::new();
    let coordinator = Coordinator::new(config, cancel.clone())?;

    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, saving what was collected so far");
            on_interrupt.cancel();
        }
    });

    let mut report = coordinator.run().await;
    let exit_code = report.exit_code();

    sink.extend(std::mem::take(&mut report.records));
    let saved = match sink.persist() {
        Ok(paths) if paths.is_empty() => 0,
        Ok(_) => sink.len(),
        Err(e) => {
            tracing::error!("Failed to save results: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    print_statistics(&report, saved);

    Ok(ExitCode::from(exit_code))
}
