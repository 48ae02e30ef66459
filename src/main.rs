//! Datecrawl main entry point
//!
//! This is the command-line interface for the date-partitioned tree crawler.

use anyhow::Context;
use clap::Parser;
use datecrawl::config::load_config_with_hash;
use datecrawl::output::{finish_line, print_statistics};
use datecrawl::storage::open_storage;
use datecrawl::{CrawlError, CrawlEvent, Crawler};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Datecrawl: mirror a date-partitioned HTTP directory tree
///
/// Walks `year_YYYY/month_MM/day_DD/` directories on a remote server for
/// every day in the configured range, following directory listings and
/// fetching the leaf files that match the configured patterns.
#[derive(Parser, Debug)]
#[command(name = "datecrawl")]
#[command(version)]
#[command(about = "Crawl a date-partitioned HTTP directory tree", long_about = None)]
struct Cli {
    /// Path to JSON configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Path to a TOML defaults file, replacing the shipped defaults
    #[arg(long, value_name = "PATH")]
    defaults: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Resolve the configuration and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber
///
/// `LOG_LEVEL` takes precedence over the verbosity flags.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = match EnvFilter::try_from_env("LOG_LEVEL") {
        Ok(filter) => filter,
        Err(_) if quiet => EnvFilter::new("error"),
        Err(_) => match verbose {
            0 => EnvFilter::new("datecrawl=info,warn"),
            1 => EnvFilter::new("datecrawl=debug,info"),
            2 => EnvFilter::new("datecrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        },
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (user, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("cannot load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded (hash: {})", hash);

    let mut crawler = Crawler::new(&user)?;
    if let Some(path) = &cli.defaults {
        crawler = crawler.with_defaults_path(path);
    }

    if cli.dry_run {
        handle_dry_run(crawler).await?;
        return Ok(ExitCode::SUCCESS);
    }

    handle_crawl(crawler, cli.verbose > 0).await
}

/// Handles the --dry-run mode: resolves config and shows what would be crawled
async fn handle_dry_run(mut crawler: Crawler) -> anyhow::Result<()> {
    crawler.initialize().await?;
    let config = crawler
        .config()
        .context("configuration was not resolved")?;

    println!("=== Datecrawl Dry Run ===\n");
    println!("Source: {}{}", config.server, config.root);
    println!("Concurrency: {}", config.concurrency);
    match &config.output {
        Some(output) => println!("Output: {}", output.display()),
        None => println!("Output: <discarded>"),
    }

    println!("\nMatch all ({}):", config.filter.match_all().count());
    for pattern in config.filter.match_all() {
        println!("  - {}", pattern);
    }
    println!("\nFile match ({}):", config.filter.file_match().count());
    for pattern in config.filter.file_match() {
        println!("  - {}", pattern);
    }

    let range = crawler.date_range();
    println!("\nDate partitions ({}):", range.len());
    for path in range {
        println!("  {}", path);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the main crawl operation, printing progress as events arrive
///
/// Errors reported as events are printed by the event printer only; an
/// aborted crawl maps to a failing exit code without printing them again.
async fn handle_crawl(mut crawler: Crawler, detailed: bool) -> anyhow::Result<ExitCode> {
    let mut events = crawler.subscribe();
    let printer = tokio::spawn(async move {
        let mut errors = 0usize;
        while let Some(event) = events.recv().await {
            match event {
                CrawlEvent::Ready => println!("Loaded configuration."),
                CrawlEvent::Directory { path } => println!("  {}", path),
                CrawlEvent::End { stats } => {
                    if detailed {
                        print_statistics(&stats);
                    }
                    println!("{}", finish_line(&stats));
                }
                CrawlEvent::Error(e) => {
                    errors += 1;
                    eprintln!("{}", e);
                }
            }
        }
        errors
    });

    crawler.start()?;

    // the output directory is only known once defaults are merged in
    let result = match crawler.initialize().await {
        Ok(()) => {
            if let Some(output) = crawler.config().and_then(|c| c.output.clone()) {
                tracing::info!("Writing files under {}", output.display());
                crawler = crawler.with_sink(open_storage(&output));
            } else {
                tracing::debug!("No output directory; file bodies are discarded");
            }
            crawler.run().await
        }
        Err(e) => Err(e),
    };

    // closes the event channel so the printer can finish
    drop(crawler);
    let errors = printer.await?;

    let stats = match result {
        Ok(stats) => stats,
        Err(CrawlError::Aborted(_)) => return Ok(ExitCode::FAILURE),
        Err(e) => return Err(e.into()),
    };
    if errors > 0 {
        tracing::warn!(
            "{} of {} paths abandoned",
            stats.abandoned,
            stats.directories + stats.files + stats.abandoned
        );
    }
    Ok(ExitCode::SUCCESS)
}
