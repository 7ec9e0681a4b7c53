//! Issue-Pulse main entry point
//!
//! This is the command-line interface for the Issue-Pulse open-issue crawler.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use issue_pulse::config::load_config;
use issue_pulse::crawler::Crawler;
use issue_pulse::output::{write_event_stream, write_summary_stream};
use issue_pulse::repo::RepositoryId;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Issue-Pulse: open issues by age for a repository
///
/// Issue-Pulse walks every page of a repository's open issues and reports how many were
/// opened in the last 24 hours, between 24 hours and 7 days ago, and more than 7 days ago.
/// Progress is printed after every page.
#[derive(Parser, Debug)]
#[command(name = "issue-pulse")]
#[command(version = "1.0.0")]
#[command(about = "Open issues by age for a repository", long_about = None)]
struct Cli {
    /// Repository to crawl, as owner/name
    #[arg(value_name = "REPOSITORY")]
    repository: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Sse)]
    format: Format,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// `data: <json>` events, one per page
    Sse,
    /// Human-readable progress and summary
    Text,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let repository = RepositoryId::parse(&cli.repository)
        .with_context(|| format!("Invalid repository '{}'", cli.repository))?;

    match &cli.config {
        Some(path) => tracing::info!("Loading configuration from: {}", path.display()),
        None => tracing::info!("No configuration file given, using defaults and environment"),
    }
    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    let crawler = Crawler::from_config(&config).context("Failed to build HTTP client")?;
    let stream = crawler.start(repository);

    let mut stdout = tokio::io::stdout();
    let last = match cli.format {
        Format::Sse => write_event_stream(stream, &mut stdout).await?,
        Format::Text => write_summary_stream(stream, &mut stdout).await?,
    };

    match last {
        Some(snapshot) if snapshot.processed => Ok(ExitCode::SUCCESS),
        Some(snapshot) => {
            if let Some(error) = &snapshot.error {
                tracing::error!("Crawl of {} failed: {}", snapshot.url, error);
            }
            Ok(ExitCode::FAILURE)
        }
        None => {
            tracing::error!("Crawl ended without reporting any progress");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout carries only the crawl output.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("issue_pulse=info,warn"),
            1 => EnvFilter::new("issue_pulse=debug,info"),
            2 => EnvFilter::new("issue_pulse=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
