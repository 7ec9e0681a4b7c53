//! Crawler module for paginated issue aggregation
//!
//! This module contains the core crawling logic, including:
//! - Fetching one page of issues per request (`fetcher`)
//! - Folding records into age-bucket counters (`aggregator`)
//! - The per-repository session state machine (`session`)
//! - Spawning sessions and streaming their snapshots (`coordinator`)

mod aggregator;
mod coordinator;
mod fetcher;
mod record;
mod session;

pub use aggregator::{classify, fold, AgeBucket, BucketCounters, FoldOutcome};
pub use coordinator::{Crawler, SnapshotStream};
pub use fetcher::{
    api_error_message, build_http_client, GithubPageFetcher, PageResult, PageSource,
    TransportErrorKind, PAGE_SIZE,
};
pub use record::IssueRecord;
pub use session::{CrawlSession, Snapshot};

use crate::config::Config;
use crate::repo::RepositoryId;
use crate::PulseError;

/// Starts a crawl of one repository
///
/// This is the one-shot entry point. It will:
/// 1. Build the HTTP client from the configured credentials
/// 2. Spawn the session driver
/// 3. Return the stream of snapshots the driver emits
///
/// Long-lived callers should build one [`Crawler`] and reuse it for every session.
///
/// # Arguments
///
/// * `config` - The loaded configuration
/// * `repository` - The repository to crawl
///
/// # Returns
///
/// * `Ok(SnapshotStream)` - The session is running
/// * `Err(PulseError)` - The HTTP client could not be built
pub fn crawl(config: &Config, repository: RepositoryId) -> Result<SnapshotStream, PulseError> {
    Ok(Crawler::from_config(config)?.start(repository))
}
