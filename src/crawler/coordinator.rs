//! Crawler coordinator - session spawning and snapshot delivery
//!
//! This module contains the entry point that callers use to start crawls:
//! - Sharing one page source (and its HTTP client) across every session
//! - Spawning one independent task per session
//! - Handing the caller a bounded, ordered stream of snapshots

use crate::config::Config;
use crate::crawler::fetcher::{GithubPageFetcher, PageSource};
use crate::crawler::session::{CrawlSession, Snapshot};
use crate::repo::RepositoryId;
use crate::state::SessionState;
use crate::PulseError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Snapshots buffered between the driver and the consumer
///
/// One slot: the driver can run at most one page ahead of a slow consumer.
const SNAPSHOT_BUFFER: usize = 1;

/// Starts crawl sessions against a shared page source
///
/// Sessions share nothing but the source; each one owns its counters and cursor.
#[derive(Clone)]
pub struct Crawler {
    source: Arc<dyn PageSource>,
}

impl Crawler {
    /// Creates a crawler over any page source
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self { source }
    }

    /// Creates a crawler that talks to the configured remote API
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - HTTP client built with the configured credentials
    /// * `Err(PulseError)` - A credential could not be turned into a header, or the client
    ///   failed to build
    pub fn from_config(config: &Config) -> Result<Self, PulseError> {
        Ok(Self::new(Arc::new(GithubPageFetcher::new(config)?)))
    }

    /// Starts a session using the current time as its reference time
    pub fn start(&self, repository: RepositoryId) -> SnapshotStream {
        self.start_at(repository, Utc::now())
    }

    /// Starts a session with an explicit reference time
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_at(&self, repository: RepositoryId, now: DateTime<Utc>) -> SnapshotStream {
        let (sender, receiver) = mpsc::channel(SNAPSHOT_BUFFER);
        let source = Arc::clone(&self.source);
        let mut session = CrawlSession::new(repository, now);

        let driver = tokio::spawn(async move { session.run(source.as_ref(), &sender).await });

        SnapshotStream { receiver, driver }
    }
}

impl std::fmt::Debug for Crawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crawler").finish_non_exhaustive()
    }
}

/// The ordered, finite snapshot sequence of one session
///
/// Dropping the stream (or calling [`SnapshotStream::close`]) cancels the session: no new
/// page is requested once the driver notices.
#[derive(Debug)]
pub struct SnapshotStream {
    receiver: mpsc::Receiver<Snapshot>,
    driver: JoinHandle<SessionState>,
}

impl SnapshotStream {
    /// Waits for the next snapshot
    ///
    /// Returns `None` once the final snapshot has been delivered.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.receiver.recv().await
    }

    /// Drains every remaining snapshot and returns them with the session's final state
    pub async fn collect(mut self) -> (Vec<Snapshot>, SessionState) {
        let mut snapshots = Vec::new();
        while let Some(snapshot) = self.receiver.recv().await {
            snapshots.push(snapshot);
        }
        let state = join_driver(self.driver).await;
        (snapshots, state)
    }

    /// Stops listening and waits for the driver to wind down
    pub async fn close(mut self) -> SessionState {
        self.receiver.close();
        // Release anything the driver already queued so its pending send fails fast
        while self.receiver.recv().await.is_some() {}
        join_driver(self.driver).await
    }
}

async fn join_driver(driver: JoinHandle<SessionState>) -> SessionState {
    match driver.await {
        Ok(state) => state,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => SessionState::Cancelled,
    }
}
