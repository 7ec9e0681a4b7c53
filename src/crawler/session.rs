//! Crawl session state machine
//!
//! A session walks the pages of one repository strictly in order:
//!
//! ```text
//! Pending -> Fetching -> Emitting -> Fetching -> ... -> Emitting -> Done | Failed
//! ```
//!
//! Every page outcome (success, API error, transport error) produces exactly one
//! [`Snapshot`]. A closed progress sink moves the session to `Cancelled` at the next
//! suspension point.

use crate::crawler::aggregator::{fold, BucketCounters};
use crate::crawler::fetcher::{PageResult, PageSource, PAGE_SIZE};
use crate::repo::RepositoryId;
use crate::state::SessionState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

/// A view of a session's progress, emitted after every page outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Repository identifier in `owner/name` form
    pub url: String,

    /// Running totals
    pub counts: BucketCounters,

    /// True once the last page has been folded in
    pub processed: bool,

    /// Set when the session failed
    pub error: Option<String>,
}

impl Snapshot {
    /// Returns true if no snapshot follows this one
    pub fn is_final(&self) -> bool {
        self.processed || self.error.is_some()
    }
}

/// One crawl of one repository
#[derive(Debug)]
pub struct CrawlSession {
    repository: RepositoryId,
    now: DateTime<Utc>,
    counters: BucketCounters,
    completed: bool,
    error: Option<String>,
    current_page: u32,
    state: SessionState,
    pages_fetched: u32,
    skipped_records: u64,
}

impl CrawlSession {
    /// Creates a session for `repository`
    ///
    /// `now` is the reference time for every age classification in this session. It is
    /// never recomputed, so bucket boundaries stay put across pages.
    pub fn new(repository: RepositoryId, now: DateTime<Utc>) -> Self {
        Self {
            repository,
            now,
            counters: BucketCounters::default(),
            completed: false,
            error: None,
            current_page: 1,
            state: SessionState::Pending,
            pages_fetched: 0,
            skipped_records: 0,
        }
    }

    pub fn repository(&self) -> &RepositoryId {
        &self.repository
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn counters(&self) -> BucketCounters {
        self.counters
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// The next page to request (1-based)
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Number of pages fetched and folded successfully
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Issues dropped because their creation timestamp was unusable
    pub fn skipped_records(&self) -> u64 {
        self.skipped_records
    }

    /// Returns true once the walk completed or failed
    pub fn is_finished(&self) -> bool {
        self.completed || self.error.is_some()
    }

    /// Builds a snapshot of the current state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            url: self.repository.to_string(),
            counts: self.counters,
            processed: self.completed,
            error: self.error.clone(),
        }
    }

    /// Moves to `Fetching` and returns the page to request
    pub fn begin_fetch(&mut self) -> u32 {
        self.transition(SessionState::Fetching);
        self.current_page
    }

    /// Applies the outcome of the outstanding fetch and returns the snapshot to emit
    ///
    /// | Outcome | Effect |
    /// |---------|--------|
    /// | Full page (100 or more records) | fold, advance `current_page` |
    /// | Short page (fewer than 100) | fold, mark completed |
    /// | API error | nothing folded, error = payload message |
    /// | Transport error | nothing folded, error = failure description |
    pub fn apply(&mut self, result: PageResult) -> Snapshot {
        let page = self.current_page;

        match result {
            PageResult::Ok { records } => {
                let outcome = fold(self.counters, &records, self.now);
                self.counters = outcome.counters;
                self.skipped_records += outcome.malformed;
                self.pages_fetched += 1;

                tracing::debug!(
                    "{} page {}: {} records ({} pull requests, {} unusable), {} open so far",
                    self.repository,
                    page,
                    records.len(),
                    outcome.pull_requests,
                    outcome.malformed,
                    self.counters.total_open
                );

                if records.len() >= PAGE_SIZE {
                    self.current_page += 1;
                } else {
                    self.completed = true;
                }
            }
            PageResult::ApiError {
                message,
                status_code,
            } => {
                tracing::warn!(
                    "{} page {} rejected with HTTP {}: {}",
                    self.repository,
                    page,
                    status_code,
                    message
                );
                self.error = Some(message);
            }
            PageResult::TransportError { kind, detail } => {
                tracing::warn!(
                    "Ignoring {} after {} on page {}: {}",
                    self.repository,
                    kind,
                    page,
                    detail
                );
                self.error = Some(if detail.is_empty() {
                    kind.to_string()
                } else {
                    format!("{}: {}", kind, detail)
                });
            }
        }

        self.transition(SessionState::Emitting);
        debug_assert!(self.counters.is_consistent());
        self.snapshot()
    }

    /// Marks the current snapshot as delivered
    ///
    /// Finished sessions move to `Done` or `Failed`; otherwise the session stays in
    /// `Emitting` until the next `begin_fetch`.
    pub fn finish_emit(&mut self) {
        if self.error.is_some() {
            self.transition(SessionState::Failed);
        } else if self.completed {
            self.transition(SessionState::Done);
        }
    }

    /// Stops the session because nobody is listening any more
    pub fn cancel(&mut self) {
        if self.state.is_active() {
            self.transition(SessionState::Cancelled);
        }
    }

    /// Drives the session until it finishes or the sink closes
    ///
    /// Pages are fetched one at a time. Each snapshot is handed to `sink` and the driver
    /// waits for it to be accepted before requesting the next page.
    ///
    /// # Returns
    ///
    /// The terminal state: `Done`, `Failed` or `Cancelled`
    pub async fn run<S>(&mut self, source: &S, sink: &mpsc::Sender<Snapshot>) -> SessionState
    where
        S: PageSource + ?Sized,
    {
        tracing::info!(
            "Starting crawl of {} (reference time {})",
            self.repository,
            self.now.to_rfc3339()
        );

        while !self.completed && self.error.is_none() {
            if sink.is_closed() {
                tracing::info!("Progress stream for {} closed, stopping", self.repository);
                self.cancel();
                return self.state;
            }

            let page = self.begin_fetch();
            let result = source.fetch_page(&self.repository, page).await;
            let snapshot = self.apply(result);

            if sink.send(snapshot).await.is_err() {
                tracing::info!(
                    "Progress stream for {} closed after page {}, stopping",
                    self.repository,
                    page
                );
                self.cancel();
                return self.state;
            }

            self.finish_emit();
        }

        if self.skipped_records > 0 {
            tracing::warn!(
                "{}: {} issues had no usable created_at and were left out of every count",
                self.repository,
                self.skipped_records
            );
        }

        tracing::info!(
            "Crawl of {} {} after {} pages: {} open issues",
            self.repository,
            self.state,
            self.pages_fetched,
            self.counters.total_open
        );

        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid session transition {} -> {}",
            self.state,
            next
        );
        self.state = next;
    }
}
