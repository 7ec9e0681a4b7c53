//! Age-bucket aggregation
//!
//! Folds a page of issue records into running [`BucketCounters`]. Every call is pure: the
//! counters go in by value and come back updated, so the fold can be tested on its own and
//! the session stays the only owner of the running totals.

use crate::crawler::record::IssueRecord;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Running open-issue totals for one session
///
/// Serialized with the key names the progress stream has always used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BucketCounters {
    /// All open issues seen so far
    #[serde(rename = "open_issues_total")]
    pub total_open: u64,

    /// Created less than 24 hours before the session started
    #[serde(rename = "open_issues_24hr")]
    pub open_under_24h: u64,

    /// Created between 24 hours and 7 days before the session started
    #[serde(rename = "open_issues_24hr_7days")]
    pub open_24h_to_7d: u64,

    /// Created 7 days or more before the session started
    #[serde(rename = "open_issues_gt_7days")]
    pub open_over_7d: u64,
}

impl BucketCounters {
    /// Returns true if the total equals the sum of the three buckets
    pub fn is_consistent(&self) -> bool {
        self.total_open == self.open_under_24h + self.open_24h_to_7d + self.open_over_7d
    }

    /// Counts one issue in the given bucket
    pub fn record(&mut self, bucket: AgeBucket) {
        self.total_open += 1;
        match bucket {
            AgeBucket::Under24h => self.open_under_24h += 1,
            AgeBucket::From24hTo7d => self.open_24h_to_7d += 1,
            AgeBucket::Over7d => self.open_over_7d += 1,
        }
    }
}

/// One of three mutually exclusive age ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeBucket {
    /// `[0, 24h)`, including timestamps in the future
    Under24h,
    /// `[24h, 7d)`
    From24hTo7d,
    /// `[7d, ∞)`
    Over7d,
}

/// Classifies an issue by its age at `now`
///
/// Intervals are half-open: an issue exactly 24 hours old is in `From24hTo7d`, and one
/// exactly 7 days old is in `Over7d`.
pub fn classify(created_at: DateTime<Utc>, now: DateTime<Utc>) -> AgeBucket {
    let age = now - created_at;

    if age < Duration::hours(24) {
        AgeBucket::Under24h
    } else if age < Duration::days(7) {
        AgeBucket::From24hTo7d
    } else {
        AgeBucket::Over7d
    }
}

/// Result of folding one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldOutcome {
    /// Updated running totals
    pub counters: BucketCounters,

    /// Pull requests skipped on this page
    pub pull_requests: u64,

    /// Issues dropped because their creation timestamp was missing or malformed
    pub malformed: u64,
}

/// Folds a page of records into the running counters
///
/// Pull requests are skipped. Issues without a parseable `created_at` are dropped from every
/// counter, including the total, and reported through [`FoldOutcome::malformed`].
pub fn fold(
    mut counters: BucketCounters,
    records: &[IssueRecord],
    now: DateTime<Utc>,
) -> FoldOutcome {
    let mut pull_requests = 0;
    let mut malformed = 0;

    for record in records {
        if record.is_pull_request() {
            pull_requests += 1;
            continue;
        }

        match record.created_at() {
            Some(created_at) => counters.record(classify(created_at, now)),
            None => {
                malformed += 1;
                tracing::warn!(
                    "Dropping issue {} with unusable created_at {:?}",
                    record
                        .number
                        .map_or_else(|| "<unknown>".to_string(), |n| format!("#{}", n)),
                    record.created_at
                );
            }
        }
    }

    debug_assert!(counters.is_consistent());

    FoldOutcome {
        counters,
        pull_requests,
        malformed,
    }
}
