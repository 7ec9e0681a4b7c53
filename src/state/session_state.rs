/// Session state definitions for tracking crawl progress
///
/// This module defines every state a crawl session can be in between its creation and
/// the moment its snapshot stream closes.
use std::fmt;

/// Represents the current state of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    // ===== Active States =====
    /// Session created, no page requested yet
    Pending,

    /// A page request is outstanding
    Fetching,

    /// A snapshot is being delivered to the progress sink
    Emitting,

    // ===== Terminal States =====
    /// The last page was short; the walk finished successfully
    Done,

    /// A transport or API failure ended the walk
    Failed,

    /// The progress sink went away before the walk finished
    Cancelled,
}

impl SessionState {
    /// Returns true if this is a terminal state (no further pages will be fetched)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }

    /// Returns true if the session may still fetch or emit
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns the lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Emitting => "emitting",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true if the session may move from `self` to `next`
    ///
    /// `Cancelled` is reachable from every active state.
    pub fn can_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            (Self::Pending, Self::Fetching) => true,
            (Self::Fetching, Self::Emitting) => true,
            (Self::Emitting, Self::Fetching | Self::Done | Self::Failed) => true,
            (from, Self::Cancelled) => from.is_active(),
            _ => false,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
