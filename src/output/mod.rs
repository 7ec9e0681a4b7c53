//! Output module for delivering crawl progress
//!
//! This module handles:
//! - Framing snapshots as `data: <json>` push-stream events
//! - Writing a whole snapshot stream to any async writer
//! - Rendering a snapshot as a human-readable summary

mod event_stream;
mod summary;

pub use event_stream::{event_frame, write_event_stream, STREAM_COMPLETE_FRAME};
pub use summary::{render_summary, write_summary_stream};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
