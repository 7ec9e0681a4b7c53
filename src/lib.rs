//! Issue-Pulse: live open-issue age breakdown for a hosted repository
//!
//! This crate walks the paginated "list issues" resource of a repository, sorts every open
//! issue into an age bucket (under 24h, 24h to 7d, older than 7d) and streams a snapshot of
//! the running totals after every page, so a long crawl can be watched as it progresses.

pub mod config;
pub mod crawler;
pub mod output;
pub mod repo;
pub mod state;

use thiserror::Error;

/// Main error type for Issue-Pulse operations
///
/// Failures that happen while a session is crawling are not reported through this type;
/// they end up in the `error` field of the final [`crawler::Snapshot`].
#[derive(Debug, Error)]
pub enum PulseError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepoError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid header value for {name}")]
    InvalidHeader { name: &'static str },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),
}

/// Repository identifier errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepoError {
    #[error("Repository identifier is empty")]
    Empty,

    #[error("Repository identifier must look like 'owner/name', got '{0}'")]
    Malformed(String),

    #[error("Repository identifier contains invalid characters: '{0}'")]
    InvalidCharacters(String),
}

/// Result type alias for Issue-Pulse operations
pub type Result<T> = std::result::Result<T, PulseError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for repository identifier operations
pub type RepoResult<T> = std::result::Result<T, RepoError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{BucketCounters, CrawlSession, Crawler, Snapshot, SnapshotStream};
pub use repo::RepositoryId;
pub use state::SessionState;
