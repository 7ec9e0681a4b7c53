//! Repository identifier handling
//!
//! A crawl targets one repository, named in `owner/name` form. This module turns the raw
//! string a caller hands over into a validated [`RepositoryId`].

use crate::RepoError;
use std::fmt;

/// A validated `owner/name` repository identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryId {
    full: String,
    split: usize,
}

impl RepositoryId {
    /// Parses and normalizes a raw repository identifier
    ///
    /// # Normalization Steps
    ///
    /// 1. Trim surrounding whitespace
    /// 2. Strip trailing `/` characters
    /// 3. Reject empty input
    /// 4. Require exactly one `/` separating two non-empty halves
    /// 5. Allow only ASCII alphanumerics, `-`, `_` and `.` in each half
    ///
    /// # Examples
    ///
    /// ```
    /// use issue_pulse::repo::RepositoryId;
    ///
    /// let repo = RepositoryId::parse(" rust-lang/rust/ ").unwrap();
    /// assert_eq!(repo.as_str(), "rust-lang/rust");
    /// assert_eq!(repo.owner(), "rust-lang");
    /// assert_eq!(repo.name(), "rust");
    /// ```
    pub fn parse(raw: &str) -> Result<Self, RepoError> {
        let trimmed = raw.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(RepoError::Empty);
        }

        let (owner, name) = trimmed
            .split_once('/')
            .ok_or_else(|| RepoError::Malformed(trimmed.to_string()))?;

        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(RepoError::Malformed(trimmed.to_string()));
        }

        if !is_valid_segment(owner) || !is_valid_segment(name) {
            return Err(RepoError::InvalidCharacters(trimmed.to_string()));
        }

        Ok(Self {
            full: trimmed.to_string(),
            split: owner.len(),
        })
    }

    /// The account or organization owning the repository
    pub fn owner(&self) -> &str {
        &self.full[..self.split]
    }

    /// The repository name
    pub fn name(&self) -> &str {
        &self.full[self.split + 1..]
    }

    /// The identifier in `owner/name` form
    pub fn as_str(&self) -> &str {
        &self.full
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

fn is_valid_segment(segment: &str) -> bool {
    segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
