//! Issue records as returned by the "list issues" endpoint

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One item from a page of results
///
/// Only the fields the crawl needs are decoded; everything else in the payload is ignored.
/// `created_at` stays raw text and `number` accepts anything, so one odd field cannot fail
/// the whole page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueRecord {
    /// Issue number, used for log messages only
    #[serde(default, deserialize_with = "lenient_number")]
    pub number: Option<u64>,

    /// Creation timestamp (RFC 3339)
    #[serde(default, deserialize_with = "lenient_text")]
    pub created_at: Option<String>,

    /// Present and non-null on pull requests
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl IssueRecord {
    /// Returns true if this record is a pull request rather than an issue
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    /// Parses the creation timestamp
    ///
    /// Returns `None` when the timestamp is missing or not valid RFC 3339.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }
}

/// Keeps strings as-is and renders any other non-null value as its JSON text
///
/// A non-string timestamp then fails to parse in [`IssueRecord::created_at`] instead of
/// failing the page decode.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|value| value.as_u64()))
}
