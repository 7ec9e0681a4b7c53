//! Page fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the identifying and authorization headers
//! - Requesting one page of open issues per call
//! - Classifying failures into API errors and transport errors
//!
//! There is no retry logic: every failure is returned to the session as-is.

use crate::config::Config;
use crate::crawler::record::IssueRecord;
use crate::repo::RepositoryId;
use crate::PulseError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Maximum number of records the remote API returns per page
pub const PAGE_SIZE: usize = 100;

/// Header carrying the REST API version
const API_VERSION_HEADER: &str = "x-github-api-version";

/// Kind of transport-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused, DNS failure, TLS failure
    ConnectionFailure,
    /// The request did not complete in time
    Timeout,
    /// Any other failure while sending the request or reading the response
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ConnectionFailure => "connection failure",
            Self::Timeout => "timeout",
            Self::Other => "request failure",
        })
    }
}

/// Result of a single page fetch
#[derive(Debug)]
pub enum PageResult {
    /// The page was fetched and decoded
    Ok {
        /// Every record on the page, pull requests included
        records: Vec<IssueRecord>,
    },

    /// The API answered with a non-success status
    ApiError {
        /// Message taken from the error payload
        message: String,
        /// The HTTP status code
        status_code: u16,
    },

    /// The request could not be completed
    TransportError {
        /// Failure classification
        kind: TransportErrorKind,
        /// Error description
        detail: String,
    },
}

impl PageResult {
    /// Number of records on a successful page, `None` for failures
    ///
    /// Pull requests count here: page fullness is about the raw page, not about issues.
    pub fn record_count(&self) -> Option<usize> {
        match self {
            Self::Ok { records } => Some(records.len()),
            _ => None,
        }
    }

    /// Returns true if this page was full, so more pages may follow
    pub fn is_full_page(&self) -> bool {
        self.record_count().is_some_and(|count| count >= PAGE_SIZE)
    }
}

/// A source of issue pages
///
/// The session only ever talks to this trait, so tests can drive it with canned pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches page `page` (1-based) of open issues for `repository`
    ///
    /// Implementations issue exactly one request per call and never retry.
    async fn fetch_page(&self, repository: &RepositoryId, page: u32) -> PageResult;
}

/// Builds an HTTP client with the configured headers and timeouts
///
/// Every request made with the returned client carries:
/// - `User-Agent`: the configured account name
/// - `Accept`: the configured media type
/// - `X-GitHub-Api-Version`: the configured API version
/// - `Authorization`: `Bearer <token>`
///
/// # Arguments
///
/// * `config` - The loaded configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(PulseError)` - A header value was not valid or the client failed to build
pub fn build_http_client(config: &Config) -> Result<Client, PulseError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, header_value("Accept", &config.api.accept)?);
    headers.insert(
        API_VERSION_HEADER,
        header_value(API_VERSION_HEADER, &config.api.api_version)?,
    );

    let mut auth = header_value(
        "Authorization",
        &format!("Bearer {}", config.credentials.token),
    )?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    let client = Client::builder()
        .user_agent(header_value("User-Agent", &config.credentials.account)?)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.api.timeout_secs))
        .connect_timeout(Duration::from_secs(config.api.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, PulseError> {
    HeaderValue::from_str(value.trim()).map_err(|_| PulseError::InvalidHeader { name })
}

/// Fetches issue pages from a GitHub-compatible REST API
#[derive(Debug, Clone)]
pub struct GithubPageFetcher {
    client: Client,
    base_url: String,
}

impl GithubPageFetcher {
    /// Creates a fetcher from the configuration
    pub fn new(config: &Config) -> Result<Self, PulseError> {
        Ok(Self::with_client(build_http_client(config)?, &config.api.base_url))
    }

    /// Creates a fetcher around an already configured client
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// URL of the "list issues" resource for a repository
    pub fn issues_url(&self, repository: &RepositoryId) -> String {
        format!(
            "{}/repos/{}/{}/issues",
            self.base_url,
            repository.owner(),
            repository.name()
        )
    }
}

#[async_trait]
impl PageSource for GithubPageFetcher {
    async fn fetch_page(&self, repository: &RepositoryId, page: u32) -> PageResult {
        debug_assert!(page >= 1, "pages are 1-based");

        let url = self.issues_url(repository);
        tracing::debug!("Fetching page {} of {}", page, url);

        let response = match self
            .client
            .get(&url)
            .query(&[
                ("state", "open".to_string()),
                ("per_page", PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return transport_error(&e),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return transport_error(&e),
        };

        if !status.is_success() {
            return PageResult::ApiError {
                message: api_error_message(status, &body),
                status_code: status.as_u16(),
            };
        }

        match serde_json::from_str::<Vec<IssueRecord>>(&body) {
            Ok(records) => PageResult::Ok { records },
            Err(e) => PageResult::TransportError {
                kind: TransportErrorKind::Other,
                detail: format!("Unexpected response body from {}: {}", url, e),
            },
        }
    }
}

/// Classifies a reqwest error
fn transport_error(error: &reqwest::Error) -> PageResult {
    let kind = if error.is_timeout() {
        TransportErrorKind::Timeout
    } else if error.is_connect() {
        TransportErrorKind::ConnectionFailure
    } else {
        TransportErrorKind::Other
    };

    PageResult::TransportError {
        kind,
        detail: error.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Extracts a human-readable message from an error response
///
/// Uses the payload's `message`, then the first `errors[].message`, then the bare status.
pub fn api_error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|payload| {
            payload
                .message
                .filter(|m| !m.is_empty())
                .or_else(|| payload.errors.into_iter().find_map(|detail| detail.message))
        })
        .unwrap_or_else(|| format!("HTTP {}", status))
}
