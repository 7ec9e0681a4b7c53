//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the remote issue API and drive full sessions
//! through the real HTTP fetcher.

use chrono::{DateTime, Duration, TimeZone, Utc};
use issue_pulse::config::{ApiConfig, Config, CredentialsConfig};
use issue_pulse::crawler::{
    CrawlSession, Crawler, GithubPageFetcher, PageResult, PageSource, TransportErrorKind,
};
use issue_pulse::output::write_event_stream;
use issue_pulse::repo::RepositoryId;
use issue_pulse::{BucketCounters, SessionState};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ISSUES_PATH: &str = "/repos/octocat/hello-world/issues";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str) -> Config {
    Config {
        api: ApiConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            connect_timeout_secs: 1,
            ..ApiConfig::default()
        },
        credentials: CredentialsConfig {
            account: "octocat".to_string(),
            token: "ghp_test_token".to_string(),
        },
    }
}

fn repo() -> RepositoryId {
    RepositoryId::parse("octocat/hello-world/").expect("valid repository")
}

fn issues_aged(count: usize, age: Duration) -> Vec<Value> {
    (0..count)
        .map(|n| {
            json!({
                "number": n + 1,
                "title": format!("Issue {}", n + 1),
                "state": "open",
                "created_at": (now() - age).to_rfc3339(),
            })
        })
        .collect()
}

async fn mount_page(server: &MockServer, page: u32, body: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(ISSUES_PATH))
        .and(query_param("state", "open"))
        .and(query_param("per_page", "100"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_single_page_crawl() {
    let mock_server = MockServer::start().await;

    let mut body = issues_aged(1, Duration::hours(1));
    body.extend(issues_aged(1, Duration::hours(30)));
    body.extend(issues_aged(1, Duration::days(10)));
    mount_page(&mock_server, 1, body).await;

    let crawler = Crawler::from_config(&create_test_config(&mock_server.uri()))
        .expect("Failed to build crawler");
    let (snapshots, state) = crawler.start_at(repo(), now()).collect().await;

    assert_eq!(state, SessionState::Done);
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].url, "octocat/hello-world");
    assert!(snapshots[0].processed);
    assert_eq!(snapshots[0].error, None);
    assert_eq!(
        snapshots[0].counts,
        BucketCounters {
            total_open: 3,
            open_under_24h: 1,
            open_24h_to_7d: 1,
            open_over_7d: 1,
        }
    );
}

#[tokio::test]
async fn test_multi_page_crawl() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, 1, issues_aged(100, Duration::hours(2))).await;
    mount_page(&mock_server, 2, issues_aged(5, Duration::hours(2))).await;

    let crawler = Crawler::from_config(&create_test_config(&mock_server.uri()))
        .expect("Failed to build crawler");
    let (snapshots, state) = crawler.start_at(repo(), now()).collect().await;

    assert_eq!(state, SessionState::Done);
    assert_eq!(snapshots.len(), 2);
    assert!(!snapshots[0].processed);
    assert_eq!(snapshots[0].counts.total_open, 100);
    assert!(snapshots[1].processed);
    assert_eq!(
        snapshots[1].counts,
        BucketCounters {
            total_open: 105,
            open_under_24h: 105,
            open_24h_to_7d: 0,
            open_over_7d: 0,
        }
    );

    // `expect(1)` on each page is verified when the server drops
}

#[tokio::test]
async fn test_pull_requests_are_excluded() {
    let mock_server = MockServer::start().await;

    let mut body = issues_aged(2, Duration::days(3));
    body.push(json!({
        "number": 50,
        "created_at": (now() - Duration::hours(1)).to_rfc3339(),
        "pull_request": {"url": "https://api.github.com/repos/octocat/hello-world/pulls/50"},
    }));
    body.push(json!({
        "number": 51,
        "created_at": (now() - Duration::hours(1)).to_rfc3339(),
        "pull_request": null,
    }));
    mount_page(&mock_server, 1, body).await;

    let crawler = Crawler::from_config(&create_test_config(&mock_server.uri()))
        .expect("Failed to build crawler");
    let (snapshots, _) = crawler.start_at(repo(), now()).collect().await;

    let counts = snapshots.last().expect("one snapshot").counts;
    assert_eq!(counts.total_open, 3);
    assert_eq!(counts.open_24h_to_7d, 2);
    assert_eq!(counts.open_under_24h, 1);
}

#[tokio::test]
async fn test_non_string_created_at_is_skipped() {
    let mock_server = MockServer::start().await;

    let mut body = issues_aged(2, Duration::hours(5));
    body.push(json!({"number": 9, "created_at": 1718445600}));
    mount_page(&mock_server, 1, body).await;

    let fetcher = GithubPageFetcher::new(&create_test_config(&mock_server.uri()))
        .expect("Failed to build fetcher");
    let (sender, mut receiver) = tokio::sync::mpsc::channel(4);
    let mut session = CrawlSession::new(repo(), now());

    let state = session.run(&fetcher, &sender).await;
    drop(sender);

    assert_eq!(state, SessionState::Done);
    assert_eq!(session.skipped_records(), 1);
    assert_eq!(
        session.counters(),
        BucketCounters {
            total_open: 2,
            open_under_24h: 2,
            open_24h_to_7d: 0,
            open_over_7d: 0,
        }
    );

    let snapshot = receiver.recv().await.expect("one snapshot");
    assert!(snapshot.processed);
    assert_eq!(snapshot.error, None);
    assert!(receiver.recv().await.is_none());
}

#[tokio::test]
async fn test_request_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ISSUES_PATH))
        .and(header("user-agent", "octocat"))
        .and(header("accept", "application/vnd.github+json"))
        .and(header("x-github-api-version", "2022-11-28"))
        .and(header("authorization", "Bearer ghp_test_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = GithubPageFetcher::new(&create_test_config(&mock_server.uri()))
        .expect("Failed to build fetcher");
    let result = fetcher.fetch_page(&repo(), 1).await;

    assert!(matches!(result, PageResult::Ok { ref records } if records.is_empty()));
}

#[tokio::test]
async fn test_api_error_ends_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ISSUES_PATH))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({
                "message": "Validation Failed",
                "documentation_url": "https://docs.github.com/rest",
            })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let crawler = Crawler::from_config(&create_test_config(&mock_server.uri()))
        .expect("Failed to build crawler");
    let (snapshots, state) = crawler.start_at(repo(), now()).collect().await;

    assert_eq!(state, SessionState::Failed);
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].error.as_deref(), Some("Validation Failed"));
    assert!(!snapshots[0].processed);
    assert_eq!(snapshots[0].counts, BucketCounters::default());
}

#[tokio::test]
async fn test_api_error_on_later_page() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, 1, issues_aged(100, Duration::days(30))).await;
    Mock::given(method("GET"))
        .and(path(ISSUES_PATH))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"message": "API rate limit exceeded"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let crawler = Crawler::from_config(&create_test_config(&mock_server.uri()))
        .expect("Failed to build crawler");
    let (snapshots, state) = crawler.start_at(repo(), now()).collect().await;

    assert_eq!(state, SessionState::Failed);
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[1].counts.total_open, 100);
    assert_eq!(snapshots[1].counts.open_over_7d, 100);
    assert_eq!(
        snapshots[1].error.as_deref(),
        Some("API rate limit exceeded")
    );
}

#[tokio::test]
async fn test_connection_failure() {
    // Bind only to learn a free port, then release it so connections are refused
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let base_url = format!("http://{}", listener.local_addr().expect("local address"));
    drop(listener);

    let fetcher =
        GithubPageFetcher::new(&create_test_config(&base_url)).expect("Failed to build fetcher");
    let result = fetcher.fetch_page(&repo(), 1).await;
    assert!(matches!(
        result,
        PageResult::TransportError {
            kind: TransportErrorKind::ConnectionFailure,
            ..
        }
    ));

    let crawler =
        Crawler::from_config(&create_test_config(&base_url)).expect("Failed to build crawler");
    let (snapshots, state) = crawler.start_at(repo(), now()).collect().await;

    assert_eq!(state, SessionState::Failed);
    assert_eq!(snapshots.len(), 1);
    assert!(!snapshots[0].processed);
    assert!(snapshots[0].error.as_deref().is_some_and(|e| !e.is_empty()));
    assert_eq!(snapshots[0].counts, BucketCounters::default());
}

#[tokio::test]
async fn test_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ISSUES_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri());
    config.api.timeout_secs = 1;

    let fetcher = GithubPageFetcher::new(&config).expect("Failed to build fetcher");
    let result = fetcher.fetch_page(&repo(), 1).await;

    assert!(matches!(
        result,
        PageResult::TransportError {
            kind: TransportErrorKind::Timeout,
            ..
        }
    ));
}

#[tokio::test]
async fn test_unexpected_body_is_a_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ISSUES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total_count": 3})))
        .mount(&mock_server)
        .await;

    let crawler = Crawler::from_config(&create_test_config(&mock_server.uri()))
        .expect("Failed to build crawler");
    let (snapshots, state) = crawler.start_at(repo(), now()).collect().await;

    assert_eq!(state, SessionState::Failed);
    assert_eq!(snapshots.len(), 1);
    assert!(snapshots[0]
        .error
        .as_deref()
        .is_some_and(|e| e.starts_with("request failure: Unexpected response body")));
}

#[tokio::test]
async fn test_event_stream_output() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, 1, issues_aged(100, Duration::days(2))).await;
    mount_page(&mock_server, 2, issues_aged(1, Duration::days(2))).await;

    let crawler = Crawler::from_config(&create_test_config(&mock_server.uri()))
        .expect("Failed to build crawler");
    let stream = crawler.start_at(repo(), now());

    let mut out = Vec::new();
    let last = write_event_stream(stream, &mut out)
        .await
        .expect("Failed to write stream")
        .expect("at least one snapshot");
    assert!(last.processed);

    let text = String::from_utf8(out).expect("UTF-8 output");
    let events: Vec<&str> = text.split_terminator("\n\n").collect();
    assert_eq!(events.len(), 3);

    let payloads: Vec<Value> = events[..2]
        .iter()
        .map(|event| {
            let json = event.strip_prefix("data: ").expect("data event");
            serde_json::from_str(json).expect("valid JSON payload")
        })
        .collect();

    assert_eq!(
        payloads[0],
        json!({
            "url": "octocat/hello-world",
            "counts": {
                "open_issues_total": 100,
                "open_issues_24hr": 0,
                "open_issues_24hr_7days": 100,
                "open_issues_gt_7days": 0,
            },
            "processed": false,
            "error": null,
        })
    );
    assert_eq!(payloads[1]["counts"]["open_issues_total"], 101);
    assert_eq!(payloads[1]["processed"], true);
    assert_eq!(events[2], "event: complete\ndata: done");
}
