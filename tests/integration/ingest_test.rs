//! Ingestion lifecycle tests.
//!
//! Drives submit/poll/timeout through the public API with a scripted transport.

use std::sync::Arc;
use std::time::Duration;

use druid_client::config::{Config, ConnectionConfig};
use druid_client::error::DruidError;
use druid_client::ingest::{IngestionClient, IngestionSpec, PollConfig};
use druid_client::transport::{HttpResponse, Method, MockTransport};
use serde_json::json;

const BASE: &str = "http://localhost:8090/druid/indexer/v1/task";
const STATUS: &str = "http://localhost:8090/druid/indexer/v1/task/index_wiki_1/status";
const SHUTDOWN: &str = "http://localhost:8090/druid/indexer/v1/task/index_wiki_1/shutdown";

fn config() -> Arc<Config> {
    Arc::new(Config::default().with_connection(
        "druid_ingest_default",
        ConnectionConfig::new("localhost", 8090).with_endpoint("/druid/indexer/v1/task"),
    ))
}

fn status(s: &str) -> HttpResponse {
    HttpResponse::ok_json(json!({"task": "index_wiki_1", "status": {"status": s}}))
}

fn submitted() -> HttpResponse {
    HttpResponse::ok_json(json!({"task": "index_wiki_1"}))
}

fn spec() -> IngestionSpec {
    IngestionSpec::parse(r#"{"type": "index_parallel", "spec": {"ioConfig": {}}}"#).unwrap()
}

fn client(mock: &Arc<MockTransport>, poll: PollConfig) -> IngestionClient {
    IngestionClient::new(mock.clone(), config(), "druid_ingest_default", poll)
}

#[tokio::test]
async fn test_timeout_scenario_third_iteration() {
    let mock = Arc::new(
        MockTransport::new()
            .on_post(BASE, submitted())
            .on_get(STATUS, status("RUNNING"))
            .on_post(SHUTDOWN, HttpResponse::new(200, r#"{"task":"index_wiki_1"}"#)),
    );
    let poll = PollConfig::default()
        .with_interval(Duration::ZERO)
        .with_max_ingestion_secs(2);

    let err = client(&mock, poll).submit(&spec()).await.unwrap_err();

    assert!(matches!(err, DruidError::IngestionTimeout { max_secs: 2 }));
    assert_eq!(mock.count(Method::Get, STATUS), 3);
    assert_eq!(mock.count(Method::Post, SHUTDOWN), 1);

    // Submit, three polls, then the shutdown as the final request.
    let requests = mock.requests();
    assert_eq!(requests.len(), 5);
    assert_eq!(requests.last().map(|r| r.url.as_str()), Some(SHUTDOWN));
}

#[tokio::test]
async fn test_success_scenario_two_polls() {
    let mock = Arc::new(
        MockTransport::new()
            .on_post(BASE, submitted())
            .on_get(STATUS, status("RUNNING"))
            .on_get(STATUS, status("SUCCESS")),
    );
    let poll = PollConfig::default().with_interval(Duration::ZERO);

    let report = client(&mock, poll).submit(&spec()).await.unwrap();

    assert_eq!(report.task_id.as_str(), "index_wiki_1");
    assert_eq!(report.polls, 2);
    assert_eq!(mock.count(Method::Get, STATUS), 2);
    assert_eq!(mock.count(Method::Post, SHUTDOWN), 0);
}

#[tokio::test]
async fn test_rejected_for_each_non_200_status() {
    for code in [201u16, 400, 404, 500, 503] {
        let mock = Arc::new(MockTransport::new().on_post(BASE, HttpResponse::new(code, "")));
        let poll = PollConfig::default().with_interval(Duration::ZERO);

        let err = client(&mock, poll).submit(&spec()).await.unwrap_err();

        assert!(
            matches!(err, DruidError::SubmissionRejected { .. }),
            "status {code} gave {err:?}"
        );
        assert_eq!(mock.count(Method::Get, STATUS), 0);
    }
}

#[tokio::test]
async fn test_interval_is_slept_between_polls() {
    let mock = Arc::new(
        MockTransport::new()
            .on_post(BASE, submitted())
            .on_get(STATUS, status("RUNNING"))
            .on_get(STATUS, status("SUCCESS")),
    );
    let poll = PollConfig::default().with_interval(Duration::from_millis(20));

    let report = client(&mock, poll).submit(&spec()).await.unwrap();

    assert!(report.elapsed >= Duration::from_millis(40));
}

#[tokio::test]
async fn test_spec_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wikipedia-index.json");
    std::fs::write(&path, r#"{"type": "index_parallel"}"#).unwrap();

    let spec = IngestionSpec::from_file(&path).unwrap();
    assert_eq!(spec.as_json()["type"], "index_parallel");

    let err = IngestionSpec::from_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, DruidError::InvalidSpec(_)));
}

/// Helper to get a live overlord URL from the environment.
fn get_overlord_url() -> Option<String> {
    std::env::var("DRUID_OVERLORD_URL").ok()
}

#[tokio::test]
async fn test_live_unknown_task_status() {
    let Some(url) = get_overlord_url() else {
        eprintln!("Skipping test: DRUID_OVERLORD_URL not set");
        return;
    };

    let parsed = url::Url::parse(&url).unwrap();
    let conn = ConnectionConfig::new(
        parsed.host_str().unwrap_or("localhost"),
        parsed.port().unwrap_or(8081),
    )
    .with_endpoint(parsed.path());
    let config = Arc::new(Config::default().with_connection("live", conn));
    let transport = Arc::new(druid_client::transport::HttpTransport::new().unwrap());
    let client = IngestionClient::new(transport, config, "live", PollConfig::default());

    // Unknown tasks answer 404 with a non-status body.
    let result = client
        .task_status(&druid_client::ingest::TaskId::new("no_such_task_for_tests"))
        .await;
    assert!(result.is_err());
}
