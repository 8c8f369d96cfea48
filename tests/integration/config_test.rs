//! Config file tests.
//!
//! Loads TOML from disk and resolves connections the way druidctl does.

use std::io::Write;
use std::sync::Arc;

use druid_client::config::{Config, ConnectionResolver, DEFAULT_BROKER_CONNECTION};
use druid_client::ingest::{IngestionClient, PollConfig};
use druid_client::transport::MockTransport;
use pretty_assertions::assert_eq;
use std::time::Duration;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_and_resolve() {
    let file = write_config(
        r#"
[client]
ingest_connection = "overlord"
poll_interval_secs = 10

[connections.overlord]
host = "overlord.example.com"
port = 8090
schema = "https"
endpoint = "druid/indexer/v1/task"

[connections.druid_broker_default]
host = "broker.example.com"
port = 8082
"#,
    );

    let config = Config::load_from_file(file.path()).unwrap();

    let poll = PollConfig::from(&config.client);
    assert_eq!(poll.interval, Duration::from_secs(10));
    assert_eq!(poll.max_ingestion_secs, None);

    let ingest = config.resolve(&config.client.ingest_connection).unwrap();
    assert_eq!(
        ingest.ingest_url().unwrap(),
        "https://overlord.example.com:8090/druid/indexer/v1/task"
    );

    let broker = config.resolve(DEFAULT_BROKER_CONNECTION).unwrap();
    assert_eq!(
        broker.broker_url().unwrap(),
        "http://broker.example.com:8082/druid/v2/sql"
    );
}

#[test]
fn test_engine_uses_loaded_config() {
    let file = write_config(
        r#"
[connections.druid_ingest_default]
host = "localhost"
port = 8081
"#,
    );
    let config = Config::load_from_file(file.path()).unwrap();
    let poll = PollConfig::from(&config.client);

    let client = IngestionClient::new(
        Arc::new(MockTransport::new()),
        Arc::new(config),
        "druid_ingest_default",
        poll,
    );

    assert_eq!(client.ingest_url().unwrap(), "http://localhost:8081/");
    assert_eq!(client.poll_config().interval, Duration::from_secs(1));
}

#[test]
fn test_missing_host_is_rejected() {
    let file = write_config(
        r#"
[connections.broken]
port = 8081
"#,
    );

    let err = Config::load_from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("host"));
}
