//! Broker query tests.
//!
//! Mock-backed tests always run; the live test needs `DRUID_BROKER_HOST`
//! (and optionally `DRUID_BROKER_PORT`).

use std::sync::Arc;
use std::time::Duration;

use druid_client::broker::{
    HttpBrokerConnector, MockBrokerConnector, QueryExecutor, QueryParameter, Value,
};
use druid_client::config::{Config, ConnectionConfig};
use druid_client::error::DruidError;

fn config(host: &str, port: u16) -> Arc<Config> {
    Arc::new(
        Config::default().with_connection("druid_broker_default", ConnectionConfig::new(host, port)),
    )
}

#[tokio::test]
async fn test_release_on_every_path() {
    let ok = Arc::new(MockBrokerConnector::new(vec![vec![Value::Int(1)]]));
    let failing = Arc::new(MockBrokerConnector::failing("Encountered \"FORM\""));

    let ok_exec = QueryExecutor::new(ok.clone(), config("broker", 8082), "druid_broker_default");
    let bad_exec =
        QueryExecutor::new(failing.clone(), config("broker", 8082), "druid_broker_default");

    ok_exec.fetch_one("SELECT 1", None).await.unwrap();
    ok_exec.fetch_all("SELECT 1", None).await.unwrap();
    assert!(bad_exec.fetch_one("SELECT * FORM t", None).await.is_err());
    assert!(bad_exec.fetch_all("SELECT * FORM t", None).await.is_err());

    for stats in [ok.stats(), failing.stats()] {
        assert_eq!(stats.connections_opened, stats.connections_closed);
        assert_eq!(stats.cursors_opened, stats.cursors_closed);
        assert_eq!(stats.cursors_opened, 2);
    }
}

#[tokio::test(flavor = "current_thread")]
async fn test_unreachable_broker_is_transport_error() {
    let connector = Arc::new(HttpBrokerConnector::new(Duration::from_secs(2)).unwrap());
    // Port 9 (discard) is closed on test machines.
    let executor = QueryExecutor::new(connector, config("127.0.0.1", 9), "druid_broker_default");

    let err = executor.fetch_all("SELECT 1", None).await.unwrap_err();
    assert!(matches!(err, DruidError::Transport(_)), "got {err:?}");
}

/// Helper to get a live broker from the environment.
fn get_live_executor() -> Option<QueryExecutor> {
    let host = std::env::var("DRUID_BROKER_HOST").ok()?;
    let port = std::env::var("DRUID_BROKER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8082);
    let connector = Arc::new(HttpBrokerConnector::new(Duration::from_secs(30)).ok()?);
    Some(QueryExecutor::new(
        connector,
        config(&host, port),
        "druid_broker_default",
    ))
}

#[tokio::test]
async fn test_live_select_with_parameter() {
    let Some(executor) = get_live_executor() else {
        eprintln!("Skipping test: DRUID_BROKER_HOST not set");
        return;
    };

    let params = [QueryParameter::Bigint(41)];
    let row = executor
        .fetch_one("SELECT ? + 1 AS answer", Some(&params[..]))
        .await
        .unwrap();

    assert_eq!(row, Some(vec![Value::Int(42)]));
}
