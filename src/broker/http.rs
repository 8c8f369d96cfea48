//! Druid SQL over HTTP.
//!
//! Queries are POSTed to the broker's SQL endpoint with `resultFormat =
//! array` and `header = true`, so the first array in the response holds the
//! column names and every following array is a row.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

use super::{BrokerConnection, BrokerConnector, Close, Cursor, QueryParameter, Row, Value};
use crate::config::ConnectionConfig;
use crate::error::{DruidError, Result};

/// Opens HTTP "connections" to a broker. Each connection shares the
/// connector's reqwest client and only remembers the SQL endpoint URL.
#[derive(Debug, Clone)]
pub struct HttpBrokerConnector {
    client: Client,
}

impl HttpBrokerConnector {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DruidError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl BrokerConnector for HttpBrokerConnector {
    async fn connect(&self, conn: &ConnectionConfig) -> Result<Box<dyn BrokerConnection>> {
        let url = conn.broker_url()?;
        debug!(broker = %conn.display_string(), %url, "Opened broker connection");
        Ok(Box::new(HttpBrokerConnection {
            client: Some(self.client.clone()),
            url,
        }))
    }
}

struct HttpBrokerConnection {
    client: Option<Client>,
    url: String,
}

impl BrokerConnection for HttpBrokerConnection {
    fn cursor(&mut self) -> Result<Box<dyn Cursor>> {
        let client = self
            .client
            .clone()
            .ok_or_else(|| DruidError::query("Connection is closed"))?;

        Ok(Box::new(HttpCursor {
            client,
            url: self.url.clone(),
            columns: Vec::new(),
            rows: VecDeque::new(),
        }))
    }
}

impl Close for HttpBrokerConnection {
    fn close(&mut self) {
        self.client = None;
    }
}

/// Request body for the SQL endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SqlRequest<'a> {
    query: &'a str,
    result_format: &'static str,
    header: bool,
    #[serde(skip_serializing_if = "no_parameters")]
    parameters: &'a [QueryParameter],
}

fn no_parameters(params: &&[QueryParameter]) -> bool {
    params.is_empty()
}

/// Error body returned by the broker on failed queries.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SqlError {
    error: Option<String>,
    error_message: Option<String>,
}

struct HttpCursor {
    client: Client,
    url: String,
    columns: Vec<String>,
    rows: VecDeque<Row>,
}

impl HttpCursor {
    fn parse_body(body: &str) -> Result<(Vec<String>, VecDeque<Row>)> {
        let mut arrays: VecDeque<Vec<serde_json::Value>> = serde_json::from_str(body)
            .map_err(|e| DruidError::malformed(format!("Failed to parse SQL response: {e}")))?;

        let columns = arrays
            .pop_front()
            .map(|header| {
                header
                    .into_iter()
                    .map(|c| Value::from_json(c).to_display_string())
                    .collect()
            })
            .unwrap_or_default();

        let rows = arrays
            .into_iter()
            .map(|row| row.into_iter().map(Value::from_json).collect())
            .collect();

        Ok((columns, rows))
    }

    fn error_message(status: u16, body: &str) -> String {
        match serde_json::from_str::<SqlError>(body) {
            Ok(SqlError {
                error_message: Some(msg),
                ..
            }) => msg,
            Ok(SqlError { error: Some(e), .. }) => e,
            _ => format!("broker returned HTTP {status}: {body}"),
        }
    }
}

#[async_trait]
impl Cursor for HttpCursor {
    async fn execute(&mut self, sql: &str, params: Option<&[QueryParameter]>) -> Result<()> {
        let request = SqlRequest {
            query: sql,
            result_format: "array",
            header: true,
            parameters: params.unwrap_or(&[]),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DruidError::transport(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DruidError::transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(DruidError::query(Self::error_message(status.as_u16(), &body)));
        }

        let (columns, rows) = Self::parse_body(&body)?;
        debug!(columns = columns.len(), rows = rows.len(), "Query returned");
        self.columns = columns;
        self.rows = rows;
        Ok(())
    }

    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn fetch_one(&mut self) -> Option<Row> {
        self.rows.pop_front()
    }

    fn fetch_all(&mut self) -> Vec<Row> {
        self.rows.drain(..).collect()
    }
}

impl Close for HttpCursor {
    fn close(&mut self) {
        self.rows.clear();
    }
}
