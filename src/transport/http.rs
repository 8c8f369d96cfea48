//! reqwest-backed transport.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::error::{DruidError, Result};
use crate::transport::{HttpResponse, Method, Transport};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// JSON-over-HTTP transport using a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with the default request timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a transport with the given request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DruidError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn send(
        &self,
        method: Method,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<HttpResponse> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DruidError::transport(format!("{} {} timed out", method.as_str(), url))
            } else if e.is_connect() {
                DruidError::transport(format!("Failed to connect to {}: {}", url, e))
            } else {
                DruidError::transport(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| DruidError::transport(format!("Failed to read response: {}", e)))?;

        debug!(method = method.as_str(), %url, status, "HTTP response");

        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &str, body: Option<&serde_json::Value>) -> Result<HttpResponse> {
        let mut request = self.client.post(url);
        if let Some(body) = body {
            // .json() sets content-type: application/json
            request = request.json(body);
        }
        self.send(Method::Post, request, url).await
    }

    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.send(Method::Get, self.client.get(url), url).await
    }
}
