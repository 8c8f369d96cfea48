//! HTTP transport abstraction.
//!
//! The ingestion engine talks to the overlord only through [`Transport`], so
//! the real reqwest client and the scripted test double are interchangeable.

mod http;
mod mock;

pub use http::HttpTransport;
pub use mock::{MockTransport, RecordedRequest};

use crate::error::{DruidError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// HTTP method of a request issued through a [`Transport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Status code and raw body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Creates a response with the given status and body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Creates a 200 response carrying `value` serialized as JSON.
    pub fn ok_json(value: serde_json::Value) -> Self {
        Self::new(200, value.to_string())
    }

    /// Returns true for exactly 200 OK.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            DruidError::malformed(format!("Failed to parse response body as JSON: {e}"))
        })
    }
}

/// Performs JSON-over-HTTP requests.
///
/// Implementations must be thread-safe (Send + Sync) so one engine can be
/// shared between tasks.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a POST with an optional JSON body.
    async fn post(&self, url: &str, body: Option<&serde_json::Value>) -> Result<HttpResponse>;

    /// Sends a GET.
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}
