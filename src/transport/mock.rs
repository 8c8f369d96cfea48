//! Scripted transport for testing.
//!
//! Responses are queued per (method, url). The last queued response for a
//! route is repeated once the queue is down to one entry, so a single
//! `RUNNING` reply can drive an arbitrarily long poll loop.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::{DruidError, Result};
use crate::transport::{HttpResponse, Method, Transport};

type Reply = std::result::Result<HttpResponse, String>;

/// A request observed by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<serde_json::Value>,
}

/// Mock transport that returns canned responses and records every request.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    /// Creates a mock with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for `POST url`.
    pub fn on_post(self, url: impl Into<String>, response: HttpResponse) -> Self {
        self.push(Method::Post, url.into(), Ok(response))
    }

    /// Queues a response for `GET url`.
    pub fn on_get(self, url: impl Into<String>, response: HttpResponse) -> Self {
        self.push(Method::Get, url.into(), Ok(response))
    }

    /// Queues a network failure for the route.
    pub fn fail(self, method: Method, url: impl Into<String>, msg: impl Into<String>) -> Self {
        self.push(method, url.into(), Err(msg.into()))
    }

    fn push(self, method: Method, url: String, reply: Reply) -> Self {
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry((method, url))
            .or_default()
            .push_back(reply);
        self
    }

    /// Returns every request seen so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Counts requests matching method and url.
    pub fn count(&self, method: Method, url: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }

    fn respond(&self, method: Method, url: &str, body: Option<&serde_json::Value>) -> Result<HttpResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedRequest {
                method,
                url: url.to_string(),
                body: body.cloned(),
            });

        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        let reply = match routes.get_mut(&(method, url.to_string())) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        match reply {
            Some(Ok(response)) => Ok(response),
            Some(Err(msg)) => Err(DruidError::transport(msg)),
            None => Ok(HttpResponse::new(404, format!("no route for {} {}", method.as_str(), url))),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(&self, url: &str, body: Option<&serde_json::Value>) -> Result<HttpResponse> {
        self.respond(Method::Post, url, body)
    }

    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.respond(Method::Get, url, None)
    }
}
