//! Configuration management for the Druid client.
//!
//! Handles loading configuration from TOML files and environment variables,
//! with support for named overlord/broker connections and polling settings.

use crate::error::{DruidError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Default connection name for the overlord (indexing service).
pub const DEFAULT_INGEST_CONNECTION: &str = "druid_ingest_default";

/// Default connection name for the broker.
pub const DEFAULT_BROKER_CONNECTION: &str = "druid_broker_default";

/// Default SQL endpoint on the broker.
pub const DEFAULT_BROKER_ENDPOINT: &str = "/druid/v2/sql";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Client behaviour (connection names, polling).
    #[serde(default)]
    pub client: ClientConfig,

    /// Named Druid connections.
    #[serde(default)]
    pub connections: HashMap<String, ConnectionConfig>,
}

/// Client behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Connection used for task submission and status polling.
    #[serde(default = "default_ingest_connection")]
    pub ingest_connection: String,

    /// Connection used for SQL queries.
    #[serde(default = "default_broker_connection")]
    pub broker_connection: String,

    /// Seconds to sleep between status polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Poll budget before the task is shut down. Unset or 0 means unbounded.
    #[serde(default)]
    pub max_ingestion_secs: Option<u64>,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_ingest_connection() -> String {
    DEFAULT_INGEST_CONNECTION.to_string()
}

fn default_broker_connection() -> String {
    DEFAULT_BROKER_CONNECTION.to_string()
}

fn default_poll_interval() -> u64 {
    1
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ingest_connection: default_ingest_connection(),
            broker_connection: default_broker_connection(),
            poll_interval_secs: default_poll_interval(),
            max_ingestion_secs: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ClientConfig {
    /// Applies `DRUID_POLL_INTERVAL_SECS` and `DRUID_MAX_INGESTION_SECS` on top of file values.
    pub fn apply_env_overrides(&mut self) {
        if let Some(secs) = env_u64("DRUID_POLL_INTERVAL_SECS") {
            self.poll_interval_secs = secs;
        }
        if let Some(secs) = env_u64("DRUID_MAX_INGESTION_SECS") {
            self.max_ingestion_secs = Some(secs);
        }
    }

    /// Returns the HTTP request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_u64(key: &str) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring non-numeric override");
            None
        }
    }
}

/// A single Druid connection (overlord or broker).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Host name.
    pub host: String,

    /// Port.
    pub port: u16,

    /// URL scheme, `http` when unset.
    #[serde(default, alias = "schema")]
    pub scheme: Option<String>,

    /// Path on the host. Overlord default is empty, broker default is `/druid/v2/sql`.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl ConnectionConfig {
    /// Creates a connection with the default scheme and no endpoint.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            scheme: None,
            endpoint: None,
        }
    }

    /// Sets the URL scheme.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Sets the endpoint path.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Returns the scheme, defaulting to `http`.
    pub fn scheme(&self) -> &str {
        self.scheme.as_deref().unwrap_or("http")
    }

    /// Builds `scheme://host:port/endpoint` for the overlord task API.
    ///
    /// An unset endpoint yields a trailing slash, matching what the overlord
    /// accepts when the connection points straight at the task resource.
    pub fn ingest_url(&self) -> Result<String> {
        let endpoint = self.endpoint.as_deref().unwrap_or("");
        let url = format!(
            "{}://{}:{}/{}",
            self.scheme(),
            self.host,
            self.port,
            endpoint.trim_start_matches('/')
        );
        validate_url(&url)?;
        Ok(url)
    }

    /// Builds `scheme://host:port/path` for the broker SQL API.
    pub fn broker_url(&self) -> Result<String> {
        let path = self.endpoint.as_deref().unwrap_or(DEFAULT_BROKER_ENDPOINT);
        let url = format!(
            "{}://{}:{}/{}",
            self.scheme(),
            self.host,
            self.port,
            path.trim_start_matches('/')
        );
        validate_url(&url)?;
        Ok(url)
    }

    /// Returns a short display string for logs.
    pub fn display_string(&self) -> String {
        format!("{}://{}:{}", self.scheme(), self.host, self.port)
    }
}

fn validate_url(url: &str) -> Result<()> {
    Url::parse(url)
        .map(|_| ())
        .map_err(|e| DruidError::config(format!("Invalid connection URL '{url}': {e}")))
}

/// Resolves a logical connection name to its host, port, scheme and endpoint.
pub trait ConnectionResolver: Send + Sync {
    /// Looks up the connection registered under `name`.
    fn resolve(&self, name: &str) -> Result<ConnectionConfig>;
}

impl ConnectionResolver for Config {
    fn resolve(&self, name: &str) -> Result<ConnectionConfig> {
        self.get_connection(name)
            .cloned()
            .ok_or_else(|| DruidError::config(format!("Connection '{name}' not found")))
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("druid-client")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| DruidError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            DruidError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Registers a connection under `name`, replacing any existing entry.
    pub fn with_connection(mut self, name: impl Into<String>, conn: ConnectionConfig) -> Self {
        self.connections.insert(name.into(), conn);
        self
    }

    /// Gets a named connection.
    pub fn get_connection(&self, name: &str) -> Option<&ConnectionConfig> {
        self.connections.get(name)
    }
}
