//! Ingestion task submission and polling.
//!
//! [`IngestionClient::submit`] posts a task spec to the overlord, then polls
//! the task status at a fixed interval until it reaches SUCCESS, FAILED or an
//! unrecognised status. When a poll budget is configured, the task is shut
//! down once the poll counter exceeds it.
//!
//! The budget counts poll iterations, not wall-clock seconds. With an
//! interval of N seconds the task may run up to `max_ingestion_secs * N`
//! seconds before being shut down.

mod status;

pub use status::{JobState, TaskId, TaskStatus};

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::{ClientConfig, ConnectionResolver};
use crate::error::{DruidError, Result};
use crate::transport::Transport;

/// Caller-supplied ingestion task spec, passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionSpec(serde_json::Value);

impl IngestionSpec {
    /// Wraps an already-parsed JSON spec.
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Parses a spec from JSON text.
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map(Self)
            .map_err(|e| DruidError::InvalidSpec(e.to_string()))
    }

    /// Reads and parses a spec file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DruidError::InvalidSpec(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Polling behaviour for one `submit` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Sleep between status polls.
    pub interval: Duration,
    /// Poll budget; `None` polls until a terminal status.
    pub max_ingestion_secs: Option<u64>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_ingestion_secs: None,
        }
    }
}

impl PollConfig {
    /// Sets the interval between polls.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the poll budget. A budget of 0 means unbounded.
    pub fn with_max_ingestion_secs(mut self, max_secs: u64) -> Self {
        self.max_ingestion_secs = budget(Some(max_secs));
        self
    }
}

fn budget(max_secs: Option<u64>) -> Option<u64> {
    max_secs.filter(|&secs| secs > 0)
}

impl From<&ClientConfig> for PollConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.poll_interval_secs),
            max_ingestion_secs: budget(config.max_ingestion_secs),
        }
    }
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub task_id: TaskId,
    /// Number of status polls issued, including the one that saw SUCCESS.
    pub polls: u64,
    /// Wall-clock time spent polling.
    pub elapsed: Duration,
}

/// Client for the overlord task API.
///
/// Holds no per-call state, so one instance can serve sequential calls or be
/// shared between tasks that each track their own job.
pub struct IngestionClient {
    transport: Arc<dyn Transport>,
    resolver: Arc<dyn ConnectionResolver>,
    connection_name: String,
    poll: PollConfig,
}

impl IngestionClient {
    /// Creates a client that resolves `connection_name` on every call.
    pub fn new(
        transport: Arc<dyn Transport>,
        resolver: Arc<dyn ConnectionResolver>,
        connection_name: impl Into<String>,
        poll: PollConfig,
    ) -> Self {
        Self {
            transport,
            resolver,
            connection_name: connection_name.into(),
            poll,
        }
    }

    /// Returns the polling configuration.
    pub fn poll_config(&self) -> PollConfig {
        self.poll
    }

    /// Returns the overlord task URL for the configured connection.
    pub fn ingest_url(&self) -> Result<String> {
        self.resolver.resolve(&self.connection_name)?.ingest_url()
    }

    /// Submits `spec` and blocks until the task finishes, fails or times out.
    pub async fn submit(&self, spec: &IngestionSpec) -> Result<IngestReport> {
        let url = self.ingest_url()?;
        debug!(state = %JobState::Submitting, %url, "Submitting ingestion task");

        let response = self.transport.post(&url, Some(spec.as_json())).await?;
        if !response.is_ok() {
            warn!(status = response.status, body = %response.body, "Overlord rejected task");
            return Err(DruidError::SubmissionRejected { url });
        }

        let task_id = TaskId::from_submit_response(&response)?;
        info!(%task_id, state = %JobState::Polling, "Ingestion task submitted");

        let started = Instant::now();
        let mut elapsed: u64 = 0;

        loop {
            let status_response = self.transport.get(&status_url(&url, &task_id)).await?;

            info!(%task_id, "Job still running for {} seconds...", elapsed);

            elapsed += 1;

            if let Some(max_secs) = self.poll.max_ingestion_secs {
                if elapsed > max_secs {
                    self.shutdown_best_effort(&url, &task_id).await;
                    warn!(
                        %task_id,
                        state = %JobState::TimedOut,
                        max_secs,
                        "Ingestion exceeded its budget"
                    );
                    return Err(DruidError::IngestionTimeout { max_secs });
                }
            }

            tokio::time::sleep(self.poll.interval).await;

            let status = TaskStatus::from_status_response(&status_response)?;
            let state = JobState::after_poll(&status);
            debug!(%task_id, %status, %state, "Polled task status");

            match status {
                TaskStatus::Running => continue,
                TaskStatus::Success => break,
                TaskStatus::Failed => {
                    return Err(DruidError::IngestionFailed {
                        task_id: task_id.to_string(),
                    })
                }
                TaskStatus::Unknown(other) => return Err(DruidError::UnknownStatus(other)),
            }
        }

        let elapsed_time = started.elapsed();
        info!(
            %task_id,
            polls = elapsed,
            elapsed_ms = elapsed_time.as_millis() as u64,
            "Successful index"
        );

        Ok(IngestReport {
            task_id,
            polls: elapsed,
            elapsed: elapsed_time,
        })
    }

    /// Fetches the current status of a task once.
    pub async fn task_status(&self, task_id: &TaskId) -> Result<TaskStatus> {
        let url = self.ingest_url()?;
        let response = self.transport.get(&status_url(&url, task_id)).await?;
        TaskStatus::from_status_response(&response)
    }

    /// Asks the overlord to shut down a task.
    pub async fn shutdown(&self, task_id: &TaskId) -> Result<()> {
        let url = self.ingest_url()?;
        let response = self.transport.post(&shutdown_url(&url, task_id), None).await?;
        if !response.is_ok() {
            return Err(DruidError::transport(format!(
                "Shutdown of task {} returned HTTP {}",
                task_id, response.status
            )));
        }
        info!(%task_id, "Shutdown requested");
        Ok(())
    }

    /// Sends the shutdown request without letting its outcome change the caller's error.
    async fn shutdown_best_effort(&self, url: &str, task_id: &TaskId) {
        match self.transport.post(&shutdown_url(url, task_id), None).await {
            Ok(resp) if resp.is_ok() => info!(%task_id, "Shutdown requested"),
            Ok(resp) => warn!(%task_id, status = resp.status, "Shutdown request not accepted"),
            Err(e) => warn!(%task_id, error = %e, "Shutdown request failed"),
        }
    }
}

fn status_url(base: &str, task_id: &TaskId) -> String {
    format!("{}/{}/status", base.trim_end_matches('/'), task_id)
}

fn shutdown_url(base: &str, task_id: &TaskId) -> String {
    format!("{}/{}/shutdown", base.trim_end_matches('/'), task_id)
}
