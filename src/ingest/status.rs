//! Task identifiers, task status and the job lifecycle states.

use serde::Deserialize;
use std::fmt;

use crate::error::{DruidError, Result};
use crate::transport::HttpResponse;

/// Identifier the overlord assigns to a submitted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extracts the `task` field from a submission response.
    pub fn from_submit_response(response: &HttpResponse) -> Result<Self> {
        #[derive(Deserialize)]
        struct SubmitBody {
            task: Option<String>,
        }

        let body: SubmitBody = response.json()?;
        body.task
            .map(Self)
            .ok_or_else(|| DruidError::malformed("submission response has no 'task' field"))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task status as reported by `GET /{task}/status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Success,
    Failed,
    /// Anything else the overlord reports (e.g. `WAITING`, `PENDING`).
    Unknown(String),
}

impl TaskStatus {
    /// Parses a raw status string. Matching is exact, as the overlord reports upper case.
    pub fn parse(s: &str) -> Self {
        match s {
            "RUNNING" => Self::Running,
            "SUCCESS" => Self::Success,
            "FAILED" => Self::Failed,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Extracts `status.status` from a status response.
    ///
    /// A present but non-string value is reported as [`TaskStatus::Unknown`]
    /// carrying its JSON text.
    pub fn from_status_response(response: &HttpResponse) -> Result<Self> {
        #[derive(Deserialize)]
        struct StatusBody {
            status: Option<serde_json::Map<String, serde_json::Value>>,
        }

        let body: StatusBody = response.json()?;
        match body.status.as_ref().and_then(|inner| inner.get("status")) {
            Some(serde_json::Value::String(s)) => Ok(Self::parse(s)),
            Some(other) => Ok(Self::Unknown(other.to_string())),
            None => Err(DruidError::malformed(
                "status response has no 'status.status' field",
            )),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "RUNNING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Unknown(s) => s,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a single `submit` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Submitting,
    Polling,
    Succeeded,
    Failed,
    TimedOut,
}

impl JobState {
    /// State reached after observing `status` while polling.
    pub fn after_poll(status: &TaskStatus) -> Self {
        match status {
            TaskStatus::Running => Self::Polling,
            TaskStatus::Success => Self::Succeeded,
            TaskStatus::Failed | TaskStatus::Unknown(_) => Self::Failed,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Submitting => "submitting",
            Self::Polling => "polling",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        };
        f.write_str(s)
    }
}
