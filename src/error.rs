//! Error types for the Druid client.
//!
//! Every failure aborts the current call; nothing here is retried internally.
//! The caller decides whether to resubmit.

use thiserror::Error;

/// Main error type for Druid client operations.
#[derive(Error, Debug)]
pub enum DruidError {
    /// The overlord answered the task submission with a non-200 status.
    #[error("Did not get 200 when submitting the Druid job to {url}")]
    SubmissionRejected { url: String },

    /// The caller-supplied ingestion spec is not valid JSON.
    #[error("Invalid ingestion spec: {0}")]
    InvalidSpec(String),

    /// The service answered with a body that lacks a required field.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The poll counter exceeded the configured ingestion budget.
    #[error("Druid ingestion took more than {max_secs} seconds")]
    IngestionTimeout { max_secs: u64 },

    /// The overlord reported the task as FAILED.
    #[error("Druid indexing job {task_id} failed, check console for more info")]
    IngestionFailed { task_id: String },

    /// The overlord reported a status outside RUNNING/SUCCESS/FAILED.
    #[error("Could not get status of the job, got {0}")]
    UnknownStatus(String),

    /// Network or HTTP client failures.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Broker query failures (bad SQL, broker-side errors).
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration errors (unknown connection, invalid config file, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DruidError {
    /// Creates a malformed-response error with the given message.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Creates a transport error with the given message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::SubmissionRejected { .. } => "Submission Rejected",
            Self::InvalidSpec(_) => "Invalid Spec",
            Self::MalformedResponse(_) => "Malformed Response",
            Self::IngestionTimeout { .. } => "Ingestion Timeout",
            Self::IngestionFailed { .. } => "Ingestion Failed",
            Self::UnknownStatus(_) => "Unknown Status",
            Self::Transport(_) => "Transport Error",
            Self::Query(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
        }
    }
}

/// Result type alias using DruidError.
pub type Result<T> = std::result::Result<T, DruidError>;
