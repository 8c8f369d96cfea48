//! druid-client - submit Druid ingestion tasks, wait for them, and query the broker.
//!
//! The library exposes the ingestion engine, the broker query executor and
//! their collaborators so they can be embedded in schedulers and tested.

pub mod broker;
pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod transport;

pub use broker::{QueryExecutor, QueryParameter, Row, Value};
pub use config::{Config, ConnectionConfig, ConnectionResolver};
pub use error::{DruidError, Result};
pub use ingest::{IngestReport, IngestionClient, IngestionSpec, PollConfig, TaskId, TaskStatus};
pub use transport::{HttpTransport, Transport};
