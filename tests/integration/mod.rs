//! Integration tests for druid-client.

pub mod config_test;
pub mod ingest_test;
pub mod query_test;
