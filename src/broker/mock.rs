//! Mock broker for testing.
//!
//! Returns canned rows (or a canned failure) and counts how many connections
//! and cursors were opened and closed.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{BrokerConnection, BrokerConnector, Close, Cursor, QueryParameter, Row};
use crate::config::ConnectionConfig;
use crate::error::{DruidError, Result};

/// Open/close counters and executed statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockBrokerStats {
    pub connections_opened: usize,
    pub connections_closed: usize,
    pub cursors_opened: usize,
    pub cursors_closed: usize,
    pub executed: Vec<String>,
    pub last_params: Option<Vec<QueryParameter>>,
}

type SharedStats = Arc<Mutex<MockBrokerStats>>;

fn with_stats<R>(stats: &SharedStats, f: impl FnOnce(&mut MockBrokerStats) -> R) -> R {
    f(&mut stats.lock().unwrap_or_else(|e| e.into_inner()))
}

/// A mock broker that answers every query with the same rows or error.
#[derive(Debug, Default)]
pub struct MockBrokerConnector {
    columns: Vec<String>,
    rows: Vec<Row>,
    error: Option<String>,
    stats: SharedStats,
}

impl MockBrokerConnector {
    /// Creates a broker that returns `rows` for every statement.
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    /// Creates a broker whose `execute` always fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    /// Sets the column names reported by cursors.
    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Returns a snapshot of the counters.
    pub fn stats(&self) -> MockBrokerStats {
        with_stats(&self.stats, |s| s.clone())
    }
}

#[async_trait]
impl BrokerConnector for MockBrokerConnector {
    async fn connect(&self, _conn: &ConnectionConfig) -> Result<Box<dyn BrokerConnection>> {
        with_stats(&self.stats, |s| s.connections_opened += 1);
        Ok(Box::new(MockConnection {
            columns: self.columns.clone(),
            rows: self.rows.clone(),
            error: self.error.clone(),
            stats: self.stats.clone(),
        }))
    }
}

struct MockConnection {
    columns: Vec<String>,
    rows: Vec<Row>,
    error: Option<String>,
    stats: SharedStats,
}

impl BrokerConnection for MockConnection {
    fn cursor(&mut self) -> Result<Box<dyn Cursor>> {
        with_stats(&self.stats, |s| s.cursors_opened += 1);
        Ok(Box::new(MockCursor {
            columns: self.columns.clone(),
            source: self.rows.clone(),
            error: self.error.clone(),
            buffered: VecDeque::new(),
            stats: self.stats.clone(),
        }))
    }
}

impl Close for MockConnection {
    fn close(&mut self) {
        with_stats(&self.stats, |s| s.connections_closed += 1);
    }
}

struct MockCursor {
    columns: Vec<String>,
    source: Vec<Row>,
    error: Option<String>,
    buffered: VecDeque<Row>,
    stats: SharedStats,
}

#[async_trait]
impl Cursor for MockCursor {
    async fn execute(&mut self, sql: &str, params: Option<&[QueryParameter]>) -> Result<()> {
        with_stats(&self.stats, |s| {
            s.executed.push(sql.to_string());
            s.last_params = params.map(|p| p.to_vec());
        });

        if let Some(msg) = &self.error {
            return Err(DruidError::query(msg.clone()));
        }

        self.buffered = self.source.iter().cloned().collect();
        Ok(())
    }

    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn fetch_one(&mut self) -> Option<Row> {
        self.buffered.pop_front()
    }

    fn fetch_all(&mut self) -> Vec<Row> {
        self.buffered.drain(..).collect()
    }
}

impl Close for MockCursor {
    fn close(&mut self) {
        with_stats(&self.stats, |s| s.cursors_closed += 1);
    }
}
