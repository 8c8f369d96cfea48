//! SQL queries against the Druid broker.
//!
//! A [`BrokerConnector`] opens connections, a connection hands out cursors,
//! and a cursor executes one statement and buffers its rows.
//! [`QueryExecutor`] wraps both in [`Closing`] guards so they are closed on
//! every exit path, including a failed `execute`.

mod http;
mod mock;
mod types;

pub use http::HttpBrokerConnector;
pub use mock::{MockBrokerConnector, MockBrokerStats};
pub use types::{QueryParameter, Row, Value};

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::{ConnectionConfig, ConnectionResolver};
use crate::error::Result;

/// Something that must be released when it goes out of scope.
pub trait Close {
    fn close(&mut self);
}

impl<T: Close + ?Sized> Close for Box<T> {
    fn close(&mut self) {
        (**self).close()
    }
}

/// Calls [`Close::close`] when dropped.
pub struct Closing<T: Close> {
    inner: T,
}

impl<T: Close> Closing<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T: Close> Deref for Closing<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: Close> DerefMut for Closing<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T: Close> Drop for Closing<T> {
    fn drop(&mut self) {
        self.inner.close();
    }
}

/// Opens connections to a broker.
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    async fn connect(&self, conn: &ConnectionConfig) -> Result<Box<dyn BrokerConnection>>;
}

/// An open broker connection.
pub trait BrokerConnection: Close + Send {
    /// Opens a cursor on this connection.
    fn cursor(&mut self) -> Result<Box<dyn Cursor>>;
}

/// Executes a statement and yields its rows.
#[async_trait]
pub trait Cursor: Close + Send {
    /// Runs `sql`, binding `params` positionally when given.
    async fn execute(&mut self, sql: &str, params: Option<&[QueryParameter]>) -> Result<()>;

    /// Column names of the last executed statement.
    fn columns(&self) -> &[String];

    /// Takes the next buffered row.
    fn fetch_one(&mut self) -> Option<Row>;

    /// Takes all remaining buffered rows.
    fn fetch_all(&mut self) -> Vec<Row>;
}

/// Runs SQL against the configured broker connection.
pub struct QueryExecutor {
    connector: Arc<dyn BrokerConnector>,
    resolver: Arc<dyn ConnectionResolver>,
    connection_name: String,
}

impl QueryExecutor {
    /// Creates an executor that resolves `connection_name` on every query.
    pub fn new(
        connector: Arc<dyn BrokerConnector>,
        resolver: Arc<dyn ConnectionResolver>,
        connection_name: impl Into<String>,
    ) -> Self {
        Self {
            connector,
            resolver,
            connection_name: connection_name.into(),
        }
    }

    /// Executes `sql` and returns the first row, if any.
    pub async fn fetch_one(
        &self,
        sql: &str,
        params: Option<&[QueryParameter]>,
    ) -> Result<Option<Row>> {
        let conn_config = self.resolver.resolve(&self.connection_name)?;
        let mut conn = Closing::new(self.connector.connect(&conn_config).await?);
        let mut cursor = Closing::new(conn.cursor()?);

        debug!(connection = %self.connection_name, %sql, "fetch_one");
        cursor.execute(sql, params).await?;
        Ok(cursor.fetch_one())
    }

    /// Executes `sql` and returns every row.
    pub async fn fetch_all(
        &self,
        sql: &str,
        params: Option<&[QueryParameter]>,
    ) -> Result<Vec<Row>> {
        let conn_config = self.resolver.resolve(&self.connection_name)?;
        let mut conn = Closing::new(self.connector.connect(&conn_config).await?);
        let mut cursor = Closing::new(conn.cursor()?);

        debug!(connection = %self.connection_name, %sql, "fetch_all");
        cursor.execute(sql, params).await?;
        Ok(cursor.fetch_all())
    }

    /// Executes `sql` and returns every row together with the column names.
    pub async fn fetch_table(
        &self,
        sql: &str,
        params: Option<&[QueryParameter]>,
    ) -> Result<QueryTable> {
        let conn_config = self.resolver.resolve(&self.connection_name)?;
        let mut conn = Closing::new(self.connector.connect(&conn_config).await?);
        let mut cursor = Closing::new(conn.cursor()?);

        debug!(connection = %self.connection_name, %sql, "fetch_table");
        cursor.execute(sql, params).await?;
        Ok(QueryTable {
            columns: cursor.columns().to_vec(),
            rows: cursor.fetch_all(),
        })
    }
}

/// Column names plus rows of a query result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}
