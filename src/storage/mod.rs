// Storage module
// Capability interface over the SQL-capable vector store, plus the shipped
// SQLite implementation.

pub mod sqlite;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::Result;

pub use sqlite::SqliteEngine;

/// A result row as a mapping from column name to decoded value.
pub type RawRow = HashMap<String, serde_json::Value>;

/// A parameter bound to a query. Vectors travel as JSON text so the store's
/// native vector functions can consume them without string interpolation.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// A fully-specified, parameterized SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl BoundQuery {
    #[inline]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn bind(mut self, value: SqlValue) -> Self {
        self.params.push(value);
        self
    }
}

/// Contract for the storage collaborator. Implementations own all durable
/// state; the search and lifecycle layers only hold query-scoped data.
///
/// Every method suspends the caller for the duration of the underlying I/O;
/// implementations must not block the async executor.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Execute a read query and fetch the full result set.
    async fn fetch_all(&self, query: BoundQuery) -> Result<Vec<RawRow>>;

    /// Execute a single write statement, returning the affected row count.
    async fn execute(&self, query: BoundQuery) -> Result<u64>;

    /// Execute several write statements as one transaction. Either all of
    /// them commit or none do. Returns the affected row count per statement.
    async fn execute_transactional(&self, queries: Vec<BoundQuery>) -> Result<Vec<u64>>;
}
