//! The backend adapter contract.
//!
//! Everything that touches a live database goes through [`Adapter`]. Driver
//! crates (oxide-record-sqlite, etc.) implement it; the core stays
//! driver-agnostic.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::dialect::Dialect;
use crate::statement::Statement;
use crate::value::SqlValue;

/// One result row, keyed by column name.
pub type Row = BTreeMap<String, SqlValue>;

/// Errors raised by an adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Error reported by the backend driver.
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A placeholder in the statement has no bound value.
    #[error("no value bound for parameter :{0}")]
    UnboundParameter(String),

    /// Transaction misuse (commit without begin, nested begin, ...).
    #[error("transaction error: {0}")]
    Transaction(String),

    /// A result value could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// IO error while bootstrapping the backend.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdapterError {
    /// Wraps a driver error.
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(error))
    }
}

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecResult {
    /// Number of rows changed.
    pub rows_affected: u64,
    /// Identifier generated by an INSERT, if the backend reports one.
    pub last_insert_id: Option<SqlValue>,
}

/// A backend connection able to run statements and manage one transaction.
///
/// Calls are synchronous: each one blocks until the backend answers.
pub trait Adapter {
    /// Returns the dialect used to render query descriptors.
    fn dialect(&self) -> &dyn Dialect;

    /// Runs a statement and returns its rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the statement.
    fn query(&mut self, statement: &Statement) -> Result<Vec<Row>, AdapterError>;

    /// Runs a statement that does not return rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the statement.
    fn execute(&mut self, statement: &Statement) -> Result<ExecResult, AdapterError>;

    /// Opens a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if a transaction is already open or the backend fails.
    fn begin_transaction(&mut self) -> Result<(), AdapterError>;

    /// Commits the open transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if no transaction is open or the backend fails.
    fn commit(&mut self) -> Result<(), AdapterError>;

    /// Rolls back the open transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if no transaction is open or the backend fails.
    fn roll_back(&mut self) -> Result<(), AdapterError>;

    /// Returns whether a transaction is open.
    fn in_transaction(&self) -> bool;

    /// Returns the identifier generated by the last INSERT.
    fn last_insert_id(&self) -> Option<SqlValue>;

    /// Returns the column names of `table`. An empty list means the adapter
    /// cannot describe the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn table_columns(&mut self, table: &str) -> Result<Vec<String>, AdapterError>;

    /// Resets per-query state so the adapter can be reused by a new builder.
    fn cleanup(&mut self) {}
}
