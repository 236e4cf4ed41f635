//! `SchemaExecutor` - the engine connection seen by the schema editor
//!
//! The editor never opens connections itself. Callers hand it anything that
//! implements [`SchemaExecutor`]: a wrapper around their DB2 driver, a
//! transaction, or the [`RecordingExecutor`] for dry runs and tests.

use crate::migration::catalog;
use crate::schema::{Constraint, TableName};
use crate::value::Literal;

pub mod recording;

pub use recording::RecordingExecutor;

/// Engine-side error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// The engine rejected the statement
    #[error("statement rejected{}: {message}", sqlstate_suffix(.sqlstate))]
    Rejected {
        sqlstate: Option<String>,
        message: String,
    },
    /// The connection failed or was closed
    #[error("connection error: {0}")]
    Connection(String),
    /// A result row could not be decoded
    #[error("decode error: {0}")]
    Decode(String),
}

fn sqlstate_suffix(sqlstate: &Option<String>) -> String {
    sqlstate.as_ref().map(|s| format!(" (SQLSTATE {})", s)).unwrap_or_default()
}

/// A result row from an introspection query
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<Literal>,
}

impl Row {
    pub fn new(values: Vec<Literal>) -> Self {
        Self { values }
    }

    pub fn get(&self, idx: usize) -> Option<&Literal> {
        self.values.get(idx)
    }

    /// Text value at `idx`, with the trailing blanks of fixed-width catalog columns removed
    pub fn get_str(&self, idx: usize) -> Option<&str> {
        self.get(idx).and_then(Literal::as_str).map(str::trim_end)
    }

    pub fn get_i64(&self, idx: usize) -> Option<i64> {
        self.get(idx).and_then(Literal::as_i64)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<Literal>> for Row {
    fn from(values: Vec<Literal>) -> Self {
        Row::new(values)
    }
}

/// Trait for executing statements against the engine
///
/// Statements are blocking round trips. Parameters use `?` markers.
///
/// # Examples
///
/// ```
/// use lifeguard_db2::executor::{RecordingExecutor, SchemaExecutor};
///
/// let executor = RecordingExecutor::new();
/// executor.execute("ALTER TABLE \"t\" DROP COLUMN \"c\"", &[]).unwrap();
/// assert_eq!(executor.statements().len(), 1);
/// ```
pub trait SchemaExecutor {
    /// Execute a statement and return the number of rows affected
    ///
    /// # Errors
    ///
    /// Returns `EngineError` if the engine rejects the statement.
    fn execute(&self, sql: &str, params: &[Literal]) -> Result<u64, EngineError>;

    /// Execute a query and return all rows
    ///
    /// # Errors
    ///
    /// Returns `EngineError` if the query fails.
    fn query_all(&self, sql: &str, params: &[Literal]) -> Result<Vec<Row>, EngineError>;

    /// Full constraint catalog of a table
    ///
    /// The default implementation reads the DB2 `SYSCAT` views through
    /// [`query_all`](SchemaExecutor::query_all).
    ///
    /// # Errors
    ///
    /// Returns `EngineError` if a catalog query fails.
    fn constraints(&self, table: &TableName) -> Result<Vec<Constraint>, EngineError> {
        catalog::read_constraints(self, table)
    }
}

impl<E: SchemaExecutor + ?Sized> SchemaExecutor for &E {
    fn execute(&self, sql: &str, params: &[Literal]) -> Result<u64, EngineError> {
        (**self).execute(sql, params)
    }

    fn query_all(&self, sql: &str, params: &[Literal]) -> Result<Vec<Row>, EngineError> {
        (**self).query_all(sql, params)
    }

    fn constraints(&self, table: &TableName) -> Result<Vec<Constraint>, EngineError> {
        (**self).constraints(table)
    }
}
