//! Schema-editor error types

use crate::executor::EngineError;
use crate::schema::{ConstraintKind, TableName};

/// Errors raised while planning or executing a schema change
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Old and new definitions cannot be compared or altered into each other
    #[error("cannot alter {table}.{column}: {reason}")]
    IncompatibleAlteration {
        table: TableName,
        column: String,
        reason: String,
    },
    /// Strict mode expected exactly one matching constraint
    #[error("found {found} {kind} constraint(s) on {table}.{column}, expected {expected}")]
    ConstraintCountMismatch {
        table: TableName,
        column: String,
        kind: ConstraintKind,
        expected: usize,
        found: usize,
    },
    /// Strict mode expected a primary key to drop
    #[error("found no primary key on {table}.{column}")]
    MissingPrimaryKey { table: TableName, column: String },
    /// The engine rejected a generated statement
    #[error("statement failed: {sql}: {source}")]
    StatementExecution {
        sql: String,
        #[source]
        source: EngineError,
    },
    /// Constraint catalog could not be read
    #[error("could not read constraints of {table}: {source}")]
    Catalog {
        table: TableName,
        #[source]
        source: EngineError,
    },
    /// Editor configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl SchemaError {
    /// The statement text, for statement failures
    pub fn sql(&self) -> Option<&str> {
        match self {
            SchemaError::StatementExecution { sql, .. } => Some(sql),
            _ => None,
        }
    }

    /// The underlying engine error, if any
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            SchemaError::StatementExecution { source, .. } | SchemaError::Catalog { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}
