//! # Lifeguard DB2
//!
//! Schema editor for DB2: plans and executes column alterations, constraint
//! changes and many-to-many link tables as a sequence of DB2 statements.
//!
//! The editor runs over any [`SchemaExecutor`]. [`RecordingExecutor`] records
//! statements instead of running them, for dry runs and tests.

pub mod config;
pub mod ddl;
pub mod executor;
pub mod metrics;
pub mod migration;
pub mod schema;
pub mod value;

pub use config::EditorConfig;
pub use executor::{EngineError, RecordingExecutor, Row, SchemaExecutor};
pub use migration::{SchemaEditor, SchemaError};
pub use schema::{ColumnDefinition, Table, TableName};
pub use value::{format_literal, Literal};
