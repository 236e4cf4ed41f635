//! Schema migration for DB2
//!
//! This module provides the schema editor and the pieces it is built from:
//! - `SchemaEditor` for column, constraint and table changes
//! - Constraint catalog reading
//! - Constraint deferral and restoration around renames and retypes
//! - Reorganization of tables left in reorg-pending state
//! - The journal of executed statements
//!
//! # Example
//!
//! ```rust
//! use lifeguard_db2::executor::RecordingExecutor;
//! use lifeguard_db2::migration::SchemaEditor;
//! use lifeguard_db2::schema::{ColumnDefinition, Table, TableName};
//!
//! let executor = RecordingExecutor::new();
//! let mut editor = SchemaEditor::new(&executor);
//! let orders = Table::new(TableName::new("orders"));
//!
//! editor
//!     .add_column(&orders, &ColumnDefinition::new("ref", "CHAR(8)").not_null().unique())
//!     .unwrap();
//!
//! // Undo statements for everything executed, newest first
//! let rollback = editor.journal().rollback_plan();
//! assert_eq!(rollback.len(), 3);
//! ```

pub mod alter_field;
pub mod catalog;
pub mod deferral;
pub mod error;
pub mod journal;
pub mod materialize;
pub mod plan;
pub mod relation;
pub mod reorg;
pub mod schema_editor;

pub use catalog::read_constraints;
pub use deferral::{substitute_column, DeferralOutcome, DeferredConstraint, DeferredConstraintSet, SkippedConstraint};
pub use error::SchemaError;
pub use journal::{Journal, JournalEntry, SchemaWarning};
pub use plan::AlterationPlan;
pub use relation::{LinkTableRebuild, RelationRebuild};
pub use reorg::PENDING_REORG_QUERY;
pub use schema_editor::SchemaEditor;
