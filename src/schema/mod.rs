//! Structural descriptions consumed by the schema editor
//!
//! - `table` - table names and the per-call table parameter
//! - `column` - column definitions and relation kinds
//! - `constraint` - named constraints from the engine catalog

pub mod column;
pub mod constraint;
pub mod table;

pub use column::{ColumnDefinition, FieldKind, ForeignKeyTarget, LinkTable};
pub use constraint::{Constraint, ConstraintKind};
pub use table::{IncomingReference, Table, TableName};
