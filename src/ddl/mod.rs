//! Statement templates and identifier helpers
//!
//! - `statement` - the [`Ddl`] enum, one variant per primitive operation
//! - `names` - quoting, truncation and generated constraint names

pub mod names;
pub mod statement;

pub use names::{constraint_name, quote_name, truncate_name};
pub use statement::{identity_clause, Ddl};
