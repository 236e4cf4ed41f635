//! Typed literal values for generated DDL
//!
//! Defaults, identity start values and catalog query parameters all travel as
//! [`Literal`]. The [`format_literal`] function renders a literal in DB2 syntax
//! for embedding directly into statement text.
//!
//! ## Modules
//!
//! - **`literal`** - The `Literal` enum, `From` conversions and row extraction helpers
//! - **`format`** - DB2 literal rendering

pub mod format;
pub mod literal;

pub use format::format_literal;
pub use literal::Literal;
