//! Table identifiers and the explicit table parameter passed to every operation

use crate::ddl::quote_name;
use std::fmt;

/// Schema-qualified table name
///
/// When `schema` is `None` the connection's current schema applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    pub schema: Option<String>,
    pub name: String,
}

impl TableName {
    /// Unqualified table name
    pub fn new(name: impl Into<String>) -> Self {
        Self { schema: None, name: name.into() }
    }

    /// Schema-qualified table name
    pub fn qualified(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self { schema: Some(schema.into()), name: name.into() }
    }

    /// Quoted form for statement text: `"SCHEMA"."NAME"` or `"NAME"`
    pub fn quoted(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", quote_name(schema), quote_name(&self.name)),
            None => quote_name(&self.name),
        }
    }

    /// Quote another object (index, sequence) living in this table's schema
    pub fn quote_sibling(&self, object: &str) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", quote_name(schema), quote_name(object)),
            None => quote_name(object),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A column in another table holding a foreign key to this table's primary key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingReference {
    pub table: TableName,
    pub column: String,
}

impl IncomingReference {
    pub fn new(table: TableName, column: impl Into<String>) -> Self {
        Self { table, column: column.into() }
    }
}

/// The table an operation applies to
///
/// Supplied by the caller for each call. `incoming` lists every foreign key in
/// other tables that points at this table, which the planner needs when the
/// primary key is retyped or renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: TableName,
    pub incoming: Vec<IncomingReference>,
}

impl Table {
    pub fn new(name: TableName) -> Self {
        Self { name, incoming: Vec::new() }
    }

    /// Add a referencing column from another table
    #[must_use]
    pub fn referenced_by(mut self, table: TableName, column: impl Into<String>) -> Self {
        self.incoming.push(IncomingReference::new(table, column));
        self
    }
}

impl From<TableName> for Table {
    fn from(name: TableName) -> Self {
        Table::new(name)
    }
}
