//! Column definition metadata.
//!
//! `ColumnDefinition` is an immutable snapshot of a column's type, nullability,
//! default and constraints. The alteration planner compares an "old" and a
//! "new" snapshot to decide which statements to emit.

use super::TableName;
use crate::ddl::identity_clause;
use crate::value::{format_literal, Literal};

/// Target of a foreign key column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyTarget {
    pub table: TableName,
    pub column: String,
}

/// Auxiliary join table behind a many-to-many relation
#[derive(Debug, Clone, PartialEq)]
pub struct LinkTable {
    pub table: TableName,
    /// Column pointing back at the owning table
    pub source: ColumnDefinition,
    /// Column pointing at the far side of the relation
    pub reverse: ColumnDefinition,
    /// Whether the join table is managed implicitly rather than declared by the user
    pub auto_created: bool,
}

/// What sort of column a definition describes
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldKind {
    /// Plain value column
    #[default]
    Scalar,
    /// Column holding a foreign key
    ForeignKey(ForeignKeyTarget),
    /// Relation materialised as a join table; no physical column
    ManyToMany(Box<LinkTable>),
}

/// Column definition metadata
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,
    /// Engine storage type (e.g. `INTEGER`, `VARCHAR(100)`, `CLOB`)
    pub storage_type: Option<String>,
    /// Whether the column is nullable
    pub nullable: bool,
    /// Whether the column is the table's primary key
    pub primary_key: bool,
    /// Whether the column carries a single-column unique constraint
    pub unique: bool,
    /// Whether the column carries a single-column index
    pub indexed: bool,
    /// Check expression, if the column has a check constraint
    pub check: Option<String>,
    /// Default value (if any)
    pub default: Option<Literal>,
    /// Whether the column is an identity column
    pub auto_increment: bool,
    /// Relation kind, resolved when the definition is built
    pub kind: FieldKind,
}

const INTEGER_TYPES: &[&str] = &["SMALLINT", "INTEGER", "INT", "BIGINT"];
const LARGE_TEXT_TYPES: &[&str] = &["CLOB", "DBCLOB", "NCLOB", "LONG VARCHAR", "LONG VARGRAPHIC"];

impl ColumnDefinition {
    /// Nullable scalar column of the given storage type
    pub fn new(name: impl Into<String>, storage_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage_type: Some(storage_type.into()),
            nullable: true,
            ..Default::default()
        }
    }

    /// Many-to-many relation backed by a link table
    pub fn many_to_many(name: impl Into<String>, link: LinkTable) -> Self {
        Self {
            name: name.into(),
            storage_type: None,
            nullable: true,
            kind: FieldKind::ManyToMany(Box::new(link)),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    #[must_use]
    pub fn null(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark as primary key (implies NOT NULL)
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    #[must_use]
    pub fn check(mut self, expression: impl Into<String>) -> Self {
        self.check = Some(expression.into());
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Literal>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Mark as identity column (implies NOT NULL)
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self.nullable = false;
        self
    }

    #[must_use]
    pub fn references(mut self, table: TableName, column: impl Into<String>) -> Self {
        self.kind = FieldKind::ForeignKey(ForeignKeyTarget { table, column: column.into() });
        self
    }

    /// Copy of this definition under a different column name
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        let mut c = self.clone();
        c.name = name.into();
        c
    }

    /// Copy of this definition with a different storage type
    #[must_use]
    pub fn retyped(&self, storage_type: impl Into<String>) -> Self {
        let mut c = self.clone();
        c.storage_type = Some(storage_type.into());
        c
    }

    /// Storage type, or `None` when no physical column backs the definition
    pub fn resolved_type(&self) -> Option<&str> {
        match self.kind {
            FieldKind::ManyToMany(_) => None,
            _ => self.storage_type.as_deref(),
        }
    }

    /// Storage type a foreign key column pointing at this column must carry
    pub fn referenced_type(&self) -> Option<&str> {
        self.resolved_type()
    }

    pub fn has_check(&self) -> bool {
        self.check.is_some()
    }

    pub fn foreign_key(&self) -> Option<&ForeignKeyTarget> {
        match &self.kind {
            FieldKind::ForeignKey(target) => Some(target),
            _ => None,
        }
    }

    pub fn link_table(&self) -> Option<&LinkTable> {
        match &self.kind {
            FieldKind::ManyToMany(link) => Some(link),
            _ => None,
        }
    }

    /// Whether this is a relation through an implicitly managed join table
    pub fn is_auto_created_link(&self) -> bool {
        self.link_table().is_some_and(|link| link.auto_created)
    }

    /// Whether the storage type is an integer type (identity columns included)
    pub fn is_integer(&self) -> bool {
        self.base_type().is_some_and(|t| INTEGER_TYPES.contains(&t.as_str()))
    }

    /// Whether the storage type is a large text type DB2 cannot retype in place
    pub fn is_large_text(&self) -> bool {
        self.base_type().is_some_and(|t| LARGE_TEXT_TYPES.contains(&t.as_str()))
    }

    /// Column definition text for `ADD COLUMN`, always without NOT NULL
    ///
    /// Returns `None` for definitions with no physical column.
    pub fn render_definition(&self, identity_cache: u32) -> Option<String> {
        let storage_type = self.resolved_type()?;
        let mut sql = storage_type.to_string();
        if self.auto_increment {
            sql.push(' ');
            sql.push_str(&identity_clause(1, identity_cache));
        } else if let Some(default) = self.default.as_ref().filter(|d| !d.is_null()) {
            sql.push_str(" DEFAULT ");
            sql.push_str(&format_literal(default));
        }
        Some(sql)
    }

    // Uppercased type name without length/precision, e.g. `VARCHAR(10)` -> `VARCHAR`
    fn base_type(&self) -> Option<String> {
        let t = self.resolved_type()?;
        let base = t.split('(').next().unwrap_or(t);
        Some(base.trim().to_uppercase())
    }
}
