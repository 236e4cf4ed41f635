//! Named constraints as reported by the engine catalog

use super::TableName;
use std::fmt;

/// Kind of a named constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    Index,
    Check,
    ForeignKey,
}

impl ConstraintKind {
    /// Map a `SYSCAT.TABCONST.TYPE` code
    pub fn from_catalog_code(code: &str) -> Option<Self> {
        match code.trim() {
            "P" => Some(ConstraintKind::PrimaryKey),
            "U" => Some(ConstraintKind::Unique),
            "F" => Some(ConstraintKind::ForeignKey),
            "K" => Some(ConstraintKind::Check),
            _ => None,
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConstraintKind::PrimaryKey => "primary key",
            ConstraintKind::Unique => "unique",
            ConstraintKind::Index => "index",
            ConstraintKind::Check => "check",
            ConstraintKind::ForeignKey => "foreign key",
        };
        f.write_str(label)
    }
}

/// A named constraint or index on a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
    /// Participating columns, in key order
    pub columns: Vec<String>,
    /// Check expression text, for check constraints
    pub check: Option<String>,
    /// Referenced table, for foreign keys
    pub references: Option<TableName>,
}

impl Constraint {
    pub fn new(name: impl Into<String>, kind: ConstraintKind, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            check: None,
            references: None,
        }
    }

    pub fn primary_key(name: impl Into<String>, columns: &[&str]) -> Self {
        Self::new(name, ConstraintKind::PrimaryKey, columns)
    }

    pub fn unique(name: impl Into<String>, columns: &[&str]) -> Self {
        Self::new(name, ConstraintKind::Unique, columns)
    }

    pub fn index(name: impl Into<String>, columns: &[&str]) -> Self {
        Self::new(name, ConstraintKind::Index, columns)
    }

    pub fn check(name: impl Into<String>, columns: &[&str], expression: impl Into<String>) -> Self {
        let mut c = Self::new(name, ConstraintKind::Check, columns);
        c.check = Some(expression.into());
        c
    }

    pub fn foreign_key(name: impl Into<String>, columns: &[&str], references: TableName) -> Self {
        let mut c = Self::new(name, ConstraintKind::ForeignKey, columns);
        c.references = Some(references);
        c
    }

    /// Whether `column` participates in this constraint
    pub fn covers(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Whether the column list is exactly `columns`
    pub fn matches_columns(&self, columns: &[&str]) -> bool {
        self.columns.len() == columns.len() && self.columns.iter().zip(columns).all(|(a, b)| a == b)
    }
}
