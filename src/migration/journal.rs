//! `Journal` - checkpoint log of the statements a schema editor has executed
//!
//! DB2 commits DDL statement by statement, so a failed alteration can leave a
//! table half changed. The journal records every statement that succeeded,
//! together with the statement that reverses it when one is known, and the
//! warnings raised by best-effort steps. Hosts can persist it as JSON and use
//! [`Journal::rollback_plan`] to attempt a manual rollback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One executed statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Statement text as sent to the engine
    pub sql: String,

    /// Statement reversing this one (`None` if it cannot be derived)
    pub undo: Option<String>,

    /// When the statement was issued
    pub executed_at: DateTime<Utc>,

    /// Execution time in milliseconds
    pub elapsed_ms: i64,
}

impl JournalEntry {
    #[must_use]
    pub fn new(sql: String, undo: Option<String>, executed_at: DateTime<Utc>, elapsed_ms: i64) -> Self {
        Self {
            sql,
            undo,
            executed_at,
            elapsed_ms,
        }
    }
}

/// A best-effort step that did not happen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaWarning {
    /// Table the step applied to
    pub table: String,
    /// Constraint involved, if any
    pub constraint: Option<String>,
    pub message: String,
}

impl SchemaWarning {
    pub fn new(table: impl Into<String>, constraint: Option<String>, message: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            constraint,
            message: message.into(),
        }
    }
}

/// Executed statements and warnings, in order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    pub entries: Vec<JournalEntry>,
    pub warnings: Vec<SchemaWarning>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    pub fn warn(&mut self, warning: SchemaWarning) {
        self.warnings.push(warning);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Statement texts, in execution order
    pub fn statements(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.sql.as_str()).collect()
    }

    /// Known undo statements, most recent first
    ///
    /// Statements without an undo (data copies, reorgs, drops of objects
    /// whose definition was not known) are skipped.
    pub fn rollback_plan(&self) -> Vec<String> {
        self.entries.iter().rev().filter_map(|e| e.undo.clone()).collect()
    }

    /// Serialize to JSON
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a journal persisted with [`to_json`](Journal::to_json)
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if the input is not a valid journal.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sql: &str, undo: Option<&str>) -> JournalEntry {
        JournalEntry::new(sql.to_string(), undo.map(str::to_string), Utc::now(), 0)
    }

    #[test]
    fn test_rollback_plan_is_reversed_and_skips_unknown() {
        let mut journal = Journal::new();
        journal.record(entry("ADD a", Some("DROP a")));
        journal.record(entry("UPDATE", None));
        journal.record(entry("ADD b", Some("DROP b")));

        assert_eq!(journal.len(), 3);
        assert_eq!(journal.rollback_plan(), vec!["DROP b".to_string(), "DROP a".to_string()]);
    }

    #[test]
    fn test_json_round_trip_keeps_warnings() {
        let mut journal = Journal::new();
        journal.record(entry("DROP INDEX \"i\"", Some("CREATE INDEX \"i\" ON \"t\" (\"c\")")));
        journal.warn(SchemaWarning::new("t", Some("t_c_uniq".into()), "drop failed"));

        let json = journal.to_json().unwrap();
        assert!(json.contains("t_c_uniq"));
        let restored = Journal::from_json(&json).unwrap();
        assert_eq!(restored, journal);
    }
}
