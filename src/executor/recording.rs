//! `RecordingExecutor` - dry-run executor that records statements
//!
//! Nothing reaches a database. Statements are collected in order, introspection
//! queries are answered from scripted results, and a simulated constraint
//! catalog follows the constraint statements the editor issues, so a plan can
//! be previewed end to end. Statements matching a failure pattern are rejected,
//! which is how tests exercise error paths.

use super::{EngineError, Row, SchemaExecutor};
use crate::schema::{Constraint, ConstraintKind, TableName};
use crate::value::Literal;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

const IDENT: &str = r#""(?:[^"]|"")+""#;

static ADD_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"^ALTER TABLE (.+?) ADD CONSTRAINT ({IDENT}) (PRIMARY KEY|UNIQUE) \((.+)\)$"#
    ))
    .expect("valid pattern")
});
static ADD_FK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"^ALTER TABLE (.+?) ADD CONSTRAINT ({IDENT}) FOREIGN KEY \((.+?)\) REFERENCES (.+?) \(.+\)$"#
    ))
    .expect("valid pattern")
});
static ADD_CHECK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r#"^ALTER TABLE (.+?) ADD CONSTRAINT ({IDENT}) CHECK \((.+)\)$"#))
        .expect("valid pattern")
});
static RENAME_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r#"^RENAME TABLE (.+?) TO ({IDENT})$"#)).expect("valid pattern")
});
static CREATE_INDEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r#"^CREATE INDEX (?:{IDENT}\.)?({IDENT}) ON (.+?) \((.+)\)$"#))
        .expect("valid pattern")
});
static DROP_CONSTRAINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r#"^ALTER TABLE (.+?) DROP CONSTRAINT ({IDENT})$"#))
        .expect("valid pattern")
});
static DROP_INDEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r#"^DROP INDEX (?:{IDENT}\.)?({IDENT})$"#))
        .expect("valid pattern")
});
static DROP_PRIMARY_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^ALTER TABLE (.+?) DROP PRIMARY KEY$"#).expect("valid pattern")
});
static RENAME_COLUMN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r#"^ALTER TABLE (.+?) RENAME COLUMN ({IDENT}) TO ({IDENT})$"#))
        .expect("valid pattern")
});
static DROP_COLUMN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r#"^ALTER TABLE (.+?) DROP COLUMN ({IDENT})$"#))
        .expect("valid pattern")
});
static IDENT_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(IDENT).expect("valid pattern"));

fn unquote(quoted: &str) -> String {
    let inner = quoted.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(quoted);
    inner.replace("\"\"", "\"")
}

fn ident_list(list: &str) -> Vec<String> {
    IDENT_LIST.find_iter(list).map(|m| unquote(m.as_str())).collect()
}

fn parse_table(quoted: &str) -> TableName {
    let mut parts = ident_list(quoted);
    match parts.len() {
        2 => {
            let name = parts.pop().unwrap_or_default();
            TableName::qualified(parts.pop().unwrap_or_default(), name)
        }
        _ => TableName::new(parts.pop().unwrap_or_default()),
    }
}

// Poisoning only happens if a test panicked mid-call; the data is still usable.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Executor that records statements instead of running them
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    statements: Mutex<Vec<String>>,
    queries: Mutex<Vec<(String, Vec<Literal>)>>,
    catalog: Mutex<HashMap<String, Vec<Constraint>>>,
    results: Mutex<Vec<(String, Vec<Row>)>>,
    failures: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the simulated catalog of `table`
    #[must_use]
    pub fn with_constraints(self, table: &TableName, constraints: Vec<Constraint>) -> Self {
        lock(&self.catalog).insert(table.quoted(), constraints);
        self
    }

    /// Answer queries containing `pattern` with `rows`
    ///
    /// The first matching pattern wins.
    #[must_use]
    pub fn with_rows(self, pattern: impl Into<String>, rows: Vec<Row>) -> Self {
        lock(&self.results).push((pattern.into(), rows));
        self
    }

    /// Reject every statement containing `pattern`
    #[must_use]
    pub fn fail_on(self, pattern: impl Into<String>) -> Self {
        lock(&self.failures).push(pattern.into());
        self
    }

    /// Successfully executed statements, in order
    pub fn statements(&self) -> Vec<String> {
        lock(&self.statements).clone()
    }

    /// Queries issued, with their parameters
    pub fn queries(&self) -> Vec<(String, Vec<Literal>)> {
        lock(&self.queries).clone()
    }

    /// Forget recorded statements and queries, keeping the catalog
    pub fn clear(&self) {
        lock(&self.statements).clear();
        lock(&self.queries).clear();
    }

    fn check_failure(&self, sql: &str) -> Result<(), EngineError> {
        match lock(&self.failures).iter().find(|p| sql.contains(p.as_str())) {
            Some(pattern) => Err(EngineError::Rejected {
                sqlstate: None,
                message: format!("simulated failure on '{}'", pattern),
            }),
            None => Ok(()),
        }
    }

    // Keep the simulated catalog in step with constraint statements
    fn apply_to_catalog(&self, sql: &str) {
        let mut catalog = lock(&self.catalog);

        if let Some(caps) = ADD_KEY.captures(sql) {
            let kind = if &caps[3] == "UNIQUE" { ConstraintKind::Unique } else { ConstraintKind::PrimaryKey };
            let columns = ident_list(&caps[4]);
            let mut constraint = Constraint::new(unquote(&caps[2]), kind, &[]);
            constraint.columns = columns;
            catalog.entry(caps[1].to_string()).or_default().push(constraint);
        } else if let Some(caps) = ADD_FK.captures(sql) {
            let mut constraint = Constraint::foreign_key(unquote(&caps[2]), &[], parse_table(&caps[4]));
            constraint.columns = ident_list(&caps[3]);
            catalog.entry(caps[1].to_string()).or_default().push(constraint);
        } else if let Some(caps) = ADD_CHECK.captures(sql) {
            // Quoted identifiers inside the expression stand in for its columns
            let mut constraint = Constraint::check(unquote(&caps[2]), &[], &caps[3]);
            constraint.columns = ident_list(&caps[3]);
            catalog.entry(caps[1].to_string()).or_default().push(constraint);
        } else if let Some(caps) = RENAME_TABLE.captures(sql) {
            let old = parse_table(&caps[1]);
            let new = TableName {
                schema: old.schema.clone(),
                name: unquote(&caps[2]),
            };
            if let Some(constraints) = catalog.remove(&caps[1]) {
                catalog.insert(new.quoted(), constraints);
            }
        } else if let Some(caps) = CREATE_INDEX.captures(sql) {
            let mut constraint = Constraint::index(unquote(&caps[1]), &[]);
            constraint.columns = ident_list(&caps[3]);
            catalog.entry(caps[2].to_string()).or_default().push(constraint);
        } else if let Some(caps) = DROP_CONSTRAINT.captures(sql) {
            let name = unquote(&caps[2]);
            if let Some(constraints) = catalog.get_mut(&caps[1]) {
                constraints.retain(|c| c.name != name);
            }
        } else if let Some(caps) = DROP_INDEX.captures(sql) {
            let name = unquote(&caps[1]);
            for constraints in catalog.values_mut() {
                constraints.retain(|c| !(c.kind == ConstraintKind::Index && c.name == name));
            }
        } else if let Some(caps) = DROP_PRIMARY_KEY.captures(sql) {
            if let Some(constraints) = catalog.get_mut(&caps[1]) {
                constraints.retain(|c| c.kind != ConstraintKind::PrimaryKey);
            }
        } else if let Some(caps) = RENAME_COLUMN.captures(sql) {
            let (old, new) = (unquote(&caps[2]), unquote(&caps[3]));
            if let Some(constraints) = catalog.get_mut(&caps[1]) {
                for column in constraints.iter_mut().flat_map(|c| c.columns.iter_mut()) {
                    if *column == old {
                        column.clone_from(&new);
                    }
                }
            }
        } else if let Some(caps) = DROP_COLUMN.captures(sql) {
            let column = unquote(&caps[2]);
            if let Some(constraints) = catalog.get_mut(&caps[1]) {
                constraints.retain(|c| !c.covers(&column));
            }
        }
    }
}

impl SchemaExecutor for RecordingExecutor {
    fn execute(&self, sql: &str, _params: &[Literal]) -> Result<u64, EngineError> {
        self.check_failure(sql)?;
        self.apply_to_catalog(sql);
        lock(&self.statements).push(sql.to_string());
        Ok(0)
    }

    fn query_all(&self, sql: &str, params: &[Literal]) -> Result<Vec<Row>, EngineError> {
        self.check_failure(sql)?;
        lock(&self.queries).push((sql.to_string(), params.to_vec()));
        let rows = lock(&self.results)
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default();
        Ok(rows)
    }

    fn constraints(&self, table: &TableName) -> Result<Vec<Constraint>, EngineError> {
        Ok(lock(&self.catalog).get(&table.quoted()).cloned().unwrap_or_default())
    }
}
