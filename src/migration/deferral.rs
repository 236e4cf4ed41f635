//! Constraint deferral and restoration
//!
//! Renaming or retyping a column in DB2 requires dropping the keys, indexes
//! and checks built on it first. [`SchemaEditor::defer_constraints`] drops
//! them and records what it dropped; [`SchemaEditor::restore_constraints`]
//! recreates them under their original names with the column substituted.

use super::error::SchemaError;
use super::journal::SchemaWarning;
use super::schema_editor::SchemaEditor;
use crate::ddl::{quote_name, Ddl};
use crate::schema::{Constraint, ConstraintKind, TableName};
use regex::{Captures, Regex};

/// A dropped constraint, as needed to recreate it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredConstraint {
    pub name: String,
    /// Original column list
    pub columns: Vec<String>,
    /// Check expression, for check constraints
    pub expression: Option<String>,
}

/// Constraints dropped by a deferral, grouped by kind in drop order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeferredConstraintSet {
    pub primary_key: Vec<DeferredConstraint>,
    pub unique: Vec<DeferredConstraint>,
    pub index: Vec<DeferredConstraint>,
    pub check: Vec<DeferredConstraint>,
}

impl DeferredConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket_mut(&mut self, kind: ConstraintKind) -> Option<&mut Vec<DeferredConstraint>> {
        match kind {
            ConstraintKind::PrimaryKey => Some(&mut self.primary_key),
            ConstraintKind::Unique => Some(&mut self.unique),
            ConstraintKind::Index => Some(&mut self.index),
            ConstraintKind::Check => Some(&mut self.check),
            ConstraintKind::ForeignKey => None,
        }
    }

    /// Record a dropped constraint; foreign keys are not deferrable and are ignored
    pub fn record(&mut self, constraint: &Constraint) {
        if let Some(bucket) = self.bucket_mut(constraint.kind) {
            bucket.push(DeferredConstraint {
                name: constraint.name.clone(),
                columns: constraint.columns.clone(),
                expression: constraint.check.clone(),
            });
        }
    }

    /// Whether a constraint of `kind` named `name` was recorded
    pub fn contains(&self, kind: ConstraintKind, name: &str) -> bool {
        self.iter().any(|(k, c)| k == kind && c.name == name)
    }

    /// Every recorded constraint, in restoration order: primary key, unique, index, check
    pub fn iter(&self) -> impl Iterator<Item = (ConstraintKind, &DeferredConstraint)> + '_ {
        tagged(ConstraintKind::PrimaryKey, &self.primary_key)
            .chain(tagged(ConstraintKind::Unique, &self.unique))
            .chain(tagged(ConstraintKind::Index, &self.index))
            .chain(tagged(ConstraintKind::Check, &self.check))
    }

    pub fn len(&self) -> usize {
        self.primary_key.len() + self.unique.len() + self.index.len() + self.check.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn tagged(
    kind: ConstraintKind,
    constraints: &[DeferredConstraint],
) -> impl Iterator<Item = (ConstraintKind, &DeferredConstraint)> + '_ {
    constraints.iter().map(move |c| (kind, c))
}

/// A best-effort drop that failed; the constraint stays in place and is not restored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedConstraint {
    pub table: TableName,
    pub name: String,
    pub kind: ConstraintKind,
    pub reason: String,
}

/// Result of a deferral
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeferralOutcome {
    pub deferred: DeferredConstraintSet,
    pub skipped: Vec<SkippedConstraint>,
}

/// Statement recreating a constraint of `kind` under `name`
pub(crate) fn create_statement(
    table: &TableName,
    kind: ConstraintKind,
    name: &str,
    columns: Vec<String>,
    expression: Option<&str>,
) -> Option<Ddl> {
    let table = table.clone();
    let name = name.to_string();
    match kind {
        ConstraintKind::PrimaryKey => Some(Ddl::AddPrimaryKey { table, name, columns }),
        ConstraintKind::Unique => Some(Ddl::AddUnique { table, name, columns }),
        ConstraintKind::Index => Some(Ddl::CreateIndex { table, name, columns }),
        ConstraintKind::Check => expression.map(|e| Ddl::AddCheck {
            table,
            name,
            expression: e.to_string(),
        }),
        ConstraintKind::ForeignKey => None,
    }
}

/// Rewrite whole-word references to `old` in a check expression
///
/// Both quoted (`"amt"`) and bare (`amt`) references are rewritten, keeping
/// their form.
pub fn substitute_column(expression: &str, old: &str, new: &str) -> String {
    if old == new {
        return expression.to_string();
    }
    let quoted_old = quote_name(old);
    let pattern = format!(r"{}|\b{}\b", regex::escape(&quoted_old), regex::escape(old));
    match Regex::new(&pattern) {
        Ok(re) => re
            .replace_all(expression, |caps: &Captures| {
                if caps[0].starts_with('"') {
                    quote_name(new)
                } else {
                    new.to_string()
                }
            })
            .into_owned(),
        Err(_) => expression.replace(&quoted_old, &quote_name(new)),
    }
}

impl SchemaEditor<'_> {
    /// Drop every constraint of `kinds` in `snapshot` that covers `column`
    ///
    /// Primary key and check drops propagate failures. Unique and index drops
    /// are best effort: a failed drop is reported in
    /// [`DeferralOutcome::skipped`] and on the journal's warning list, and the
    /// constraint is not restored later.
    pub fn defer_constraints(
        &mut self,
        table: &TableName,
        snapshot: &[Constraint],
        column: &str,
        kinds: &[ConstraintKind],
    ) -> Result<DeferralOutcome, SchemaError> {
        let mut outcome = DeferralOutcome::default();

        for constraint in snapshot {
            if !kinds.contains(&constraint.kind) || !constraint.covers(column) {
                continue;
            }
            let drop = match constraint.kind {
                ConstraintKind::Index => Ddl::DropIndex {
                    table: table.clone(),
                    name: constraint.name.clone(),
                },
                ConstraintKind::ForeignKey => continue,
                _ => Ddl::DropConstraint {
                    table: table.clone(),
                    name: constraint.name.clone(),
                },
            };
            let undo = create_statement(
                table,
                constraint.kind,
                &constraint.name,
                constraint.columns.clone(),
                constraint.check.as_deref(),
            );

            match constraint.kind {
                ConstraintKind::Unique | ConstraintKind::Index => {
                    if let Err(e) = self.run_with_undo(&drop, undo.as_ref()) {
                        let reason = e.to_string();
                        self.warn(SchemaWarning::new(
                            table.to_string(),
                            Some(constraint.name.clone()),
                            format!("could not defer {} {}: {}", constraint.kind, constraint.name, reason),
                        ));
                        outcome.skipped.push(SkippedConstraint {
                            table: table.clone(),
                            name: constraint.name.clone(),
                            kind: constraint.kind,
                            reason,
                        });
                        continue;
                    }
                }
                _ => {
                    self.run_with_undo(&drop, undo.as_ref())?;
                }
            }
            outcome.deferred.record(constraint);
        }

        Ok(outcome)
    }

    /// Recreate deferred constraints with `old_column` replaced by `new_column`
    ///
    /// Runs in the order primary key, unique, index, check. Check
    /// expressions have their references to the column rewritten.
    pub fn restore_constraints(
        &mut self,
        table: &TableName,
        deferred: &DeferredConstraintSet,
        old_column: &str,
        new_column: &str,
    ) -> Result<(), SchemaError> {
        for (kind, constraint) in deferred.iter() {
            let columns = constraint
                .columns
                .iter()
                .map(|c| if c == old_column { new_column.to_string() } else { c.clone() })
                .collect();
            let expression = constraint
                .expression
                .as_deref()
                .map(|e| substitute_column(e, old_column, new_column));
            if let Some(create) = create_statement(table, kind, &constraint.name, columns, expression.as_deref()) {
                self.run(&create)?;
            }
        }
        Ok(())
    }
}
