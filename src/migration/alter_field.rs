//! Field alteration planner and executor
//!
//! `alter_field` turns the differences between an old and a new column
//! definition into DB2 statements, in an order DB2 accepts:
//!
//! 1. remake the column when its type can't be changed in place
//! 2. drop the primary key, unique constraint, index, check and NOT NULL
//!    that are going away, and the foreign keys declared on the column
//! 3. for a rename or retype, defer the remaining constraints on the column,
//!    rename, retype, then restore them under the new name
//! 4. apply the new default, NOT NULL, check, key or index
//! 5. retype and recreate foreign keys in other tables that point at the column
//!
//! DB2 commits each statement on its own. A failure part way leaves the
//! statements already run in place; they are listed in the editor's journal.

use super::deferral::create_statement;
use super::error::SchemaError;
use super::plan::{same_storage_type, AlterationPlan};
use super::relation::LinkTableRebuild;
use super::schema_editor::SchemaEditor;
use crate::ddl::Ddl;
use crate::executor::EngineError;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
use crate::schema::{ColumnDefinition, ConstraintKind, IncomingReference, Table, TableName};
use crate::value::format_literal;

/// Constraint kinds deferred around a rename or retype
const DEFERRED_KINDS: &[ConstraintKind] = &[
    ConstraintKind::PrimaryKey,
    ConstraintKind::Unique,
    ConstraintKind::Index,
    ConstraintKind::Check,
];

impl SchemaEditor<'_> {
    /// Differences `alter_field` would act on, without executing anything
    pub fn plan(&self, old: &ColumnDefinition, new: &ColumnDefinition) -> AlterationPlan {
        AlterationPlan::diff(old, new)
    }

    /// Alter column `old` of `table` into `new`
    ///
    /// With `strict`, every constraint about to be dropped must exist exactly
    /// once in the catalog; otherwise the call fails before dropping it.
    pub fn alter_field(
        &mut self,
        table: &Table,
        old: &ColumnDefinition,
        new: &ColumnDefinition,
        strict: bool,
    ) -> Result<(), SchemaError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::alter_field_span(&table.name, &old.name).entered();

        match (old.resolved_type(), new.resolved_type()) {
            (None, None) if old.is_auto_created_link() && new.is_auto_created_link() => {
                return self.alter_relation(table, old, new, strict, &LinkTableRebuild);
            }
            (None, _) | (_, None) => {
                return Err(SchemaError::IncompatibleAlteration {
                    table: table.name.clone(),
                    column: old.name.clone(),
                    reason: format!(
                        "{} into {}: both sides need a storage type",
                        old.resolved_type().unwrap_or("no storage type"),
                        new.resolved_type().unwrap_or("no storage type"),
                    ),
                });
            }
            _ => {}
        }

        let initial = AlterationPlan::diff(old, new);
        if initial.is_noop() {
            log::debug!("nothing to alter on {}.{}", table.name, old.name);
            return Ok(());
        }
        let retype_incoming = initial.rebuild_incoming_fks && !same_storage_type(old, new);

        let remade;
        let (old, plan) = if initial.remake {
            remade = self.remake_column(table, old, new)?;
            (&remade, AlterationPlan::diff(&remade, new))
        } else {
            (old, initial)
        };
        let name = &table.name;

        // Drop what is going away
        self.drop_outgoing_constraints(name, old, &plan, strict)?;

        let rebuild_fk = old.foreign_key().is_some()
            && (plan.name || plan.data_type || old.foreign_key() != new.foreign_key());
        if rebuild_fk {
            self.drop_column_foreign_keys(name, old)?;
        }

        let mut default_dropped = false;
        if plan.name || plan.data_type {
            default_dropped = self.rename_and_retype(table, old, new, &plan)?;
        }

        // Default
        let new_default = new.default.as_ref().filter(|d| !d.is_null());
        match new_default {
            Some(value) if plan.default || default_dropped => {
                self.run(&Ddl::SetDefault {
                    table: name.clone(),
                    column: new.name.clone(),
                    value: format_literal(value),
                })?;
            }
            // Dropped even when nullability changes too, so the column ends up without a default
            None if plan.default && old.default.is_some() && !default_dropped => {
                let undo = old.default.as_ref().map(|value| Ddl::SetDefault {
                    table: name.clone(),
                    column: new.name.clone(),
                    value: format_literal(value),
                });
                self.run_with_undo(
                    &Ddl::DropDefault {
                        table: name.clone(),
                        column: new.name.clone(),
                    },
                    undo.as_ref(),
                )?;
            }
            _ => {}
        }

        // Becoming nullable was handled with the drops
        if plan.nullable && !new.nullable {
            self.run(&Ddl::SetNotNull {
                table: name.clone(),
                column: new.name.clone(),
            })?;
        }

        if plan.check {
            if let Some(expression) = &new.check {
                self.run(&Ddl::AddCheck {
                    table: name.clone(),
                    name: self.constraint_name(name, &[new.name.as_str()], "_check"),
                    expression: expression.clone(),
                })?;
            }
        }

        let mut retype_targets: Vec<&IncomingReference> = Vec::new();
        if retype_incoming {
            retype_targets.extend(&table.incoming);
        }

        if plan.primary_key && new.primary_key {
            // Any primary key still on the table is replaced
            self.drop_primary_keys(name)?;
            self.reorganize_pending()?;
            self.run(&Ddl::AddPrimaryKey {
                table: name.clone(),
                name: self.constraint_name(name, &[new.name.as_str()], "_pk"),
                columns: vec![new.name.clone()],
            })?;
            for incoming in &table.incoming {
                if !retype_targets.contains(&incoming) {
                    retype_targets.push(incoming);
                }
            }
        } else if plan.unique && new.unique {
            self.run(&Ddl::AddUnique {
                table: name.clone(),
                name: self.constraint_name(name, &[new.name.as_str()], "_uniq"),
                columns: vec![new.name.clone()],
            })?;
        } else if plan.index && new.indexed {
            self.run(&Ddl::CreateIndex {
                table: name.clone(),
                name: self.constraint_name(name, &[new.name.as_str()], "_index"),
                columns: vec![new.name.clone()],
            })?;
        }

        if !retype_targets.is_empty() {
            let storage_type = new
                .referenced_type()
                .ok_or_else(|| SchemaError::IncompatibleAlteration {
                    table: name.clone(),
                    column: new.name.clone(),
                    reason: "referenced column has no storage type".into(),
                })?;
            for incoming in &retype_targets {
                self.run(&Ddl::SetDataType {
                    table: incoming.table.clone(),
                    column: incoming.column.clone(),
                    storage_type: storage_type.to_string(),
                })?;
            }
            self.reorganize_pending()?;
        }

        if let Some(target) = new.foreign_key() {
            if rebuild_fk || old.foreign_key() != new.foreign_key() {
                self.run(&Ddl::AddForeignKey {
                    table: name.clone(),
                    name: self.constraint_name(name, &[new.name.as_str()], "_fk"),
                    columns: vec![new.name.clone()],
                    to_table: target.table.clone(),
                    to_column: target.column.clone(),
                })?;
            }
        }

        if initial.rebuild_incoming_fks {
            for incoming in &table.incoming {
                self.run(&Ddl::AddForeignKey {
                    table: incoming.table.clone(),
                    name: self.constraint_name(&incoming.table, &[incoming.column.as_str()], "_fk"),
                    columns: vec![incoming.column.clone()],
                    to_table: name.clone(),
                    to_column: new.name.clone(),
                })?;
            }
        }

        log::info!("altered column {}.{}", name, new.name);
        Ok(())
    }

    /// Rebuild `old` as a temporary column of the new type and return its definition
    ///
    /// The temporary column is added nullable and unconstrained, filled from
    /// the old column, and the old column is dropped. Constraints are applied
    /// to it afterwards by the caller. Once the old column is gone a later
    /// failure can't be undone automatically.
    fn remake_column(
        &mut self,
        table: &Table,
        old: &ColumnDefinition,
        new: &ColumnDefinition,
    ) -> Result<ColumnDefinition, SchemaError> {
        let temporary = ColumnDefinition {
            name: self.pseudo_column_name(&new.name),
            storage_type: new.storage_type.clone(),
            nullable: true,
            default: new.default.clone(),
            ..ColumnDefinition::default()
        };
        self.add_column(table, &temporary)?;

        self.run(&Ddl::CopyColumn {
            table: table.name.clone(),
            target: temporary.name.clone(),
            source: old.name.clone(),
        })?;

        if old.primary_key && new.primary_key {
            self.drop_incoming_foreign_keys(table, &old.name)?;
        }
        self.remove_column(table, old)?;

        log::info!(
            "remade column {}.{} as {}",
            table.name,
            old.name,
            temporary.name
        );
        Ok(temporary)
    }

    /// Drop the primary key, unique constraint, index, check and NOT NULL that
    /// `old` has and `plan` removes
    fn drop_outgoing_constraints(
        &mut self,
        table: &TableName,
        old: &ColumnDefinition,
        plan: &AlterationPlan,
        strict: bool,
    ) -> Result<(), SchemaError> {
        if plan.primary_key && old.primary_key {
            let names = self.constraint_names(table, &[old.name.as_str()], ConstraintKind::PrimaryKey)?;
            match names.first() {
                None if strict => {
                    return Err(SchemaError::MissingPrimaryKey {
                        table: table.clone(),
                        column: old.name.clone(),
                    });
                }
                // DB2 rejects DROP PRIMARY KEY on a table without one
                None => log::debug!("no primary key on {}.{} to drop", table, old.name),
                Some(pk) => {
                    let undo = Ddl::AddPrimaryKey {
                        table: table.clone(),
                        name: pk.clone(),
                        columns: vec![old.name.clone()],
                    };
                    self.run_with_undo(&Ddl::DropPrimaryKey { table: table.clone() }, Some(&undo))?;
                }
            }
        }

        // A unique column becoming the primary key loses its unique constraint
        if (plan.unique || plan.primary_key) && old.unique && !old.primary_key {
            self.drop_matching(table, &old.name, ConstraintKind::Unique, strict)?;
        }
        if plan.index && old.indexed {
            self.drop_matching(table, &old.name, ConstraintKind::Index, strict)?;
        }
        if plan.check && old.has_check() {
            self.drop_matching(table, &old.name, ConstraintKind::Check, strict)?;
        }

        if plan.nullable && !old.nullable {
            self.run(&Ddl::DropNotNull {
                table: table.clone(),
                column: old.name.clone(),
            })?;
        }
        Ok(())
    }

    /// Drop the single-column constraints of `kind` on `column`
    ///
    /// With `strict`, anything other than exactly one match is an error and
    /// nothing is dropped.
    fn drop_matching(
        &mut self,
        table: &TableName,
        column: &str,
        kind: ConstraintKind,
        strict: bool,
    ) -> Result<(), SchemaError> {
        let matching: Vec<_> = self
            .constraints(table)?
            .into_iter()
            .filter(|c| c.kind == kind && c.matches_columns(&[column]))
            .collect();
        if strict && matching.len() != 1 {
            return Err(SchemaError::ConstraintCountMismatch {
                table: table.clone(),
                column: column.to_string(),
                kind,
                expected: 1,
                found: matching.len(),
            });
        }

        for constraint in matching {
            let undo = create_statement(
                table,
                kind,
                &constraint.name,
                constraint.columns.clone(),
                constraint.check.as_deref(),
            );
            let drop = match kind {
                ConstraintKind::Index => Ddl::DropIndex {
                    table: table.clone(),
                    name: constraint.name,
                },
                _ => Ddl::DropConstraint {
                    table: table.clone(),
                    name: constraint.name,
                },
            };
            self.run_with_undo(&drop, undo.as_ref())?;
        }
        Ok(())
    }

    /// Drop every foreign key declared on `column`
    fn drop_column_foreign_keys(&mut self, table: &TableName, column: &ColumnDefinition) -> Result<(), SchemaError> {
        for fk in self
            .constraints(table)?
            .into_iter()
            .filter(|c| c.kind == ConstraintKind::ForeignKey && c.covers(&column.name))
        {
            let undo = column.foreign_key().map(|target| Ddl::AddForeignKey {
                table: table.clone(),
                name: fk.name.clone(),
                columns: fk.columns.clone(),
                to_table: target.table.clone(),
                to_column: target.column.clone(),
            });
            self.run_with_undo(
                &Ddl::DropConstraint {
                    table: table.clone(),
                    name: fk.name,
                },
                undo.as_ref(),
            )?;
        }
        Ok(())
    }

    /// Drop the foreign keys in other tables that point at `column` of `table`
    fn drop_incoming_foreign_keys(&mut self, table: &Table, column: &str) -> Result<(), SchemaError> {
        for incoming in &table.incoming {
            let fks: Vec<_> = self
                .constraints(&incoming.table)?
                .into_iter()
                .filter(|c| {
                    c.kind == ConstraintKind::ForeignKey
                        && c.matches_columns(&[incoming.column.as_str()])
                        && c.references.as_ref().map_or(true, |r| r.name == table.name.name)
                })
                .collect();
            for fk in fks {
                let undo = Ddl::AddForeignKey {
                    table: incoming.table.clone(),
                    name: fk.name.clone(),
                    columns: fk.columns.clone(),
                    to_table: table.name.clone(),
                    to_column: column.to_string(),
                };
                self.run_with_undo(
                    &Ddl::DropConstraint {
                        table: incoming.table.clone(),
                        name: fk.name,
                    },
                    Some(&undo),
                )?;
            }
        }
        Ok(())
    }

    /// Rename and/or retype the column with its constraints deferred
    ///
    /// Returns whether the old default was dropped on the way.
    fn rename_and_retype(
        &mut self,
        table: &Table,
        old: &ColumnDefinition,
        new: &ColumnDefinition,
        plan: &AlterationPlan,
    ) -> Result<bool, SchemaError> {
        let name = &table.name;

        if old.primary_key && new.primary_key {
            self.drop_incoming_foreign_keys(table, &old.name)?;
        }

        let snapshot = self.constraints(name)?;
        let outcome = self.defer_constraints(name, &snapshot, &old.name, DEFERRED_KINDS)?;

        let mut default_dropped = false;
        if plan.data_type {
            if let Some(value) = old.default.as_ref().filter(|d| !d.is_null()) {
                let undo = Ddl::SetDefault {
                    table: name.clone(),
                    column: old.name.clone(),
                    value: format_literal(value),
                };
                self.run_with_undo(
                    &Ddl::DropDefault {
                        table: name.clone(),
                        column: old.name.clone(),
                    },
                    Some(&undo),
                )?;
                default_dropped = true;
            }
        }

        if plan.name {
            self.run(&Ddl::RenameColumn {
                table: name.clone(),
                old: old.name.clone(),
                new: new.name.clone(),
            })?;
        }

        if plan.data_type {
            self.change_data_type(name, old, new)?;
        }

        self.restore_constraints(name, &outcome.deferred, &old.name, &new.name)?;
        Ok(default_dropped)
    }

    /// Retype the (already renamed) column, converting to or from identity
    fn change_data_type(
        &mut self,
        table: &TableName,
        old: &ColumnDefinition,
        new: &ColumnDefinition,
    ) -> Result<(), SchemaError> {
        let storage_type = required_type(table, new)?;
        let set_type = (!same_storage_type(old, new)).then(|| Ddl::SetDataType {
            table: table.clone(),
            column: new.name.clone(),
            storage_type: storage_type.to_string(),
        });
        let undo_type = old.resolved_type().map(|t| Ddl::SetDataType {
            table: table.clone(),
            column: new.name.clone(),
            storage_type: t.to_string(),
        });

        if new.auto_increment && !old.auto_increment {
            let start = self.identity_start(table, &new.name)?;
            if let Some(set_type) = &set_type {
                self.run_with_undo(set_type, undo_type.as_ref())?;
            }
            let undo = Ddl::DropIdentity {
                table: table.clone(),
                column: new.name.clone(),
            };
            self.run_with_undo(
                &Ddl::SetIdentity {
                    table: table.clone(),
                    column: new.name.clone(),
                    start,
                    cache: self.config().identity_cache,
                },
                Some(&undo),
            )?;
        } else if old.auto_increment && !new.auto_increment {
            self.run_with_undo(
                &Ddl::DropIdentity {
                    table: table.clone(),
                    column: new.name.clone(),
                },
                None,
            )?;
            if let Some(set_type) = &set_type {
                self.run_with_undo(set_type, undo_type.as_ref())?;
            }
        } else if let Some(set_type) = &set_type {
            self.run_with_undo(set_type, undo_type.as_ref())?;
        }
        Ok(())
    }

    /// First identity value for `column`: one past the current maximum, 1 for an empty table
    fn identity_start(&self, table: &TableName, column: &str) -> Result<i64, SchemaError> {
        let sql = Ddl::SelectMax {
            table: table.clone(),
            column: column.to_string(),
        }
        .to_string();
        let rows = self.query(&sql, &[])?;
        let max = match rows.first().and_then(|row| row.get(0)) {
            None => 0,
            Some(value) if value.is_null() => 0,
            Some(value) => value.as_i64().ok_or_else(|| SchemaError::StatementExecution {
                sql: sql.clone(),
                source: EngineError::Decode(format!("MAX({}) is not an integer: {:?}", column, value)),
            })?,
        };
        max.checked_add(1).ok_or_else(|| SchemaError::StatementExecution {
            sql,
            source: EngineError::Decode(format!("MAX({}) leaves no room for a next identity value", column)),
        })
    }
}

fn required_type<'c>(table: &TableName, column: &'c ColumnDefinition) -> Result<&'c str, SchemaError> {
    column
        .resolved_type()
        .ok_or_else(|| SchemaError::IncompatibleAlteration {
            table: table.clone(),
            column: column.name.clone(),
            reason: "column has no storage type".into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{RecordingExecutor, Row};
    use crate::schema::Constraint;
    use crate::value::Literal;

    fn orders() -> Table {
        Table::new(TableName::new("orders"))
    }

    #[test]
    fn test_no_op_emits_nothing() {
        let executor = RecordingExecutor::new();
        let mut editor = SchemaEditor::new(&executor);
        let def = ColumnDefinition::new("amt", "INTEGER");
        editor.alter_field(&orders(), &def, &def.clone(), true).unwrap();
        assert!(executor.statements().is_empty());
    }

    #[test]
    fn test_drop_not_null_is_one_statement() {
        let executor = RecordingExecutor::new();
        let mut editor = SchemaEditor::new(&executor);
        let old = ColumnDefinition::new("note", "VARCHAR(10)").not_null();
        editor.alter_field(&orders(), &old, &old.clone().null(), false).unwrap();
        assert_eq!(
            executor.statements(),
            vec!["ALTER TABLE \"orders\" ALTER COLUMN \"note\" DROP NOT NULL".to_string()]
        );
    }

    #[test]
    fn test_strict_unique_drop_requires_exactly_one() {
        let executor = RecordingExecutor::new();
        let mut editor = SchemaEditor::new(&executor);
        let old = ColumnDefinition::new("ref", "CHAR(8)").unique();
        let new = ColumnDefinition::new("ref", "CHAR(8)");

        let err = editor.alter_field(&orders(), &old, &new, true).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::ConstraintCountMismatch { kind: ConstraintKind::Unique, found: 0, .. }
        ));
        assert!(executor.statements().is_empty());

        // Non-strict tolerates the missing constraint
        editor.alter_field(&orders(), &old, &new, false).unwrap();
        assert!(executor.statements().is_empty());
    }

    #[test]
    fn test_strict_primary_key_drop_requires_one() {
        let executor = RecordingExecutor::new();
        let mut editor = SchemaEditor::new(&executor);
        let old = ColumnDefinition::new("id", "INTEGER").primary_key();
        let new = ColumnDefinition::new("id", "INTEGER").not_null();

        let err = editor.alter_field(&orders(), &old, &new, true).unwrap_err();
        assert!(matches!(err, SchemaError::MissingPrimaryKey { .. }));
        assert!(executor.statements().is_empty());
    }

    #[test]
    fn test_changing_the_default() {
        let executor = RecordingExecutor::new();
        let mut editor = SchemaEditor::new(&executor);
        let old = ColumnDefinition::new("status", "VARCHAR(10)").default_value("new");

        editor
            .alter_field(&orders(), &old, &old.clone().default_value("open"), false)
            .unwrap();
        let mut without = old.clone();
        without.default = None;
        editor.alter_field(&orders(), &old, &without, false).unwrap();

        assert_eq!(
            executor.statements(),
            vec![
                "ALTER TABLE \"orders\" ALTER COLUMN \"status\" SET DEFAULT 'open'".to_string(),
                "ALTER TABLE \"orders\" ALTER COLUMN \"status\" DROP DEFAULT".to_string(),
            ]
        );
    }

    #[test]
    fn test_retype_drops_and_reapplies_default() {
        let executor = RecordingExecutor::new();
        let mut editor = SchemaEditor::new(&executor);
        let old = ColumnDefinition::new("qty", "SMALLINT").default_value(0i64);

        editor.alter_field(&orders(), &old, &old.retyped("INTEGER"), false).unwrap();

        assert_eq!(
            executor.statements(),
            vec![
                "ALTER TABLE \"orders\" ALTER COLUMN \"qty\" DROP DEFAULT".to_string(),
                "ALTER TABLE \"orders\" ALTER COLUMN \"qty\" SET DATA TYPE INTEGER".to_string(),
                "ALTER TABLE \"orders\" ALTER COLUMN \"qty\" SET DEFAULT 0".to_string(),
            ]
        );
    }

    #[test]
    fn test_new_check_index_and_foreign_key() {
        let executor = RecordingExecutor::new();
        let mut editor = SchemaEditor::new(&executor);
        let old = ColumnDefinition::new("customer_id", "INTEGER");
        let new = old
            .clone()
            .indexed()
            .check("\"customer_id\" > 0")
            .references(TableName::new("customer"), "id");

        editor.alter_field(&orders(), &old, &new, false).unwrap();

        assert_eq!(
            executor.statements(),
            vec![
                "ALTER TABLE \"orders\" ADD CONSTRAINT \"orders_customer_id_check\" CHECK (\"customer_id\" > 0)".to_string(),
                "CREATE INDEX \"orders_customer_id_index\" ON \"orders\" (\"customer_id\")".to_string(),
                "ALTER TABLE \"orders\" ADD CONSTRAINT \"orders_customer_id_fk\" FOREIGN KEY (\"customer_id\") REFERENCES \"customer\" (\"id\")".to_string(),
            ]
        );
    }

    #[test]
    fn test_foreign_key_is_rebuilt_around_a_retype() {
        let table = orders();
        let executor = RecordingExecutor::new().with_constraints(
            &table.name,
            vec![Constraint::foreign_key("orders_customer_fk", &["customer_id"], TableName::new("customer"))],
        );
        let mut editor = SchemaEditor::new(&executor);
        let old = ColumnDefinition::new("customer_id", "INTEGER").references(TableName::new("customer"), "id");

        editor.alter_field(&table, &old, &old.retyped("BIGINT"), false).unwrap();

        assert_eq!(
            executor.statements(),
            vec![
                "ALTER TABLE \"orders\" DROP CONSTRAINT \"orders_customer_fk\"".to_string(),
                "ALTER TABLE \"orders\" ALTER COLUMN \"customer_id\" SET DATA TYPE BIGINT".to_string(),
                "ALTER TABLE \"orders\" ADD CONSTRAINT \"orders_customer_id_fk\" FOREIGN KEY (\"customer_id\") REFERENCES \"customer\" (\"id\")".to_string(),
            ]
        );
    }

    #[test]
    fn test_identity_start_reads_max() {
        let executor = RecordingExecutor::new()
            .with_rows("SELECT MAX", vec![Row::new(vec![Literal::Integer(41)])]);
        let editor = SchemaEditor::new(&executor);
        assert_eq!(editor.identity_start(&TableName::new("orders"), "id").unwrap(), 42);

        let executor = RecordingExecutor::new()
            .with_rows("SELECT MAX", vec![Row::new(vec![Literal::Null])]);
        let editor = SchemaEditor::new(&executor);
        assert_eq!(editor.identity_start(&TableName::new("orders"), "id").unwrap(), 1);

        let executor = RecordingExecutor::new()
            .with_rows("SELECT MAX", vec![Row::new(vec![Literal::text("abc")])]);
        let editor = SchemaEditor::new(&executor);
        assert!(editor.identity_start(&TableName::new("orders"), "id").is_err());
    }

    #[test]
    fn test_identity_start_rejects_maximum_at_integer_limit() {
        let executor = RecordingExecutor::new()
            .with_rows("SELECT MAX", vec![Row::new(vec![Literal::Integer(i64::MAX)])]);
        let mut editor = SchemaEditor::new(&executor);

        let err = editor.identity_start(&TableName::new("orders"), "id").unwrap_err();
        assert!(matches!(
            err,
            SchemaError::StatementExecution { source: EngineError::Decode(_), .. }
        ));

        let old = ColumnDefinition::new("id", "BIGINT").not_null();
        assert!(editor
            .alter_field(&orders(), &old, &old.clone().auto_increment(), false)
            .is_err());
        assert!(executor.statements().is_empty());
    }

    #[test]
    fn test_missing_primary_key_is_skipped_when_not_strict() {
        let executor = RecordingExecutor::new();
        let mut editor = SchemaEditor::new(&executor);
        let old = ColumnDefinition::new("id", "INTEGER").primary_key();
        let new = ColumnDefinition::new("id", "INTEGER").not_null();

        editor.alter_field(&orders(), &old, &new, false).unwrap();
        assert!(executor.statements().is_empty());
    }

    #[test]
    fn test_primary_key_drop_uses_catalog() {
        let table = orders();
        let executor = RecordingExecutor::new()
            .with_constraints(&table.name, vec![Constraint::primary_key("orders_id_pk", &["id"])]);
        let mut editor = SchemaEditor::new(&executor);
        let old = ColumnDefinition::new("id", "INTEGER").primary_key();
        let new = ColumnDefinition::new("id", "INTEGER").not_null();

        editor.alter_field(&table, &old, &new, true).unwrap();
        assert_eq!(
            executor.statements(),
            vec!["ALTER TABLE \"orders\" DROP PRIMARY KEY".to_string()]
        );
        assert_eq!(
            editor.journal().rollback_plan(),
            vec!["ALTER TABLE \"orders\" ADD CONSTRAINT \"orders_id_pk\" PRIMARY KEY (\"id\")".to_string()]
        );
    }

    #[test]
    fn test_new_primary_key_replaces_the_existing_one() {
        let table = orders();
        let executor = RecordingExecutor::new()
            .with_constraints(&table.name, vec![Constraint::primary_key("orders_legacy_pk", &["legacy"])]);
        let mut editor = SchemaEditor::new(&executor);
        let old = ColumnDefinition::new("code", "CHAR(4)");

        editor.alter_field(&table, &old, &old.clone().primary_key(), false).unwrap();

        assert_eq!(
            executor.statements(),
            vec![
                "ALTER TABLE \"orders\" ALTER COLUMN \"code\" SET NOT NULL".to_string(),
                "ALTER TABLE \"orders\" DROP CONSTRAINT \"orders_legacy_pk\"".to_string(),
                "ALTER TABLE \"orders\" ADD CONSTRAINT \"orders_code_pk\" PRIMARY KEY (\"code\")".to_string(),
            ]
        );
    }

    #[test]
    fn test_strict_unique_drop_rejects_duplicates() {
        let table = orders();
        let executor = RecordingExecutor::new().with_constraints(
            &table.name,
            vec![Constraint::unique("u1", &["ref"]), Constraint::unique("u2", &["ref"])],
        );
        let mut editor = SchemaEditor::new(&executor);
        let old = ColumnDefinition::new("ref", "CHAR(8)").unique();
        let new = ColumnDefinition::new("ref", "CHAR(8)");

        let err = editor.alter_field(&table, &old, &new, true).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::ConstraintCountMismatch { kind: ConstraintKind::Unique, expected: 1, found: 2, .. }
        ));
        assert!(executor.statements().is_empty());

        // Non-strict drops every match
        editor.alter_field(&table, &old, &new, false).unwrap();
        assert_eq!(
            executor.statements(),
            vec![
                "ALTER TABLE \"orders\" DROP CONSTRAINT \"u1\"".to_string(),
                "ALTER TABLE \"orders\" DROP CONSTRAINT \"u2\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_strict_index_and_check_drops_require_exactly_one() {
        let executor = RecordingExecutor::new();
        let mut editor = SchemaEditor::new(&executor);

        let old = ColumnDefinition::new("ref", "CHAR(8)").indexed();
        let err = editor
            .alter_field(&orders(), &old, &ColumnDefinition::new("ref", "CHAR(8)"), true)
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::ConstraintCountMismatch { kind: ConstraintKind::Index, found: 0, .. }
        ));

        let old = ColumnDefinition::new("qty", "INTEGER").check("\"qty\" >= 0");
        let err = editor
            .alter_field(&orders(), &old, &ColumnDefinition::new("qty", "INTEGER"), true)
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::ConstraintCountMismatch { kind: ConstraintKind::Check, found: 0, .. }
        ));
        assert!(executor.statements().is_empty());
    }

    #[test]
    fn test_default_dropped_alongside_nullability() {
        let executor = RecordingExecutor::new();
        let mut editor = SchemaEditor::new(&executor);
        let old = ColumnDefinition::new("status", "VARCHAR(10)").not_null().default_value("new");
        let mut new = old.clone().null();
        new.default = None;

        editor.alter_field(&orders(), &old, &new, false).unwrap();

        assert_eq!(
            executor.statements(),
            vec![
                "ALTER TABLE \"orders\" ALTER COLUMN \"status\" DROP NOT NULL".to_string(),
                "ALTER TABLE \"orders\" ALTER COLUMN \"status\" DROP DEFAULT".to_string(),
            ]
        );
    }

    #[test]
    fn test_many_to_many_against_scalar_is_incompatible() {
        use crate::schema::LinkTable;

        let executor = RecordingExecutor::new();
        let mut editor = SchemaEditor::new(&executor);
        let link = LinkTable {
            table: TableName::new("book_authors"),
            source: ColumnDefinition::new("book_id", "INTEGER"),
            reverse: ColumnDefinition::new("author_id", "INTEGER"),
            auto_created: true,
        };
        let old = ColumnDefinition::many_to_many("authors", link);
        let new = ColumnDefinition::new("authors", "INTEGER");

        let err = editor.alter_field(&orders(), &old, &new, false).unwrap_err();
        assert!(matches!(err, SchemaError::IncompatibleAlteration { .. }));
        assert!(executor.statements().is_empty());
    }
}
