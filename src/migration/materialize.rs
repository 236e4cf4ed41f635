//! Column materializer
//!
//! DB2 adds columns nullable and unconstrained. NOT NULL, the primary key
//! and the remaining constraints are applied afterwards, one statement at a
//! time; if any of those steps fails the new column is dropped again.

use super::error::SchemaError;
use super::relation::{LinkTableRebuild, RelationRebuild};
use super::schema_editor::SchemaEditor;
use crate::ddl::Ddl;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
use crate::schema::{ColumnDefinition, ConstraintKind, Table, TableName};

impl SchemaEditor<'_> {
    /// Add `column` to `table`
    ///
    /// Many-to-many columns have no physical column; adding one creates its
    /// link table when the link table is managed implicitly.
    pub fn add_column(&mut self, table: &Table, column: &ColumnDefinition) -> Result<(), SchemaError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::add_column_span(&table.name, &column.name).entered();

        if let Some(link) = column.link_table() {
            if link.auto_created {
                return LinkTableRebuild.create_link_table(self, table, column);
            }
            return Ok(());
        }

        let name = &table.name;
        let definition = column
            .render_definition(self.config().identity_cache)
            .ok_or_else(|| SchemaError::IncompatibleAlteration {
                table: name.clone(),
                column: column.name.clone(),
                reason: "column has no storage type".into(),
            })?;

        self.run(&Ddl::AddColumn {
            table: name.clone(),
            column: column.name.clone(),
            definition,
        })?;
        self.reorganize_pending()?;

        if let Err(err) = self.apply_column_constraints(name, column) {
            self.drop_added_column(name, &column.name);
            return Err(err);
        }

        log::info!("added column {}.{}", name, column.name);
        Ok(())
    }

    /// Drop `column` from `table`, after the foreign keys declared on it
    pub fn remove_column(&mut self, table: &Table, column: &ColumnDefinition) -> Result<(), SchemaError> {
        if let Some(link) = column.link_table() {
            if link.auto_created {
                self.delete_table(&link.table)?;
            }
            return Ok(());
        }

        let name = &table.name;
        for fk in self
            .constraints(name)?
            .into_iter()
            .filter(|c| c.kind == ConstraintKind::ForeignKey && c.covers(&column.name))
        {
            let undo = column.foreign_key().map(|target| Ddl::AddForeignKey {
                table: name.clone(),
                name: fk.name.clone(),
                columns: fk.columns.clone(),
                to_table: target.table.clone(),
                to_column: target.column.clone(),
            });
            self.run_with_undo(
                &Ddl::DropConstraint {
                    table: name.clone(),
                    name: fk.name,
                },
                undo.as_ref(),
            )?;
        }

        // The data is gone either way; the undo only brings the column back
        let undo = column
            .render_definition(self.config().identity_cache)
            .map(|definition| Ddl::AddColumn {
                table: name.clone(),
                column: column.name.clone(),
                definition,
            });
        self.run_with_undo(
            &Ddl::DropColumn {
                table: name.clone(),
                column: column.name.clone(),
            },
            undo.as_ref(),
        )?;
        self.reorganize_pending()?;

        log::info!("removed column {}.{}", name, column.name);
        Ok(())
    }

    fn apply_column_constraints(&mut self, table: &TableName, column: &ColumnDefinition) -> Result<(), SchemaError> {
        let col = column.name.as_str();

        if !column.nullable {
            self.run(&Ddl::SetNotNull {
                table: table.clone(),
                column: col.to_string(),
            })?;
            self.reorganize_pending()?;
        }

        if column.primary_key {
            self.drop_primary_keys(table)?;
            self.run(&Ddl::AddPrimaryKey {
                table: table.clone(),
                name: self.constraint_name(table, &[col], "_pk"),
                columns: vec![col.to_string()],
            })?;
            self.reorganize_pending()?;
        } else if column.unique {
            self.run(&Ddl::AddUnique {
                table: table.clone(),
                name: self.constraint_name(table, &[col], "_uniq"),
                columns: vec![col.to_string()],
            })?;
            self.reorganize_pending()?;
        } else if column.indexed {
            self.run(&Ddl::CreateIndex {
                table: table.clone(),
                name: self.constraint_name(table, &[col], "_index"),
                columns: vec![col.to_string()],
            })?;
        }

        if let Some(expression) = &column.check {
            self.run(&Ddl::AddCheck {
                table: table.clone(),
                name: self.constraint_name(table, &[col], "_check"),
                expression: expression.clone(),
            })?;
        }

        if let Some(target) = column.foreign_key() {
            self.run(&Ddl::AddForeignKey {
                table: table.clone(),
                name: self.constraint_name(table, &[col], "_fk"),
                columns: vec![col.to_string()],
                to_table: target.table.clone(),
                to_column: target.column.clone(),
            })?;
        }

        Ok(())
    }

    /// Drop whatever primary key `table` has, by name, with an undo that recreates it
    pub(crate) fn drop_primary_keys(&mut self, table: &TableName) -> Result<(), SchemaError> {
        for pk in self.primary_keys(table)? {
            let undo = Ddl::AddPrimaryKey {
                table: table.clone(),
                name: pk.name.clone(),
                columns: pk.columns.clone(),
            };
            self.run_with_undo(
                &Ddl::DropConstraint {
                    table: table.clone(),
                    name: pk.name,
                },
                Some(&undo),
            )?;
        }
        Ok(())
    }

    // The original error is what the caller sees; a failed drop is only logged
    fn drop_added_column(&mut self, table: &TableName, column: &str) {
        #[cfg(feature = "metrics")]
        METRICS.record_compensation();

        let drop = Ddl::DropColumn {
            table: table.clone(),
            column: column.to_string(),
        };
        match self.run_with_undo(&drop, None) {
            Ok(_) => log::warn!("dropped column {}.{} after a failed follow-up step", table, column),
            Err(e) => log::error!("could not drop column {}.{} after a failed follow-up step: {}", table, column, e),
        }
    }
}
