//! Many-to-many link table adapter
//!
//! A many-to-many relation has no column of its own; it lives in a link
//! table holding one foreign key to each side. Altering the relation clears
//! the link table's foreign keys and the keys on its far-side column, lets a
//! [`RelationRebuild`] change the link table, and then puts the keys back.

use super::error::SchemaError;
use super::schema_editor::SchemaEditor;
use crate::ddl::{identity_clause, Ddl};
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
use crate::schema::{ColumnDefinition, ConstraintKind, LinkTable, Table};

/// Constraint kinds deferred on the far-side column of a link table
const DEFERRED_KINDS: &[ConstraintKind] = &[
    ConstraintKind::PrimaryKey,
    ConstraintKind::Unique,
    ConstraintKind::Index,
];

/// Structural changes to a link table, run once its constraints are cleared
pub trait RelationRebuild {
    /// Change the link table of `old` into the link table of `new`
    fn alter_link(
        &self,
        editor: &mut SchemaEditor<'_>,
        table: &Table,
        old: &ColumnDefinition,
        new: &ColumnDefinition,
        strict: bool,
    ) -> Result<(), SchemaError>;

    /// Create the link table of a new many-to-many column
    fn create_link_table(
        &self,
        editor: &mut SchemaEditor<'_>,
        table: &Table,
        column: &ColumnDefinition,
    ) -> Result<(), SchemaError> {
        let link = link_of(table, column)?;
        editor.create_link_table(link)
    }
}

/// Default rebuild: rename the link table if needed, then alter its far-side column
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkTableRebuild;

impl RelationRebuild for LinkTableRebuild {
    fn alter_link(
        &self,
        editor: &mut SchemaEditor<'_>,
        table: &Table,
        old: &ColumnDefinition,
        new: &ColumnDefinition,
        strict: bool,
    ) -> Result<(), SchemaError> {
        let old_link = link_of(table, old)?;
        let new_link = link_of(table, new)?;

        if old_link.table != new_link.table {
            editor.rename_table(&old_link.table, &new_link.table)?;
        }
        editor.alter_field(
            &Table::new(new_link.table.clone()),
            &old_link.reverse,
            &new_link.reverse,
            strict,
        )
    }
}

fn link_of<'c>(table: &Table, column: &'c ColumnDefinition) -> Result<&'c LinkTable, SchemaError> {
    column
        .link_table()
        .ok_or_else(|| SchemaError::IncompatibleAlteration {
            table: table.name.clone(),
            column: column.name.clone(),
            reason: "not a many-to-many relation".into(),
        })
}

impl SchemaEditor<'_> {
    /// Alter a many-to-many relation through its link table
    ///
    /// Both sides must describe implicitly managed link tables. The link
    /// table's foreign keys are dropped, keys on the far-side column are
    /// deferred, `rebuild` runs, and the keys and foreign keys are put back.
    pub fn alter_relation(
        &mut self,
        table: &Table,
        old: &ColumnDefinition,
        new: &ColumnDefinition,
        strict: bool,
        rebuild: &dyn RelationRebuild,
    ) -> Result<(), SchemaError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::alter_relation_span(&table.name, &old.name).entered();

        let old_link = link_of(table, old)?;
        let new_link = link_of(table, new)?;
        if !old_link.auto_created || !new_link.auto_created {
            return Err(SchemaError::IncompatibleAlteration {
                table: table.name.clone(),
                column: old.name.clone(),
                reason: "only implicitly managed link tables can be altered".into(),
            });
        }

        let link_name = &old_link.table;
        let snapshot = self.constraints(link_name)?;
        for fk in snapshot.iter().filter(|c| c.kind == ConstraintKind::ForeignKey) {
            let undo = [&old_link.source, &old_link.reverse]
                .into_iter()
                .find(|c| fk.matches_columns(&[c.name.as_str()]))
                .and_then(|c| c.foreign_key())
                .map(|target| Ddl::AddForeignKey {
                    table: link_name.clone(),
                    name: fk.name.clone(),
                    columns: fk.columns.clone(),
                    to_table: target.table.clone(),
                    to_column: target.column.clone(),
                });
            self.run_with_undo(
                &Ddl::DropConstraint {
                    table: link_name.clone(),
                    name: fk.name.clone(),
                },
                undo.as_ref(),
            )?;
        }

        let outcome = self.defer_constraints(link_name, &snapshot, &old_link.reverse.name, DEFERRED_KINDS)?;
        self.reorganize_pending()?;

        rebuild.alter_link(self, table, old, new, strict)?;

        self.restore_constraints(
            &new_link.table,
            &outcome.deferred,
            &old_link.reverse.name,
            &new_link.reverse.name,
        )?;
        self.restore_link_foreign_keys(new_link)?;

        log::info!("altered relation {}.{} through {}", table.name, new.name, new_link.table);
        Ok(())
    }

    /// Create a link table: identity key, both relation columns, their
    /// composite unique constraint and foreign keys
    pub fn create_link_table(&mut self, link: &LinkTable) -> Result<(), SchemaError> {
        let name = &link.table;
        let mut columns = vec![(
            "id".to_string(),
            format!(
                "INTEGER NOT NULL {}",
                identity_clause(1, self.config().identity_cache)
            ),
        )];
        for column in [&link.source, &link.reverse] {
            let storage_type = column
                .resolved_type()
                .ok_or_else(|| SchemaError::IncompatibleAlteration {
                    table: name.clone(),
                    column: column.name.clone(),
                    reason: "link table column has no storage type".into(),
                })?;
            columns.push((column.name.clone(), format!("{} NOT NULL", storage_type)));
        }

        self.run(&Ddl::CreateTable {
            table: name.clone(),
            columns,
            primary_key: Some((self.constraint_name(name, &["id"], "_pk"), vec!["id".to_string()])),
        })?;
        self.run(&Ddl::AddUnique {
            table: name.clone(),
            name: self.constraint_name(name, &[link.source.name.as_str(), link.reverse.name.as_str()], "_uniq"),
            columns: vec![link.source.name.clone(), link.reverse.name.clone()],
        })?;
        for column in [&link.source, &link.reverse] {
            if let Some(target) = column.foreign_key() {
                self.run(&Ddl::AddForeignKey {
                    table: name.clone(),
                    name: self.constraint_name(name, &[column.name.as_str()], "_fk"),
                    columns: vec![column.name.clone()],
                    to_table: target.table.clone(),
                    to_column: target.column.clone(),
                })?;
            }
        }

        log::info!("created link table {}", name);
        Ok(())
    }

    /// Recreate the foreign keys of the link table's columns that the rebuild
    /// did not already recreate
    fn restore_link_foreign_keys(&mut self, link: &LinkTable) -> Result<(), SchemaError> {
        let existing = self.constraints(&link.table)?;
        for column in [&link.source, &link.reverse] {
            let Some(target) = column.foreign_key() else {
                continue;
            };
            let present = existing
                .iter()
                .any(|c| c.kind == ConstraintKind::ForeignKey && c.matches_columns(&[column.name.as_str()]));
            if !present {
                self.run(&Ddl::AddForeignKey {
                    table: link.table.clone(),
                    name: self.constraint_name(&link.table, &[column.name.as_str()], "_fk"),
                    columns: vec![column.name.clone()],
                    to_table: target.table.clone(),
                    to_column: target.column.clone(),
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RecordingExecutor;
    use crate::schema::{Constraint, TableName};

    fn link(table: &str, reverse: &str) -> LinkTable {
        LinkTable {
            table: TableName::new(table),
            source: ColumnDefinition::new("book_id", "INTEGER")
                .not_null()
                .references(TableName::new("book"), "id"),
            reverse: ColumnDefinition::new(reverse, "INTEGER")
                .not_null()
                .references(TableName::new("author"), "id"),
            auto_created: true,
        }
    }

    fn books() -> Table {
        Table::new(TableName::new("book"))
    }

    #[test]
    fn test_create_link_table() {
        let executor = RecordingExecutor::new();
        let mut editor = SchemaEditor::new(&executor);

        editor
            .add_column(&books(), &ColumnDefinition::many_to_many("authors", link("book_authors", "author_id")))
            .unwrap();

        assert_eq!(
            executor.statements(),
            vec![
                "CREATE TABLE \"book_authors\" (\"id\" INTEGER NOT NULL GENERATED BY DEFAULT AS IDENTITY (START WITH 1, INCREMENT BY 1, CACHE 10 ORDER), \"book_id\" INTEGER NOT NULL, \"author_id\" INTEGER NOT NULL, CONSTRAINT \"book_authors_id_pk\" PRIMARY KEY (\"id\"))".to_string(),
                "ALTER TABLE \"book_authors\" ADD CONSTRAINT \"book_authors_book_id_author_id_uniq\" UNIQUE (\"book_id\", \"author_id\")".to_string(),
                "ALTER TABLE \"book_authors\" ADD CONSTRAINT \"book_authors_book_id_fk\" FOREIGN KEY (\"book_id\") REFERENCES \"book\" (\"id\")".to_string(),
                "ALTER TABLE \"book_authors\" ADD CONSTRAINT \"book_authors_author_id_fk\" FOREIGN KEY (\"author_id\") REFERENCES \"author\" (\"id\")".to_string(),
            ]
        );
    }

    #[test]
    fn test_remove_many_to_many_drops_link_table() {
        let executor = RecordingExecutor::new();
        let mut editor = SchemaEditor::new(&executor);

        editor
            .remove_column(&books(), &ColumnDefinition::many_to_many("authors", link("book_authors", "author_id")))
            .unwrap();
        assert_eq!(executor.statements(), vec!["DROP TABLE \"book_authors\"".to_string()]);
    }

    #[test]
    fn test_alter_relation_renames_far_side_column() {
        let old_link = link("book_authors", "author_id");
        let executor = RecordingExecutor::new().with_constraints(
            &old_link.table,
            vec![
                Constraint::primary_key("book_authors_id_pk", &["id"]),
                Constraint::unique("book_authors_uniq", &["book_id", "author_id"]),
                Constraint::foreign_key("book_authors_book_fk", &["book_id"], TableName::new("book")),
                Constraint::foreign_key("book_authors_author_fk", &["author_id"], TableName::new("author")),
            ],
        );
        let mut editor = SchemaEditor::new(&executor);
        let old = ColumnDefinition::many_to_many("authors", old_link);
        let new = ColumnDefinition::many_to_many("authors", link("book_authors", "writer_id"));

        editor.alter_field(&books(), &old, &new, false).unwrap();

        assert_eq!(
            executor.statements(),
            vec![
                "ALTER TABLE \"book_authors\" DROP CONSTRAINT \"book_authors_book_fk\"".to_string(),
                "ALTER TABLE \"book_authors\" DROP CONSTRAINT \"book_authors_author_fk\"".to_string(),
                "ALTER TABLE \"book_authors\" DROP CONSTRAINT \"book_authors_uniq\"".to_string(),
                "ALTER TABLE \"book_authors\" RENAME COLUMN \"author_id\" TO \"writer_id\"".to_string(),
                "ALTER TABLE \"book_authors\" ADD CONSTRAINT \"book_authors_writer_id_fk\" FOREIGN KEY (\"writer_id\") REFERENCES \"author\" (\"id\")".to_string(),
                "ALTER TABLE \"book_authors\" ADD CONSTRAINT \"book_authors_uniq\" UNIQUE (\"book_id\", \"writer_id\")".to_string(),
                "ALTER TABLE \"book_authors\" ADD CONSTRAINT \"book_authors_book_id_fk\" FOREIGN KEY (\"book_id\") REFERENCES \"book\" (\"id\")".to_string(),
            ]
        );
    }

    #[test]
    fn test_alter_relation_renames_link_table() {
        let executor = RecordingExecutor::new();
        let mut editor = SchemaEditor::new(&executor);
        let old = ColumnDefinition::many_to_many("authors", link("book_authors", "author_id"));
        let new = ColumnDefinition::many_to_many("authors", link("book_writers", "author_id"));

        editor.alter_relation(&books(), &old, &new, false, &LinkTableRebuild).unwrap();

        let statements = executor.statements();
        assert_eq!(statements[0], "RENAME TABLE \"book_authors\" TO \"book_writers\"");
        assert_eq!(statements.len(), 3);
        assert!(statements[1].starts_with("ALTER TABLE \"book_writers\" ADD CONSTRAINT \"book_writers_book_id_fk\""));
    }

    #[test]
    fn test_user_declared_link_table_is_rejected() {
        let executor = RecordingExecutor::new();
        let mut editor = SchemaEditor::new(&executor);
        let mut declared = link("book_authors", "author_id");
        declared.auto_created = false;
        let old = ColumnDefinition::many_to_many("authors", declared.clone());

        let err = editor
            .alter_relation(&books(), &old, &old.clone(), false, &LinkTableRebuild)
            .unwrap_err();
        assert!(matches!(err, SchemaError::IncompatibleAlteration { .. }));
    }
}
