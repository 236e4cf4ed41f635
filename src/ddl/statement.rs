//! DB2 statement templates
//!
//! Each primitive operation the schema editor performs is one [`Ddl`] variant.
//! `Display` renders the statement text with every table, column and
//! constraint name quoted.

use super::names::quote_name;
use crate::schema::TableName;
use crate::value::{format_literal, Literal};
use std::fmt;

/// Identity clause used for new identity columns and identity conversions
pub fn identity_clause(start: i64, cache: u32) -> String {
    format!(
        "GENERATED BY DEFAULT AS IDENTITY (START WITH {}, INCREMENT BY 1, CACHE {} ORDER)",
        start, cache
    )
}

/// One DDL/DML statement issued by the schema editor
#[derive(Debug, Clone, PartialEq)]
pub enum Ddl {
    AddColumn { table: TableName, column: String, definition: String },
    DropColumn { table: TableName, column: String },
    RenameColumn { table: TableName, old: String, new: String },
    SetDataType { table: TableName, column: String, storage_type: String },
    SetIdentity { table: TableName, column: String, start: i64, cache: u32 },
    DropIdentity { table: TableName, column: String },
    SetNotNull { table: TableName, column: String },
    DropNotNull { table: TableName, column: String },
    /// `value` is already a formatted literal
    SetDefault { table: TableName, column: String, value: String },
    DropDefault { table: TableName, column: String },
    AddPrimaryKey { table: TableName, name: String, columns: Vec<String> },
    DropPrimaryKey { table: TableName },
    DropConstraint { table: TableName, name: String },
    AddUnique { table: TableName, name: String, columns: Vec<String> },
    CreateIndex { table: TableName, name: String, columns: Vec<String> },
    DropIndex { table: TableName, name: String },
    AddCheck { table: TableName, name: String, expression: String },
    AddForeignKey {
        table: TableName,
        name: String,
        columns: Vec<String>,
        to_table: TableName,
        to_column: String,
    },
    /// Copy every row's value from `source` into `target`
    CopyColumn { table: TableName, target: String, source: String },
    SelectMax { table: TableName, column: String },
    RenameTable { old: TableName, new: TableName },
    DropTable { table: TableName },
    /// `columns` are complete column definitions; `primary_key` names the key constraint
    CreateTable {
        table: TableName,
        columns: Vec<(String, String)>,
        primary_key: Option<(String, Vec<String>)>,
    },
    Reorg { table: TableName },
}

impl Ddl {
    /// Statement that undoes this one, when it can be derived from the statement alone
    ///
    /// Drops of existing objects return `None`; callers that know the dropped
    /// definition attach their own undo.
    pub fn inverse(&self) -> Option<Ddl> {
        let inverse = match self {
            Ddl::AddColumn { table, column, .. } => Ddl::DropColumn {
                table: table.clone(),
                column: column.clone(),
            },
            Ddl::RenameColumn { table, old, new } => Ddl::RenameColumn {
                table: table.clone(),
                old: new.clone(),
                new: old.clone(),
            },
            Ddl::SetNotNull { table, column } => Ddl::DropNotNull {
                table: table.clone(),
                column: column.clone(),
            },
            Ddl::DropNotNull { table, column } => Ddl::SetNotNull {
                table: table.clone(),
                column: column.clone(),
            },
            Ddl::AddPrimaryKey { table, .. } => Ddl::DropPrimaryKey { table: table.clone() },
            Ddl::AddUnique { table, name, .. }
            | Ddl::AddCheck { table, name, .. }
            | Ddl::AddForeignKey { table, name, .. } => Ddl::DropConstraint {
                table: table.clone(),
                name: name.clone(),
            },
            Ddl::CreateIndex { table, name, .. } => Ddl::DropIndex {
                table: table.clone(),
                name: name.clone(),
            },
            Ddl::RenameTable { old, new } => Ddl::RenameTable {
                old: new.clone(),
                new: old.clone(),
            },
            Ddl::CreateTable { table, .. } => Ddl::DropTable { table: table.clone() },
            _ => return None,
        };
        Some(inverse)
    }

    /// Table the statement applies to
    pub fn table(&self) -> &TableName {
        match self {
            Ddl::AddColumn { table, .. }
            | Ddl::DropColumn { table, .. }
            | Ddl::RenameColumn { table, .. }
            | Ddl::SetDataType { table, .. }
            | Ddl::SetIdentity { table, .. }
            | Ddl::DropIdentity { table, .. }
            | Ddl::SetNotNull { table, .. }
            | Ddl::DropNotNull { table, .. }
            | Ddl::SetDefault { table, .. }
            | Ddl::DropDefault { table, .. }
            | Ddl::AddPrimaryKey { table, .. }
            | Ddl::DropPrimaryKey { table }
            | Ddl::DropConstraint { table, .. }
            | Ddl::AddUnique { table, .. }
            | Ddl::CreateIndex { table, .. }
            | Ddl::DropIndex { table, .. }
            | Ddl::AddCheck { table, .. }
            | Ddl::AddForeignKey { table, .. }
            | Ddl::CopyColumn { table, .. }
            | Ddl::SelectMax { table, .. }
            | Ddl::DropTable { table }
            | Ddl::CreateTable { table, .. }
            | Ddl::Reorg { table } => table,
            Ddl::RenameTable { old, .. } => old,
        }
    }
}

fn column_list(columns: &[String]) -> String {
    columns.iter().map(|c| quote_name(c)).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for Ddl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ddl::AddColumn { table, column, definition } => write!(
                f,
                "ALTER TABLE {} ADD COLUMN {} {}",
                table.quoted(),
                quote_name(column),
                definition
            ),
            Ddl::DropColumn { table, column } => {
                write!(f, "ALTER TABLE {} DROP COLUMN {}", table.quoted(), quote_name(column))
            }
            Ddl::RenameColumn { table, old, new } => write!(
                f,
                "ALTER TABLE {} RENAME COLUMN {} TO {}",
                table.quoted(),
                quote_name(old),
                quote_name(new)
            ),
            Ddl::SetDataType { table, column, storage_type } => write!(
                f,
                "ALTER TABLE {} ALTER COLUMN {} SET DATA TYPE {}",
                table.quoted(),
                quote_name(column),
                storage_type
            ),
            Ddl::SetIdentity { table, column, start, cache } => write!(
                f,
                "ALTER TABLE {} ALTER COLUMN {} SET {}",
                table.quoted(),
                quote_name(column),
                identity_clause(*start, *cache)
            ),
            Ddl::DropIdentity { table, column } => write!(
                f,
                "ALTER TABLE {} ALTER COLUMN {} DROP IDENTITY",
                table.quoted(),
                quote_name(column)
            ),
            Ddl::SetNotNull { table, column } => write!(
                f,
                "ALTER TABLE {} ALTER COLUMN {} SET NOT NULL",
                table.quoted(),
                quote_name(column)
            ),
            Ddl::DropNotNull { table, column } => write!(
                f,
                "ALTER TABLE {} ALTER COLUMN {} DROP NOT NULL",
                table.quoted(),
                quote_name(column)
            ),
            Ddl::SetDefault { table, column, value } => write!(
                f,
                "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {}",
                table.quoted(),
                quote_name(column),
                value
            ),
            Ddl::DropDefault { table, column } => write!(
                f,
                "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT",
                table.quoted(),
                quote_name(column)
            ),
            Ddl::AddPrimaryKey { table, name, columns } => write!(
                f,
                "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({})",
                table.quoted(),
                quote_name(name),
                column_list(columns)
            ),
            Ddl::DropPrimaryKey { table } => {
                write!(f, "ALTER TABLE {} DROP PRIMARY KEY", table.quoted())
            }
            Ddl::DropConstraint { table, name } => {
                write!(f, "ALTER TABLE {} DROP CONSTRAINT {}", table.quoted(), quote_name(name))
            }
            Ddl::AddUnique { table, name, columns } => write!(
                f,
                "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({})",
                table.quoted(),
                quote_name(name),
                column_list(columns)
            ),
            Ddl::CreateIndex { table, name, columns } => write!(
                f,
                "CREATE INDEX {} ON {} ({})",
                table.quote_sibling(name),
                table.quoted(),
                column_list(columns)
            ),
            Ddl::DropIndex { table, name } => write!(f, "DROP INDEX {}", table.quote_sibling(name)),
            Ddl::AddCheck { table, name, expression } => write!(
                f,
                "ALTER TABLE {} ADD CONSTRAINT {} CHECK ({})",
                table.quoted(),
                quote_name(name),
                expression
            ),
            Ddl::AddForeignKey { table, name, columns, to_table, to_column } => write!(
                f,
                "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
                table.quoted(),
                quote_name(name),
                column_list(columns),
                to_table.quoted(),
                quote_name(to_column)
            ),
            Ddl::CopyColumn { table, target, source } => write!(
                f,
                "UPDATE {} SET {} = {}",
                table.quoted(),
                quote_name(target),
                quote_name(source)
            ),
            Ddl::SelectMax { table, column } => {
                write!(f, "SELECT MAX({}) FROM {}", quote_name(column), table.quoted())
            }
            Ddl::RenameTable { old, new } => {
                // DB2 takes an unqualified target name
                write!(f, "RENAME TABLE {} TO {}", old.quoted(), quote_name(&new.name))
            }
            Ddl::DropTable { table } => write!(f, "DROP TABLE {}", table.quoted()),
            Ddl::CreateTable { table, columns, primary_key } => {
                let mut parts: Vec<String> = columns
                    .iter()
                    .map(|(name, definition)| format!("{} {}", quote_name(name), definition))
                    .collect();
                if let Some((name, key)) = primary_key {
                    parts.push(format!(
                        "CONSTRAINT {} PRIMARY KEY ({})",
                        quote_name(name),
                        column_list(key)
                    ));
                }
                write!(f, "CREATE TABLE {} ({})", table.quoted(), parts.join(", "))
            }
            Ddl::Reorg { table } => {
                let command = format!("REORG TABLE {}", table.quoted());
                write!(f, "CALL SYSPROC.ADMIN_CMD({})", format_literal(&Literal::Text(command)))
            }
        }
    }
}
