//! SchemaEditor - executes schema changes against DB2

use super::error::SchemaError;
use super::journal::{Journal, JournalEntry, SchemaWarning};
use crate::config::EditorConfig;
use crate::ddl::{truncate_name, Ddl};
use crate::executor::{Row, SchemaExecutor};
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
use crate::schema::TableName;
use crate::value::Literal;
use chrono::Utc;
use std::path::Path;
use std::time::Instant;

/// SchemaEditor plans and executes column and constraint changes
///
/// The editor wraps a [`SchemaExecutor`] and issues statements one at a time.
/// Every operation takes the table it applies to as a parameter; the only
/// state kept between calls is the [`Journal`] of executed statements.
///
/// # Example
///
/// ```
/// use lifeguard_db2::executor::RecordingExecutor;
/// use lifeguard_db2::migration::SchemaEditor;
/// use lifeguard_db2::schema::{ColumnDefinition, Table, TableName};
///
/// let executor = RecordingExecutor::new();
/// let mut editor = SchemaEditor::new(&executor);
/// let table = Table::new(TableName::new("orders"));
///
/// let old = ColumnDefinition::new("note", "VARCHAR(200)");
/// let new = old.clone().not_null();
/// editor.alter_field(&table, &old, &new, false).unwrap();
///
/// assert_eq!(
///     executor.statements(),
///     vec!["ALTER TABLE \"orders\" ALTER COLUMN \"note\" SET NOT NULL"]
/// );
/// ```
pub struct SchemaEditor<'a> {
    executor: &'a dyn SchemaExecutor,
    config: EditorConfig,
    journal: Journal,
}

impl<'a> SchemaEditor<'a> {
    /// Create an editor with the default configuration
    pub fn new(executor: &'a dyn SchemaExecutor) -> Self {
        Self::with_config(executor, EditorConfig::default())
    }

    pub fn with_config(executor: &'a dyn SchemaExecutor, config: EditorConfig) -> Self {
        Self {
            executor,
            config,
            journal: Journal::new(),
        }
    }

    /// Create an editor configured from `config/db2.toml` and `LIFEGUARD_DB2__*` variables
    pub fn from_env(executor: &'a dyn SchemaExecutor) -> Result<Self, SchemaError> {
        Ok(Self::with_config(executor, EditorConfig::load()?))
    }

    /// Create an editor configured from the TOML file at `path`
    pub fn from_config_file(executor: &'a dyn SchemaExecutor, path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        Ok(Self::with_config(executor, EditorConfig::load_from(path)?))
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Get a reference to the underlying executor
    pub fn executor(&self) -> &dyn SchemaExecutor {
        self.executor
    }

    /// Statements executed and warnings raised so far
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Hand over the journal, leaving an empty one in its place
    pub fn take_journal(&mut self) -> Journal {
        std::mem::take(&mut self.journal)
    }

    /// Rename a table
    pub fn rename_table(&mut self, old: &TableName, new: &TableName) -> Result<(), SchemaError> {
        self.run(&Ddl::RenameTable {
            old: old.clone(),
            new: new.clone(),
        })
        .map(|_| ())
    }

    /// Drop a table
    pub fn delete_table(&mut self, table: &TableName) -> Result<(), SchemaError> {
        self.run(&Ddl::DropTable { table: table.clone() }).map(|_| ())
    }

    /// Execute a statement, journaling it with its derived inverse
    pub(crate) fn run(&mut self, ddl: &Ddl) -> Result<u64, SchemaError> {
        let undo = ddl.inverse();
        self.run_with_undo(ddl, undo.as_ref())
    }

    /// Execute a statement, journaling it with an explicit undo statement
    pub(crate) fn run_with_undo(&mut self, ddl: &Ddl, undo: Option<&Ddl>) -> Result<u64, SchemaError> {
        let sql = ddl.to_string();
        log::debug!("executing on {}: {}", ddl.table(), sql);

        let executed_at = Utc::now();
        let started = Instant::now();
        let affected = self
            .executor
            .execute(&sql, &[])
            .map_err(|source| SchemaError::StatementExecution {
                sql: sql.clone(),
                source,
            })?;
        let elapsed = started.elapsed();

        #[cfg(feature = "metrics")]
        METRICS.record_statement(elapsed);

        self.journal.record(JournalEntry::new(
            sql,
            undo.map(ToString::to_string),
            executed_at,
            elapsed.as_millis() as i64,
        ));
        Ok(affected)
    }

    pub(crate) fn query(&self, sql: &str, params: &[Literal]) -> Result<Vec<Row>, SchemaError> {
        self.executor
            .query_all(sql, params)
            .map_err(|source| SchemaError::StatementExecution {
                sql: sql.to_string(),
                source,
            })
    }

    pub(crate) fn warn(&mut self, warning: SchemaWarning) {
        log::warn!("{}: {}", warning.table, warning.message);
        self.journal.warn(warning);
    }

    /// Name of the temporary column used while remaking `column`
    pub(crate) fn pseudo_column_name(&self, column: &str) -> String {
        truncate_name(
            &format!("{}{}", self.config.pseudo_column_prefix, column),
            self.config.max_name_length,
        )
    }

    /// Generated constraint name `<table>_<columns><suffix>` within the name limit
    pub(crate) fn constraint_name(&self, table: &TableName, columns: &[&str], suffix: &str) -> String {
        crate::ddl::constraint_name(&table.name, columns, suffix, self.config.max_name_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RecordingExecutor;

    #[test]
    fn test_statements_are_journaled_with_undo() {
        let executor = RecordingExecutor::new();
        let mut editor = SchemaEditor::new(&executor);
        let old = TableName::new("orders");
        let new = TableName::new("purchase_orders");

        editor.rename_table(&old, &new).unwrap();

        let journal = editor.journal();
        assert_eq!(journal.statements(), vec!["RENAME TABLE \"orders\" TO \"purchase_orders\""]);
        assert_eq!(
            journal.rollback_plan(),
            vec!["RENAME TABLE \"purchase_orders\" TO \"orders\"".to_string()]
        );
    }

    #[test]
    fn test_editor_from_config_file() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db2.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[schema_editor]\nauto_reorg = false").unwrap();

        let executor = RecordingExecutor::new();
        let editor = SchemaEditor::from_config_file(&executor, &path).unwrap();
        assert!(!editor.config().auto_reorg);

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[schema_editor]\nmax_name_length = 4").unwrap();
        let err = SchemaEditor::from_config_file(&executor, &path).err();
        assert!(matches!(err, Some(SchemaError::Config(_))));
    }

    #[test]
    fn test_failed_statement_is_not_journaled() {
        let executor = RecordingExecutor::new().fail_on("DROP TABLE");
        let mut editor = SchemaEditor::new(&executor);

        let err = editor.delete_table(&TableName::new("orders")).unwrap_err();
        assert!(matches!(err, SchemaError::StatementExecution { .. }));
        assert!(editor.journal().is_empty());
    }

    #[test]
    fn test_take_journal_resets() {
        let executor = RecordingExecutor::new();
        let mut editor = SchemaEditor::new(&executor);
        editor.delete_table(&TableName::new("orders")).unwrap();

        let journal = editor.take_journal();
        assert_eq!(journal.len(), 1);
        assert!(editor.journal().is_empty());
    }

    #[test]
    fn test_pseudo_column_name_is_truncated() {
        let executor = RecordingExecutor::new();
        let config = EditorConfig {
            max_name_length: 18,
            ..EditorConfig::default()
        };
        let editor = SchemaEditor::with_config(&executor, config);
        assert_eq!(editor.pseudo_column_name("body"), "pseudo_body");
        assert_eq!(editor.pseudo_column_name("a_rather_long_column").chars().count(), 18);
    }
}
