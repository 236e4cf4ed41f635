//! Table reorganizer
//!
//! Some DB2 ALTER TABLE statements leave the table in reorg-pending state, in
//! which further structural changes are rejected until `REORG TABLE` runs.

use super::error::SchemaError;
use super::schema_editor::SchemaEditor;
use crate::ddl::Ddl;
use crate::executor::EngineError;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
use crate::schema::TableName;

/// Tables currently flagged reorg-pending
pub const PENDING_REORG_QUERY: &str =
    "SELECT TABSCHEMA, TABNAME FROM SYSIBMADM.ADMINTABINFO WHERE REORG_PENDING = 'Y'";

impl SchemaEditor<'_> {
    /// Reorganize every reorg-pending table, in the order the engine lists them
    ///
    /// Returns the number of tables reorganized. Does nothing when
    /// `auto_reorg` is disabled.
    pub fn reorganize_pending(&mut self) -> Result<usize, SchemaError> {
        if !self.config().auto_reorg {
            return Ok(0);
        }
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::reorg_span().entered();

        let rows = self.query(PENDING_REORG_QUERY, &[])?;
        let mut pending = Vec::with_capacity(rows.len());
        for row in &rows {
            let (Some(schema), Some(name)) = (row.get_str(0), row.get_str(1)) else {
                return Err(SchemaError::StatementExecution {
                    sql: PENDING_REORG_QUERY.to_string(),
                    source: EngineError::Decode("reorg-pending row without schema and table".into()),
                });
            };
            pending.push(TableName::qualified(schema, name));
        }

        for table in &pending {
            self.run(&Ddl::Reorg { table: table.clone() })?;
            log::info!("reorganized table {}", table);
            #[cfg(feature = "metrics")]
            METRICS.record_reorg();
        }
        Ok(pending.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::executor::{RecordingExecutor, Row};
    use crate::value::Literal;

    fn pending(rows: &[(&str, &str)]) -> RecordingExecutor {
        RecordingExecutor::new().with_rows(
            "SYSIBMADM.ADMINTABINFO",
            rows.iter()
                .map(|(s, t)| Row::new(vec![Literal::text(*s), Literal::text(*t)]))
                .collect(),
        )
    }

    #[test]
    fn test_reorganizes_in_engine_order() {
        let executor = pending(&[("SHOP    ", "ORDERS"), ("CRM", "CUSTOMER")]);
        let mut editor = SchemaEditor::new(&executor);

        assert_eq!(editor.reorganize_pending().unwrap(), 2);
        assert_eq!(
            executor.statements(),
            vec![
                "CALL SYSPROC.ADMIN_CMD('REORG TABLE \"SHOP\".\"ORDERS\"')".to_string(),
                "CALL SYSPROC.ADMIN_CMD('REORG TABLE \"CRM\".\"CUSTOMER\"')".to_string(),
            ]
        );
    }

    #[test]
    fn test_nothing_pending_is_a_no_op() {
        let executor = RecordingExecutor::new();
        let mut editor = SchemaEditor::new(&executor);
        assert_eq!(editor.reorganize_pending().unwrap(), 0);
        assert!(executor.statements().is_empty());
        assert_eq!(executor.queries().len(), 1);
    }

    #[test]
    fn test_disabled_auto_reorg_skips_query() {
        let executor = pending(&[("SHOP", "ORDERS")]);
        let config = EditorConfig {
            auto_reorg: false,
            ..EditorConfig::default()
        };
        let mut editor = SchemaEditor::with_config(&executor, config);
        assert_eq!(editor.reorganize_pending().unwrap(), 0);
        assert!(executor.queries().is_empty());
    }

    #[test]
    fn test_failed_reorg_propagates() {
        let executor = pending(&[("SHOP", "ORDERS")]).fail_on("REORG TABLE");
        let mut editor = SchemaEditor::new(&executor);
        assert!(editor.reorganize_pending().is_err());
    }
}
