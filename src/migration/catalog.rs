//! Constraint catalog reader
//!
//! Reads primary keys, unique constraints, foreign keys, check constraints
//! and plain indexes of a table from the DB2 `SYSCAT` views.

use super::error::SchemaError;
use super::schema_editor::SchemaEditor;
use crate::executor::{EngineError, Row, SchemaExecutor};
use crate::schema::{Constraint, ConstraintKind, TableName};
use crate::value::Literal;

const KEY_CONSTRAINTS_QUERY: &str = "SELECT TC.CONSTNAME, TC.TYPE, K.COLNAME, R.REFTABSCHEMA, R.REFTABNAME \
     FROM SYSCAT.TABCONST TC \
     LEFT JOIN SYSCAT.KEYCOLUSE K ON K.CONSTNAME = TC.CONSTNAME AND K.TABSCHEMA = TC.TABSCHEMA AND K.TABNAME = TC.TABNAME \
     LEFT JOIN SYSCAT.REFERENCES R ON R.CONSTNAME = TC.CONSTNAME AND R.TABSCHEMA = TC.TABSCHEMA AND R.TABNAME = TC.TABNAME \
     WHERE TC.TABSCHEMA = {schema} AND TC.TABNAME = ? AND TC.TYPE IN ('P', 'U', 'F') \
     ORDER BY TC.CONSTNAME, K.COLSEQ";

const CHECK_CONSTRAINTS_QUERY: &str = "SELECT C.CONSTNAME, CC.COLNAME, C.TEXT \
     FROM SYSCAT.CHECKS C \
     LEFT JOIN SYSCAT.COLCHECKS CC ON CC.CONSTNAME = C.CONSTNAME AND CC.TABSCHEMA = C.TABSCHEMA AND CC.TABNAME = C.TABNAME \
     WHERE C.TABSCHEMA = {schema} AND C.TABNAME = ? AND C.TYPE = 'C' \
     ORDER BY C.CONSTNAME, CC.COLNAME";

// UNIQUERULE 'D' excludes indexes backing primary keys and unique constraints
const INDEXES_QUERY: &str = "SELECT I.INDNAME, IC.COLNAME \
     FROM SYSCAT.INDEXES I \
     JOIN SYSCAT.INDEXCOLUSE IC ON IC.INDSCHEMA = I.INDSCHEMA AND IC.INDNAME = I.INDNAME \
     WHERE I.TABSCHEMA = {schema} AND I.TABNAME = ? AND I.UNIQUERULE = 'D' \
     ORDER BY I.INDNAME, IC.COLSEQ";

/// Fill in the schema filter and parameters for one of the catalog queries
fn bind(template: &str, table: &TableName) -> (String, Vec<Literal>) {
    match &table.schema {
        Some(schema) => (
            template.replace("{schema}", "?"),
            vec![Literal::text(schema.as_str()), Literal::text(table.name.as_str())],
        ),
        None => (
            template.replace("{schema}", "CURRENT SCHEMA"),
            vec![Literal::text(table.name.as_str())],
        ),
    }
}

fn required_str<'r>(row: &'r Row, idx: usize, what: &str) -> Result<&'r str, EngineError> {
    row.get_str(idx)
        .ok_or_else(|| EngineError::Decode(format!("catalog row is missing {}", what)))
}

/// Append `column` to the last constraint when it continues the same one,
/// otherwise start a new constraint
fn push_grouped(
    constraints: &mut Vec<Constraint>,
    name: &str,
    kind: ConstraintKind,
    column: Option<&str>,
) -> usize {
    let continues = constraints
        .last()
        .is_some_and(|c| c.name == name && c.kind == kind);
    if !continues {
        constraints.push(Constraint::new(name, kind, &[]));
    }
    let idx = constraints.len() - 1;
    if let Some(column) = column {
        constraints[idx].columns.push(column.to_string());
    }
    idx
}

/// Read every named constraint of `table` from the `SYSCAT` views
///
/// Constraints are returned grouped by kind (keys and foreign keys, then
/// checks, then indexes) and by name within each kind, with columns in key
/// order.
///
/// # Errors
///
/// Returns `EngineError` if a query fails or a row cannot be decoded.
pub fn read_constraints<E: SchemaExecutor + ?Sized>(
    executor: &E,
    table: &TableName,
) -> Result<Vec<Constraint>, EngineError> {
    let mut constraints = Vec::new();

    let (sql, params) = bind(KEY_CONSTRAINTS_QUERY, table);
    for row in executor.query_all(&sql, &params)? {
        let name = required_str(&row, 0, "constraint name")?;
        let code = required_str(&row, 1, "constraint type")?;
        let kind = ConstraintKind::from_catalog_code(code)
            .ok_or_else(|| EngineError::Decode(format!("unknown constraint type '{}'", code)))?;
        let idx = push_grouped(&mut constraints, name, kind, row.get_str(2));

        if kind == ConstraintKind::ForeignKey && constraints[idx].references.is_none() {
            if let Some(ref_table) = row.get_str(4) {
                constraints[idx].references = Some(match row.get_str(3) {
                    Some(ref_schema) => TableName::qualified(ref_schema, ref_table),
                    None => TableName::new(ref_table),
                });
            }
        }
    }

    let (sql, params) = bind(CHECK_CONSTRAINTS_QUERY, table);
    for row in executor.query_all(&sql, &params)? {
        let name = required_str(&row, 0, "constraint name")?;
        let idx = push_grouped(&mut constraints, name, ConstraintKind::Check, row.get_str(1));
        if constraints[idx].check.is_none() {
            constraints[idx].check = row.get_str(2).map(|text| text.trim().to_string());
        }
    }

    let (sql, params) = bind(INDEXES_QUERY, table);
    for row in executor.query_all(&sql, &params)? {
        let name = required_str(&row, 0, "index name")?;
        push_grouped(&mut constraints, name, ConstraintKind::Index, row.get_str(1));
    }

    Ok(constraints)
}

impl SchemaEditor<'_> {
    /// Full constraint catalog of `table`
    pub fn constraints(&self, table: &TableName) -> Result<Vec<Constraint>, SchemaError> {
        self.executor()
            .constraints(table)
            .map_err(|source| SchemaError::Catalog {
                table: table.clone(),
                source,
            })
    }

    /// Names of the constraints of `kind` whose column list is exactly `columns`
    pub fn constraint_names(
        &self,
        table: &TableName,
        columns: &[&str],
        kind: ConstraintKind,
    ) -> Result<Vec<String>, SchemaError> {
        Ok(self
            .constraints(table)?
            .into_iter()
            .filter(|c| c.kind == kind && c.matches_columns(columns))
            .map(|c| c.name)
            .collect())
    }

    /// Every primary key constraint on `table`, whatever its columns
    pub fn primary_keys(&self, table: &TableName) -> Result<Vec<Constraint>, SchemaError> {
        Ok(self
            .constraints(table)?
            .into_iter()
            .filter(|c| c.kind == ConstraintKind::PrimaryKey)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RecordingExecutor;

    fn row(values: &[Option<&str>]) -> Row {
        Row::new(
            values
                .iter()
                .map(|v| v.map(Literal::text).unwrap_or(Literal::Null))
                .collect(),
        )
    }

    #[test]
    fn test_read_constraints_groups_rows() {
        let executor = RecordingExecutor::new()
            .with_rows(
                "SYSCAT.TABCONST",
                vec![
                    row(&[Some("ORDERS_PK"), Some("P"), Some("ID"), None, None]),
                    row(&[Some("ORDERS_REF_UNIQ"), Some("U"), Some("REGION"), None, None]),
                    row(&[Some("ORDERS_REF_UNIQ"), Some("U"), Some("REF"), None, None]),
                    row(&[Some("ORDERS_CUST_FK"), Some("F"), Some("CUSTOMER_ID"), Some("CRM     "), Some("CUSTOMER")]),
                ],
            )
            .with_rows(
                "SYSCAT.CHECKS",
                vec![row(&[Some("ORDERS_QTY_CHECK"), Some("QTY"), Some(" QTY > 0 ")])],
            )
            .with_rows("SYSCAT.INDEXES", vec![row(&[Some("ORDERS_DAY_INDEX"), Some("DAY")])]);

        let constraints = read_constraints(&executor, &TableName::qualified("SHOP", "ORDERS")).unwrap();
        assert_eq!(constraints.len(), 5);
        assert_eq!(constraints[0], Constraint::primary_key("ORDERS_PK", &["ID"]));
        assert_eq!(constraints[1], Constraint::unique("ORDERS_REF_UNIQ", &["REGION", "REF"]));
        assert_eq!(
            constraints[2],
            Constraint::foreign_key("ORDERS_CUST_FK", &["CUSTOMER_ID"], TableName::qualified("CRM", "CUSTOMER"))
        );
        assert_eq!(constraints[3], Constraint::check("ORDERS_QTY_CHECK", &["QTY"], "QTY > 0"));
        assert_eq!(constraints[4], Constraint::index("ORDERS_DAY_INDEX", &["DAY"]));
    }

    #[test]
    fn test_catalog_queries_bind_schema() {
        let executor = RecordingExecutor::new();
        read_constraints(&executor, &TableName::qualified("SHOP", "ORDERS")).unwrap();
        read_constraints(&executor, &TableName::new("ORDERS")).unwrap();

        let queries = executor.queries();
        assert_eq!(queries.len(), 6);
        assert!(queries[0].0.contains("TC.TABSCHEMA = ?"));
        assert_eq!(queries[0].1, vec![Literal::text("SHOP"), Literal::text("ORDERS")]);
        assert!(queries[3].0.contains("TC.TABSCHEMA = CURRENT SCHEMA"));
        assert_eq!(queries[3].1, vec![Literal::text("ORDERS")]);
    }

    #[test]
    fn test_unknown_constraint_type_is_a_decode_error() {
        let executor = RecordingExecutor::new().with_rows(
            "SYSCAT.TABCONST",
            vec![row(&[Some("X"), Some("Z"), Some("A"), None, None])],
        );
        let err = read_constraints(&executor, &TableName::new("T")).unwrap_err();
        assert!(matches!(err, EngineError::Decode(_)));
    }

    #[test]
    fn test_constraint_names_match_exact_columns() {
        let table = TableName::new("orders");
        let executor = RecordingExecutor::new().with_constraints(
            &table,
            vec![
                Constraint::unique("orders_ref_uniq", &["ref"]),
                Constraint::unique("orders_region_ref_uniq", &["region", "ref"]),
                Constraint::primary_key("orders_id_pk", &["id"]),
            ],
        );
        let editor = SchemaEditor::new(&executor);

        assert_eq!(
            editor.constraint_names(&table, &["ref"], ConstraintKind::Unique).unwrap(),
            vec!["orders_ref_uniq".to_string()]
        );
        assert_eq!(
            editor.primary_keys(&table).unwrap(),
            vec![Constraint::primary_key("orders_id_pk", &["id"])]
        );
    }
}
