//! Multi-row INSERT synthesis.
//!
//! A batch is combined into one statement using the dialect's bulk
//! grammar: multi-row `VALUES` lists where the backend supports them,
//! an anonymous PL/SQL block or `INSERT ALL` on Oracle. Parameters are
//! suffixed by row index (`p_<field>_<k>`) to keep names unique within
//! the statement. Rows execute in list order; no keys are retrieved.

use super::{PkMode, Statement, StatementKind};
use crate::dialect::{BulkStrategy, Dialect};
use crate::error::{CoreError, Result};
use crate::mapping::{ColumnMap, SchemaMapping};
use crate::param::SqlParam;
use crate::schema::Entity;

/// Builds one multi-row INSERT statement for `entities`.
///
/// The slice must be non-empty; the orchestrator routes the batch's
/// first element through the single-row path and passes the rest here.
pub(crate) fn build_bulk_insert<E: Entity>(
    entities: &[E],
    mapping: &SchemaMapping,
    dialect: &dyn Dialect,
    pk_mode: &PkMode,
) -> Result<Statement> {
    debug_assert!(!entities.is_empty(), "bulk insert needs at least one row");

    let uses_sequence = matches!(pk_mode, PkMode::Sequence(_));
    let sequence_expr = match pk_mode {
        PkMode::Sequence(sequence) => Some(dialect.sequence_expr(sequence).ok_or(
            CoreError::UnsupportedFeature {
                dialect: dialect.name(),
                feature: "sequence-generated keys",
            },
        )?),
        _ => None,
    };

    let columns: Vec<&ColumnMap> = mapping
        .columns()
        .iter()
        .filter(|c| !c.primary_key || *pk_mode != PkMode::Omit)
        .collect();
    let column_list = columns
        .iter()
        .map(|c| c.column.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let mut params: Vec<SqlParam> = Vec::with_capacity(entities.len() * columns.len());
    let mut row_exprs: Vec<String> = Vec::with_capacity(entities.len());

    for (row, entity) in entities.iter().enumerate() {
        let mut exprs: Vec<String> = Vec::with_capacity(columns.len());
        for col in &columns {
            if col.primary_key {
                if let Some(expr) = &sequence_expr {
                    exprs.push(expr.clone());
                    continue;
                }
            }
            let name = format!("p_{}_{row}", col.field);
            exprs.push(dialect.decorated_placeholder(&name, col.lob));
            params.push(SqlParam::new(name, entity.value_of(col.field)).with_lob(col.lob));
        }
        row_exprs.push(exprs.join(", "));
    }

    let sql = match dialect.bulk_strategy(uses_sequence) {
        BulkStrategy::MultiRowValues => {
            let rows = row_exprs
                .iter()
                .map(|r| format!("({r})"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("INSERT INTO {} ({column_list}) VALUES {rows}", mapping.table())
        }
        BulkStrategy::AnonymousBlock => {
            let body = row_exprs
                .iter()
                .map(|r| {
                    format!(
                        "INSERT INTO {} ({column_list}) VALUES ({r}); ",
                        mapping.table()
                    )
                })
                .collect::<String>();
            format!("BEGIN {body}END;")
        }
        BulkStrategy::InsertAll => {
            let body = row_exprs
                .iter()
                .map(|r| format!("INTO {} ({column_list}) VALUES ({r}) ", mapping.table()))
                .collect::<String>();
            format!("INSERT ALL {body}SELECT 1 FROM dual")
        }
    };

    Ok(Statement {
        kind: StatementKind::BulkInsert,
        sql,
        params,
        pk_retrieval: None,
        pk_field: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::DialectKind;
    use crate::naming::NamingConvention;
    use crate::schema::EntityMeta;
    use crate::statement::tests::Order;
    use std::collections::HashSet;

    fn mapping() -> SchemaMapping {
        SchemaMapping::compute(
            &EntityMeta::of::<Order>(),
            "orders",
            &NamingConvention::SnakeCase,
        )
        .unwrap()
    }

    fn orders(n: usize) -> Vec<Order> {
        (0..n)
            .map(|i| Order {
                id: 0,
                customer_name: format!("customer {i}"),
                total: 10.0 + i as f64,
            })
            .collect()
    }

    #[test]
    fn test_multi_row_values() {
        let rows = orders(3);
        let stmt = build_bulk_insert(
            &rows,
            &mapping(),
            DialectKind::Postgres.dialect(),
            &PkMode::Omit,
        )
        .unwrap();

        assert_eq!(
            stmt.sql,
            "INSERT INTO orders (customer_name, total) VALUES \
             (@p_customer_name_0, @p_total_0), (@p_customer_name_1, @p_total_1), \
             (@p_customer_name_2, @p_total_2)"
        );
        assert_eq!(stmt.params.len(), 6);
    }

    #[test]
    fn test_bulk_param_names_unique() {
        let rows = orders(4);
        let stmt = build_bulk_insert(
            &rows,
            &mapping(),
            DialectKind::Postgres.dialect(),
            &PkMode::Omit,
        )
        .unwrap();

        // fields-per-row x row count, no duplicates
        assert_eq!(stmt.params.len(), 2 * 4);
        let names: HashSet<_> = stmt.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names.len(), stmt.params.len());
    }

    #[test]
    fn test_oracle_anonymous_block_with_sequence() {
        let rows = orders(2);
        let stmt = build_bulk_insert(
            &rows,
            &mapping(),
            DialectKind::Oracle.dialect(),
            &PkMode::Sequence(String::from("orders_seq")),
        )
        .unwrap();

        assert_eq!(
            stmt.sql,
            "BEGIN INSERT INTO orders (id, customer_name, total) VALUES \
             (orders_seq.NEXTVAL, :p_customer_name_0, :p_total_0); \
             INSERT INTO orders (id, customer_name, total) VALUES \
             (orders_seq.NEXTVAL, :p_customer_name_1, :p_total_1); END;"
        );
        // sequence column binds no parameters
        assert_eq!(stmt.params.len(), 4);
    }

    #[test]
    fn test_oracle_insert_all_without_keys() {
        let rows = orders(2);
        let stmt = build_bulk_insert(
            &rows,
            &mapping(),
            DialectKind::Oracle.dialect(),
            &PkMode::Omit,
        )
        .unwrap();

        assert_eq!(
            stmt.sql,
            "INSERT ALL INTO orders (customer_name, total) VALUES (:p_customer_name_0, :p_total_0) \
             INTO orders (customer_name, total) VALUES (:p_customer_name_1, :p_total_1) \
             SELECT 1 FROM dual"
        );
    }

    #[test]
    fn test_bulk_include_pk_binds_key_values() {
        let mut rows = orders(2);
        rows[0].id = 100;
        rows[1].id = 101;
        let stmt = build_bulk_insert(
            &rows,
            &mapping(),
            DialectKind::SqlServer.dialect(),
            &PkMode::Include,
        )
        .unwrap();

        assert!(stmt.sql.starts_with("INSERT INTO orders (id, customer_name, total) VALUES"));
        assert_eq!(stmt.params.len(), 6);
        assert_eq!(stmt.params[0].name, "p_id_0");
    }
}
