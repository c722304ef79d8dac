//! Single-row INSERT synthesis.

use super::cache::{ParamSlot, StatementTemplate};
use super::{PkMode, StatementKind};
use crate::dialect::{Dialect, PkRetrieval};
use crate::error::{CoreError, Result};
use crate::mapping::SchemaMapping;
use crate::param::{LobKind, ParamDirection};

/// Builds the INSERT template for one entity shape.
///
/// Primary-key columns are omitted unless the caller includes them or
/// a sequence literal supplies them. When a generated key is expected
/// back, the dialect's retrieval fragment is appended exactly once.
pub(crate) fn build_insert_template(
    mapping: &SchemaMapping,
    dialect: &dyn Dialect,
    pk_mode: &PkMode,
    want_key: bool,
) -> Result<StatementTemplate> {
    let mut columns: Vec<&str> = Vec::new();
    let mut value_exprs: Vec<String> = Vec::new();
    let mut slots: Vec<ParamSlot> = Vec::new();

    for col in mapping.columns() {
        if col.primary_key {
            match pk_mode {
                PkMode::Omit => continue,
                PkMode::Include => {}
                PkMode::Sequence(sequence) => {
                    let expr = dialect.sequence_expr(sequence).ok_or(
                        CoreError::UnsupportedFeature {
                            dialect: dialect.name(),
                            feature: "sequence-generated keys",
                        },
                    )?;
                    columns.push(&col.column);
                    value_exprs.push(expr);
                    continue;
                }
            }
        }

        let name = format!("p_{}", col.field);
        columns.push(&col.column);
        value_exprs.push(dialect.decorated_placeholder(&name, col.lob));
        slots.push(ParamSlot {
            name,
            field: Some(col.field),
            direction: ParamDirection::In,
            lob: col.lob,
        });
    }

    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        mapping.table(),
        columns.join(", "),
        value_exprs.join(", ")
    );

    let mut pk_retrieval = None;
    let mut pk_field = None;
    // Generated keys only apply to single-column keys not supplied by
    // the caller.
    if want_key && mapping.pk_len() == 1 && *pk_mode != PkMode::Include {
        if let Some(pk) = mapping.pk_columns().next() {
            let out_name = format!("p_out_{}", pk.field);
            let strategy = dialect.pk_retrieval(&pk.column, &out_name);
            match &strategy {
                PkRetrieval::Returning { clause } => sql.push_str(clause),
                PkRetrieval::TrailingScalar { statement } => sql.push_str(statement),
                PkRetrieval::OutputParameter { clause, param } => {
                    sql.push_str(clause);
                    slots.push(ParamSlot {
                        name: param.clone(),
                        field: Some(pk.field),
                        direction: ParamDirection::Out,
                        lob: LobKind::None,
                    });
                }
                PkRetrieval::FollowUpQuery { .. } => {}
            }
            pk_retrieval = Some(strategy);
            pk_field = Some(pk.field);
        }
    }

    Ok(StatementTemplate {
        kind: StatementKind::Insert,
        sql: sql.into(),
        slots,
        pk_retrieval,
        pk_field,
    })
}
