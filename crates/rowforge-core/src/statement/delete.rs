//! Full-key DELETE synthesis.

use super::cache::{ParamSlot, StatementTemplate};
use super::{key_predicate, StatementKind};
use crate::dialect::Dialect;
use crate::error::Result;
use crate::mapping::SchemaMapping;
use crate::param::ParamDirection;

/// Builds the DELETE template. Hard delete by full key; the predicate
/// is identical to the UPDATE key predicate.
pub(crate) fn build_delete_template(
    mapping: &SchemaMapping,
    dialect: &dyn Dialect,
) -> Result<StatementTemplate> {
    let slots: Vec<ParamSlot> = mapping
        .pk_columns()
        .map(|col| ParamSlot {
            name: format!("p_{}", col.field),
            field: Some(col.field),
            direction: ParamDirection::In,
            lob: col.lob,
        })
        .collect();

    let sql = format!(
        "DELETE FROM {} WHERE {}",
        mapping.table(),
        key_predicate(mapping, dialect)
    );

    Ok(StatementTemplate {
        kind: StatementKind::Delete,
        sql: sql.into(),
        slots,
        pk_retrieval: None,
        pk_field: None,
    })
}
