//! Full-key UPDATE synthesis.

use super::cache::{ParamSlot, StatementTemplate};
use super::{key_predicate, StatementKind};
use crate::dialect::Dialect;
use crate::error::{CoreError, Result};
use crate::mapping::SchemaMapping;
use crate::param::ParamDirection;

/// Builds the UPDATE template: `SET` over every non-key column, then
/// the full-key predicate. Partial-key updates are not permitted.
pub(crate) fn build_update_template(
    mapping: &SchemaMapping,
    dialect: &dyn Dialect,
) -> Result<StatementTemplate> {
    let mut set_parts: Vec<String> = Vec::new();
    let mut slots: Vec<ParamSlot> = Vec::new();

    for col in mapping.data_columns() {
        let name = format!("p_{}", col.field);
        set_parts.push(format!(
            "{} = {}",
            col.column,
            dialect.decorated_placeholder(&name, col.lob)
        ));
        slots.push(ParamSlot {
            name,
            field: Some(col.field),
            direction: ParamDirection::In,
            lob: col.lob,
        });
    }

    if set_parts.is_empty() {
        return Err(CoreError::EmptyUpdate {
            table: mapping.table().to_string(),
        });
    }

    for col in mapping.pk_columns() {
        slots.push(ParamSlot {
            name: format!("p_{}", col.field),
            field: Some(col.field),
            direction: ParamDirection::In,
            lob: col.lob,
        });
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        mapping.table(),
        set_parts.join(", "),
        key_predicate(mapping, dialect)
    );

    Ok(StatementTemplate {
        kind: StatementKind::Update,
        sql: sql.into(),
        slots,
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
    use crate::statement::tests::{Link, Order};

    #[test]
    fn test_update_sets_data_and_keys_on_pk() {
        let m = SchemaMapping::compute(
            &EntityMeta::of::<Order>(),
            "orders",
            &NamingConvention::SnakeCase,
        )
        .unwrap();
        let t = build_update_template(&m, DialectKind::Postgres.dialect()).unwrap();

        assert_eq!(
            &*t.sql,
            "UPDATE orders SET customer_name = @p_customer_name, total = @p_total WHERE id = @p_id"
        );
        // set params first, then key params
        let names: Vec<_> = t.slots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["p_customer_name", "p_total", "p_id"]);
    }

    #[test]
    fn test_update_composite_key_conjunction() {
        let m = SchemaMapping::compute(
            &EntityMeta::of::<Link>(),
            "links",
            &NamingConvention::SnakeCase,
        )
        .unwrap();
        let t = build_update_template(&m, DialectKind::Oracle.dialect()).unwrap();

        assert_eq!(
            &*t.sql,
            "UPDATE links SET weight = :p_weight WHERE left_id = :p_left_id AND right_id = :p_right_id"
        );
    }
}
