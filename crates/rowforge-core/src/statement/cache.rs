//! The statement-template cache.
//!
//! Templates are cached by (entity shape, table, operation). The text
//! is immutable after first synthesis; instantiation only refreshes
//! parameter values from the entity. A different table for the same
//! shape selects a different entry, so a stale template can never be
//! executed against the wrong table.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{delete, insert, update, PkMode, PkRetrieval, Statement, StatementKind};
use crate::dialect::Dialect;
use crate::error::Result;
use crate::mapping::SchemaMapping;
use crate::param::{LobKind, ParamDirection, SqlParam};
use crate::schema::Entity;
use crate::value::SqlValue;

/// One reusable parameter slot of a template.
#[derive(Debug, Clone)]
pub(crate) struct ParamSlot {
    /// Parameter name without the marker character.
    pub name: String,
    /// Source entity field, absent for pure output slots.
    pub field: Option<&'static str>,
    /// Parameter direction.
    pub direction: ParamDirection,
    /// Large-object classification.
    pub lob: LobKind,
}

/// Cached statement text plus its parameter slots.
#[derive(Debug)]
pub(crate) struct StatementTemplate {
    pub kind: StatementKind,
    pub sql: Arc<str>,
    pub slots: Vec<ParamSlot>,
    pub pk_retrieval: Option<PkRetrieval>,
    pub pk_field: Option<&'static str>,
}

impl StatementTemplate {
    /// Produces an executable statement, refreshing parameter values
    /// from the entity.
    fn instantiate<E: Entity>(&self, entity: &E) -> Statement {
        let params = self
            .slots
            .iter()
            .map(|slot| {
                let value = match (slot.direction, slot.field) {
                    (ParamDirection::In | ParamDirection::InOut, Some(field)) => {
                        entity.value_of(field)
                    }
                    _ => SqlValue::Null,
                };
                SqlParam {
                    name: slot.name.clone(),
                    value,
                    size: None,
                    direction: slot.direction,
                    lob: slot.lob,
                }
            })
            .collect();

        Statement {
            kind: self.kind,
            sql: self.sql.to_string(),
            params,
            pk_retrieval: self.pk_retrieval.clone(),
            pk_field: self.pk_field,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TemplateOp {
    Insert { pk: PkMode, want_key: bool },
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TemplateKey {
    type_id: TypeId,
    table: String,
    op: TemplateOp,
}

/// Process-lifetime cache of synthesized templates.
#[derive(Debug, Default)]
pub struct TemplateCache {
    inner: RwLock<HashMap<TemplateKey, Arc<StatementTemplate>>>,
}

impl TemplateCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().expect("template lock").len()
    }

    /// Returns whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_or_build<E: Entity>(
        &self,
        key: TemplateKey,
        build: impl FnOnce() -> Result<StatementTemplate>,
        entity: &E,
    ) -> Result<Statement> {
        if let Some(found) = self.inner.read().expect("template lock").get(&key) {
            return Ok(found.instantiate(entity));
        }

        let built = Arc::new(build()?);
        let mut guard = self.inner.write().expect("template lock");
        let entry = guard.entry(key).or_insert_with(|| Arc::clone(&built));
        Ok(entry.instantiate(entity))
    }

    /// Cached single-row INSERT synthesis.
    pub(crate) fn insert_for<E: Entity>(
        &self,
        entity: &E,
        mapping: &SchemaMapping,
        dialect: &dyn Dialect,
        pk_mode: &PkMode,
        want_key: bool,
    ) -> Result<Statement> {
        let key = TemplateKey {
            type_id: TypeId::of::<E>(),
            table: mapping.table().to_string(),
            op: TemplateOp::Insert {
                pk: pk_mode.clone(),
                want_key,
            },
        };
        self.get_or_build(
            key,
            || insert::build_insert_template(mapping, dialect, pk_mode, want_key),
            entity,
        )
    }

    /// Cached UPDATE synthesis.
    pub(crate) fn update_for<E: Entity>(
        &self,
        entity: &E,
        mapping: &SchemaMapping,
        dialect: &dyn Dialect,
    ) -> Result<Statement> {
        let key = TemplateKey {
            type_id: TypeId::of::<E>(),
            table: mapping.table().to_string(),
            op: TemplateOp::Update,
        };
        self.get_or_build(key, || update::build_update_template(mapping, dialect), entity)
    }

    /// Cached DELETE synthesis.
    pub(crate) fn delete_for<E: Entity>(
        &self,
        entity: &E,
        mapping: &SchemaMapping,
        dialect: &dyn Dialect,
    ) -> Result<Statement> {
        let key = TemplateKey {
            type_id: TypeId::of::<E>(),
            table: mapping.table().to_string(),
            op: TemplateOp::Delete,
        };
        self.get_or_build(key, || delete::build_delete_template(mapping, dialect), entity)
    }
}
