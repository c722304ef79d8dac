//! Schema mapping and the introspection cache.
//!
//! A `SchemaMapping` is computed once per (shape, table, convention)
//! and never changes afterwards. The `SchemaRegistry` publishes
//! mappings under a read-write lock; concurrent first callers may
//! compute redundantly, which is harmless because the computation is a
//! pure function of the shape.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::error::{CoreError, Result};
use crate::naming::NamingConvention;
use crate::param::LobKind;
use crate::schema::{Entity, EntityMeta};

/// One field-to-column correspondence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    /// The Rust field name.
    pub field: &'static str,
    /// The derived column name.
    pub column: String,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
    /// Large-object classification.
    pub lob: LobKind,
}

/// The cached field-to-column correspondence for one entity shape.
///
/// Immutable after first computation. Exactly the set of non-ignored
/// fields produces exactly one column each; the primary-key column
/// list is non-empty or the mapping fails fast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMapping {
    table: String,
    columns: Vec<ColumnMap>,
}

impl SchemaMapping {
    /// Computes the mapping for a shape.
    ///
    /// # Errors
    ///
    /// `MissingPrimaryKey` when no non-ignored field carries the
    /// primary-key marker.
    pub fn compute(
        meta: &EntityMeta,
        table: &str,
        convention: &NamingConvention,
    ) -> Result<Self> {
        let columns: Vec<ColumnMap> = meta
            .fields
            .iter()
            .filter(|f| !f.ignore)
            .map(|f| ColumnMap {
                field: f.name,
                column: f
                    .column
                    .map_or_else(|| convention.column_name(f.name), String::from),
                primary_key: f.primary_key,
                lob: f.lob,
            })
            .collect();

        if !columns.iter().any(|c| c.primary_key) {
            return Err(CoreError::MissingPrimaryKey {
                entity: meta.type_name,
            });
        }

        Ok(Self {
            table: table.to_string(),
            columns,
        })
    }

    /// The table this mapping targets.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// All mapped columns, in field declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnMap] {
        &self.columns
    }

    /// The non-key columns, in declaration order.
    pub fn data_columns(&self) -> impl Iterator<Item = &ColumnMap> {
        self.columns.iter().filter(|c| !c.primary_key)
    }

    /// The primary-key columns, in declaration order.
    pub fn pk_columns(&self) -> impl Iterator<Item = &ColumnMap> {
        self.columns.iter().filter(|c| c.primary_key)
    }

    /// Number of primary-key columns.
    #[must_use]
    pub fn pk_len(&self) -> usize {
        self.pk_columns().count()
    }

    /// Looks up the column name for a field.
    #[must_use]
    pub fn column_for(&self, field: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.field == field)
            .map(|c| c.column.as_str())
    }

    /// Looks up the field name for a column.
    #[must_use]
    pub fn field_for(&self, column: &str) -> Option<&'static str> {
        self.columns
            .iter()
            .find(|c| c.column == column)
            .map(|c| c.field)
    }

    /// Comma-separated column list, for SELECT projection.
    #[must_use]
    pub fn select_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.column.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MappingKey {
    type_id: TypeId,
    table: String,
    convention: NamingConvention,
}

/// Process-lifetime cache of schema mappings.
///
/// Populated lazily, never evicted. Tests inject a fresh registry
/// instead of relying on the global one.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    inner: RwLock<HashMap<MappingKey, Arc<SchemaMapping>>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide shared registry.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<SchemaRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new())))
    }

    /// Returns the cached mapping for an entity type, computing and
    /// publishing it on first use.
    ///
    /// # Errors
    ///
    /// `MissingPrimaryKey` when the shape declares no primary key.
    pub fn mapping_for<E: Entity>(
        &self,
        table: &str,
        convention: &NamingConvention,
    ) -> Result<Arc<SchemaMapping>> {
        self.mapping_for_meta(&EntityMeta::of::<E>(), table, convention)
    }

    /// Type-erased variant of [`Self::mapping_for`].
    pub fn mapping_for_meta(
        &self,
        meta: &EntityMeta,
        table: &str,
        convention: &NamingConvention,
    ) -> Result<Arc<SchemaMapping>> {
        let key = MappingKey {
            type_id: meta.type_id,
            table: table.to_string(),
            convention: convention.clone(),
        };

        if let Some(found) = self.inner.read().expect("registry lock").get(&key) {
            return Ok(Arc::clone(found));
        }

        let computed = Arc::new(SchemaMapping::compute(meta, table, convention)?);
        let mut guard = self.inner.write().expect("registry lock");
        let entry = guard.entry(key).or_insert_with(|| Arc::clone(&computed));
        Ok(Arc::clone(entry))
    }

    /// Number of cached mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().expect("registry lock").len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
