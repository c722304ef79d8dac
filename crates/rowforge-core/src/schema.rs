//! Entity field registration.
//!
//! An entity declares its persistable shape as a static `FieldSpec`
//! table, usually generated by `#[derive(Entity)]`. The shape is the
//! input to schema mapping; no runtime type inspection takes place.

use std::any::TypeId;

use crate::error::Result;
use crate::param::LobKind;
use crate::value::SqlValue;

/// Declarative description of one entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// The Rust field name.
    pub name: &'static str,
    /// Explicit column name, overriding the naming convention.
    pub column: Option<&'static str>,
    /// Whether this field is part of the primary key.
    pub primary_key: bool,
    /// Whether this field is excluded from persistence.
    pub ignore: bool,
    /// Large-object classification.
    pub lob: LobKind,
}

impl FieldSpec {
    /// Creates a plain persistable field.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            column: None,
            primary_key: false,
            ignore: false,
            lob: LobKind::None,
        }
    }

    /// Marks the field as primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Excludes the field from persistence.
    #[must_use]
    pub const fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    /// Sets the large-object classification.
    #[must_use]
    pub const fn lob(mut self, kind: LobKind) -> Self {
        self.lob = kind;
        self
    }

    /// Overrides the column name.
    #[must_use]
    pub const fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }
}

/// A plain data object mapped to a table row.
///
/// Implemented via `#[derive(Entity)]`:
///
/// ```ignore
/// use rowforge_core::Entity;
///
/// #[derive(Entity)]
/// #[entity(table = "customers")]
/// struct Customer {
///     #[field(primary_key)]
///     id: Option<i64>,
///     first_name: String,
///     #[field(json)]
///     settings: serde_json::Value,
///     #[field(ignore)]
///     dirty: bool,
/// }
/// ```
///
/// Field types must implement `ToSqlValue` (all primitives, `String`,
/// `Vec<u8>`, `chrono::DateTime<Utc>`, `serde_json::Value`, `Option`
/// of any of these, and caller-defined enums with a `ToSqlValue` impl).
pub trait Entity: Send + Sync + 'static {
    /// Default table name for this entity.
    const TABLE: &'static str;

    /// The persistable shape, in declaration order.
    const FIELDS: &'static [FieldSpec];

    /// Returns the current value of a field by name.
    ///
    /// Unknown names yield `SqlValue::Null`; the synthesizer only asks
    /// for names present in `FIELDS`.
    fn value_of(&self, field: &str) -> SqlValue;

    /// Assigns a database-generated key onto a primary-key field,
    /// converting to the field's declared type.
    fn write_pk(&mut self, field: &str, value: &SqlValue) -> Result<()>;
}

/// Type-erased view of an entity shape, used as a cache key source.
#[derive(Debug, Clone, Copy)]
pub struct EntityMeta {
    /// `TypeId` of the entity type.
    pub type_id: TypeId,
    /// Entity type name, for diagnostics.
    pub type_name: &'static str,
    /// The declared field table.
    pub fields: &'static [FieldSpec],
}

impl EntityMeta {
    /// Captures the shape of an entity type.
    #[must_use]
    pub fn of<E: Entity>() -> Self {
        Self {
            type_id: TypeId::of::<E>(),
            type_name: std::any::type_name::<E>(),
            fields: E::FIELDS,
        }
    }
}
