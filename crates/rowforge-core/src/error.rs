//! Error types for schema mapping and statement synthesis.
//!
//! Everything in this crate fails before any I/O happens; these are
//! configuration-class errors raised while inspecting a shape or
//! assembling a statement.

/// Errors raised during mapping or synthesis.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The entity type declares no primary-key field.
    #[error("entity type '{entity}' has no field marked primary_key")]
    MissingPrimaryKey {
        /// The offending entity type name.
        entity: &'static str,
    },

    /// A temp-table name does not follow the dialect's convention.
    #[error("temp table name '{name}' is invalid for {dialect}: must start with one of {expected:?}")]
    InvalidTempTableName {
        /// The rejected name.
        name: String,
        /// Dialect that rejected it.
        dialect: &'static str,
        /// Accepted prefixes.
        expected: &'static [&'static str],
    },

    /// The requested dialect name is not one of the supported backends.
    #[error("unsupported dialect '{name}'")]
    UnknownDialect {
        /// The requested name.
        name: String,
    },

    /// A dialect was asked for a capability it does not provide.
    #[error("{dialect} does not support {feature}")]
    UnsupportedFeature {
        /// Dialect that lacks the capability.
        dialect: &'static str,
        /// The missing capability.
        feature: &'static str,
    },

    /// A field name was used that is not part of the mapped shape.
    #[error("field '{field}' is not part of the mapped shape")]
    UnknownField {
        /// The unknown field name.
        field: String,
    },

    /// A generated key could not be converted to the entity's key type.
    #[error("cannot convert {value} into a {target} primary key")]
    KeyConversion {
        /// Rendering of the value that failed to convert.
        value: String,
        /// Target Rust type.
        target: &'static str,
    },

    /// An UPDATE was synthesized for a shape with no non-key columns.
    #[error("table '{table}' has no non-key columns to update")]
    EmptyUpdate {
        /// The target table.
        table: String,
    },
}

/// Result type alias for mapping and synthesis operations.
pub type Result<T> = std::result::Result<T, CoreError>;
