//! Statement synthesis.
//!
//! The synthesizer turns a schema mapping plus an entity instance into
//! parameterized INSERT/UPDATE/DELETE text with an ordered parameter
//! list. Template text is cached per (entity shape, table, operation);
//! repeat saves only refresh parameter values. Synthesis is pure,
//! synchronous computation over cached state.

mod bulk;
mod cache;
mod delete;
mod insert;
mod update;

pub use cache::TemplateCache;

use std::fmt;
use std::sync::Arc;

use crate::dialect::{Dialect, DialectKind, PkRetrieval};
use crate::error::Result;
use crate::mapping::{SchemaMapping, SchemaRegistry};
use crate::naming::NamingConvention;
use crate::param::SqlParam;
use crate::schema::Entity;

/// The operation a statement performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// Single-row INSERT.
    Insert,
    /// Single-row UPDATE by full key.
    Update,
    /// Single-row DELETE by full key.
    Delete,
    /// Multi-row INSERT.
    BulkInsert,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::BulkInsert => "BULK INSERT",
        };
        f.write_str(s)
    }
}

/// How the primary key participates in an INSERT.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum PkMode {
    /// The key column is omitted; the backend generates the value.
    #[default]
    Omit,
    /// The entity's current key value is inserted verbatim.
    Include,
    /// The key column is filled from a named sequence literal.
    Sequence(String),
}

/// A synthesized statement ready for execution.
#[derive(Debug, Clone)]
pub struct Statement {
    /// The operation kind, carried onto execution errors.
    pub kind: StatementKind,
    /// The SQL text.
    pub sql: String,
    /// Ordered parameters, placeholder order matching `sql`.
    pub params: Vec<SqlParam>,
    /// How to read the generated key back, for inserts that expect one.
    pub pk_retrieval: Option<PkRetrieval>,
    /// The entity field the generated key is written back onto.
    pub pk_field: Option<&'static str>,
}

/// Builds the `pkcol1 = @p1 AND pkcol2 = @p2 ...` key predicate.
///
/// Shared by UPDATE and DELETE; always the full key, AND-conjoined.
pub(crate) fn key_predicate(mapping: &SchemaMapping, dialect: &dyn Dialect) -> String {
    mapping
        .pk_columns()
        .map(|c| format!("{} = {}", c.column, dialect.placeholder(&format!("p_{}", c.field))))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// The statement-synthesis engine for one (dialect, naming convention)
/// pair.
///
/// Owned by the connection factory and shared between connections; the
/// schema registry and template cache inside are safe for concurrent
/// use from multiple in-flight operations.
#[derive(Debug)]
pub struct Synthesizer {
    dialect: DialectKind,
    convention: NamingConvention,
    registry: Arc<SchemaRegistry>,
    templates: TemplateCache,
}

impl Synthesizer {
    /// Creates a synthesizer backed by a fresh schema registry.
    #[must_use]
    pub fn new(dialect: DialectKind, convention: NamingConvention) -> Self {
        Self::with_registry(dialect, convention, Arc::new(SchemaRegistry::new()))
    }

    /// Creates a synthesizer sharing an existing schema registry.
    #[must_use]
    pub fn with_registry(
        dialect: DialectKind,
        convention: NamingConvention,
        registry: Arc<SchemaRegistry>,
    ) -> Self {
        Self {
            dialect,
            convention,
            registry,
            templates: TemplateCache::new(),
        }
    }

    /// The backend this synthesizer targets.
    #[must_use]
    pub fn dialect_kind(&self) -> DialectKind {
        self.dialect
    }

    /// The capability provider for the target backend.
    #[must_use]
    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect.dialect()
    }

    /// The naming convention in effect.
    #[must_use]
    pub fn convention(&self) -> &NamingConvention {
        &self.convention
    }

    /// Returns the (cached) schema mapping for an entity type and table.
    ///
    /// # Errors
    ///
    /// `MissingPrimaryKey` when the shape declares no primary key.
    pub fn mapping<E: Entity>(&self, table: &str) -> Result<Arc<SchemaMapping>> {
        self.registry.mapping_for::<E>(table, &self.convention)
    }

    /// Synthesizes a single-row INSERT, from cache when available.
    ///
    /// `want_key` appends the dialect's generated-key fragment exactly
    /// once; it is ignored for composite keys and for `PkMode::Include`.
    pub fn insert<E: Entity>(
        &self,
        entity: &E,
        table: &str,
        pk_mode: &PkMode,
        want_key: bool,
    ) -> Result<Statement> {
        let mapping = self.mapping::<E>(table)?;
        self.templates
            .insert_for(entity, &mapping, self.dialect(), pk_mode, want_key)
    }

    /// Synthesizes a full-key UPDATE, from cache when available.
    pub fn update<E: Entity>(&self, entity: &E, table: &str) -> Result<Statement> {
        let mapping = self.mapping::<E>(table)?;
        self.templates.update_for(entity, &mapping, self.dialect())
    }

    /// Synthesizes a full-key DELETE, from cache when available.
    pub fn delete<E: Entity>(&self, entity: &E, table: &str) -> Result<Statement> {
        let mapping = self.mapping::<E>(table)?;
        self.templates.delete_for(entity, &mapping, self.dialect())
    }

    /// Synthesizes one multi-row statement for a homogeneous batch.
    ///
    /// The caller saves the first batch element through the single-row
    /// path; this combines the remaining rows. Parameters are suffixed
    /// by row index so names never collide. Not cached: the text
    /// depends on the row count.
    pub fn bulk_insert<E: Entity>(
        &self,
        entities: &[E],
        table: &str,
        pk_mode: &PkMode,
    ) -> Result<Statement> {
        let mapping = self.mapping::<E>(table)?;
        bulk::build_bulk_insert(entities, &mapping, self.dialect(), pk_mode)
    }

    /// Number of cached statement templates, for diagnostics.
    #[must_use]
    pub fn cached_templates(&self) -> usize {
        self.templates.len()
    }
}
