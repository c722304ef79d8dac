//! # rowforge-core
//!
//! Entity-to-row schema mapping and dialect-aware SQL statement
//! synthesis.
//!
//! This crate inspects an entity's declared shape once, caches the
//! field-to-column mapping, and deterministically synthesizes
//! INSERT/UPDATE/DELETE and bulk-insert statements with bound
//! parameters for PostgreSQL, SQL Server, Oracle and SQLite. It
//! performs no I/O; execution lives in `rowforge-db`.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rowforge_core::{DialectKind, Entity, NamingConvention, PkMode, Synthesizer};
//!
//! #[derive(Entity)]
//! #[entity(table = "customers")]
//! struct Customer {
//!     #[field(primary_key)]
//!     id: Option<i64>,
//!     first_name: String,
//!     email: String,
//! }
//!
//! let synth = Synthesizer::new(DialectKind::Postgres, NamingConvention::SnakeCase);
//! let customer = Customer { id: None, first_name: "Ada".into(), email: "ada@example.com".into() };
//!
//! let stmt = synth.insert(&customer, "customers", &PkMode::Omit, true)?;
//! // stmt.sql = "INSERT INTO customers (first_name, email)
//! //             VALUES (@p_first_name, @p_email) RETURNING id"
//! ```
//!
//! Repeat saves of the same shape reuse the cached statement text and
//! only refresh parameter values.

pub mod dialect;
pub mod error;
pub mod mapping;
pub mod naming;
pub mod param;
pub mod schema;
pub mod statement;
pub mod value;

pub use dialect::{BulkStrategy, Dialect, DialectKind, LobBinding, PkRetrieval};
pub use error::{CoreError, Result};
pub use mapping::{ColumnMap, SchemaMapping, SchemaRegistry};
pub use naming::NamingConvention;
pub use param::{LobKind, ParamDirection, SqlParam};
pub use schema::{Entity, EntityMeta, FieldSpec};
pub use statement::{PkMode, Statement, StatementKind, Synthesizer, TemplateCache};
pub use value::{FromSqlValue, SqlValue, ToSqlValue};
