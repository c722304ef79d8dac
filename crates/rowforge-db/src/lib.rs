//! # rowforge-db
//!
//! Async execution for rowforge: the save/delete orchestrator, the
//! connection/transaction wrapper, and the raw execution seam the
//! synthesized statements are submitted through.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rowforge_db::{connect_sqlite, NamingConvention};
//! use rowforge_derive::Entity;
//!
//! #[derive(Entity, sqlx::FromRow)]
//! #[entity(table = "customers")]
//! struct Customer {
//!     #[field(primary_key)]
//!     id: i64,
//!     first_name: String,
//!     email: String,
//! }
//!
//! async fn example() -> rowforge_db::Result<()> {
//!     let mut conn = connect_sqlite("sqlite::memory:", NamingConvention::SnakeCase).await?;
//!
//!     let mut customer = Customer {
//!         id: 0,
//!         first_name: "Ada".into(),
//!         email: "ada@example.com".into(),
//!     };
//!     conn.save(&mut customer).await?;   // INSERT; customer.id now set
//!
//!     customer.email = "lovelace@example.com".into();
//!     conn.save(&mut customer).await?;   // UPDATE by key
//!
//!     let loaded: Customer = conn.fetch_by_pk("customers", customer.id).await?;
//!     conn.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! All I/O is async through the [`Executor`] seam; PostgreSQL,
//! SQL Server and Oracle statements synthesize identically and submit
//! through caller-supplied executors for those drivers.

mod connection;
mod error;
mod executor;
mod fetch;
mod save;

pub use connection::{connect_sqlite, DbConnection};
pub use error::{DbError, Result};
pub use executor::{Executor, SqliteExecutor};
pub use save::{BulkMode, SaveOptions};

// Re-export commonly used types from rowforge-core
pub use rowforge_core::{
    DialectKind, Entity, FieldSpec, LobKind, NamingConvention, ParamDirection, PkMode,
    SchemaRegistry, SqlParam, SqlValue, Statement, StatementKind, Synthesizer, ToSqlValue,
};
