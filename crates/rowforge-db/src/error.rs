//! Error types for database execution.

use rowforge_core::{CoreError, StatementKind};

/// Errors surfaced by connections and the save/delete orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A configuration-class failure raised before any I/O: missing
    /// primary-key marker, invalid temp-table name, unsupported
    /// dialect or capability.
    #[error("configuration error: {0}")]
    Configuration(#[from] CoreError),

    /// The backend rejected a synthesized statement. Carries the
    /// failed operation's kind; never retried or rewritten here.
    #[error("{op} failed: {source}")]
    Database {
        /// The operation that failed.
        op: StatementKind,
        /// The backend error.
        #[source]
        source: sqlx::Error,
    },

    /// A query expecting exactly one row returned zero.
    #[error("object not found")]
    NotFound,

    /// A driver-level error outside a synthesized statement.
    #[error("driver error: {0}")]
    Driver(#[from] sqlx::Error),

    /// Transaction state misuse (nested begin, commit without begin).
    #[error("transaction error: {0}")]
    Transaction(&'static str),

    /// The executor cannot perform the requested binding.
    #[error("{0} is not supported by this executor")]
    Unsupported(&'static str),
}

impl DbError {
    /// Tags a driver error with the operation that produced it.
    pub(crate) fn tag(self, op: StatementKind) -> Self {
        match self {
            Self::Driver(source) => Self::Database { op, source },
            other => other,
        }
    }
}

/// Result type alias for database operations.
pub type Result<T> = std::result::Result<T, DbError>;
