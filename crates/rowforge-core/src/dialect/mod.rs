//! Dialect capability providers.
//!
//! Each backend supplies parameter shaping, a primary-key retrieval
//! strategy, a bulk-insert grammar, LOB binding rules, procedure call
//! framing, temp-table validation and a server-time query. Shared
//! behavior lives in default method bodies; each variant overrides
//! what differs.

mod oracle;
mod postgres;
mod sqlite;
mod sqlserver;

pub use oracle::Oracle;
pub use postgres::Postgres;
pub use sqlite::Sqlite;
pub use sqlserver::SqlServer;

use crate::error::{CoreError, Result};
use crate::param::{LobKind, SqlParam};
use crate::value::SqlValue;

/// Supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectKind {
    /// PostgreSQL.
    Postgres,
    /// Microsoft SQL Server.
    SqlServer,
    /// Oracle Database.
    Oracle,
    /// SQLite.
    Sqlite,
}

impl DialectKind {
    /// Returns the capability provider for this backend.
    #[must_use]
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            Self::Postgres => &Postgres,
            Self::SqlServer => &SqlServer,
            Self::Oracle => &Oracle,
            Self::Sqlite => &Sqlite,
        }
    }

    /// Resolves a backend from a configuration name.
    ///
    /// # Errors
    ///
    /// `UnknownDialect` for anything but the four supported backends.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "sqlserver" | "mssql" => Ok(Self::SqlServer),
            "oracle" => Ok(Self::Oracle),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            other => Err(CoreError::UnknownDialect {
                name: other.to_string(),
            }),
        }
    }
}

/// How a generated primary key comes back from an insert.
#[derive(Debug, Clone, PartialEq)]
pub enum PkRetrieval {
    /// A clause appended to the INSERT; the key is the statement's
    /// scalar result (Postgres `RETURNING`).
    Returning {
        /// The appended clause, including leading whitespace.
        clause: String,
    },
    /// A scalar statement appended after the INSERT in the same
    /// command text (SQL Server `SCOPE_IDENTITY()`).
    TrailingScalar {
        /// The appended statement, including the separator.
        statement: String,
    },
    /// A `RETURNING ... INTO` clause binding an output parameter the
    /// driver populates (Oracle).
    OutputParameter {
        /// The appended clause.
        clause: String,
        /// Name of the bound output parameter.
        param: String,
    },
    /// A scalar query issued on the same connection immediately after
    /// the INSERT (SQLite `last_insert_rowid()`).
    FollowUpQuery {
        /// The follow-up query text.
        query: String,
    },
}

/// How a homogeneous batch is combined into one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkStrategy {
    /// `INSERT ... VALUES (...), (...), ...`.
    MultiRowValues,
    /// Single-row inserts wrapped in `BEGIN ... END;`.
    AnonymousBlock,
    /// `INSERT ALL INTO ... SELECT 1 FROM dual`.
    InsertAll,
}

/// How large objects are bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobBinding {
    /// Byte arrays and strings bind directly.
    Direct,
    /// Provider-native handles written after execution and disposed
    /// explicitly (Oracle).
    ProviderHandle,
}

/// A backend's SQL grammar and driver capabilities.
pub trait Dialect {
    /// Returns the backend this provider serves.
    fn kind(&self) -> DialectKind;

    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// The parameter marker character.
    fn parameter_marker(&self) -> char {
        '@'
    }

    /// Renders a placeholder for a named parameter.
    fn placeholder(&self, name: &str) -> String {
        format!("{}{name}", self.parameter_marker())
    }

    /// Renders a placeholder, decorated for the column's LOB kind when
    /// the backend needs it (e.g. a JSON cast).
    fn decorated_placeholder(&self, name: &str, _lob: LobKind) -> String {
        self.placeholder(name)
    }

    /// Rewrites caller-supplied SQL from the canonical `@name` marker
    /// to this dialect's marker. Identity for `@`-marker backends.
    fn normalize_statement(&self, sql: &str) -> String {
        sql.to_string()
    }

    /// Literal expression producing the next value of a sequence, when
    /// the backend generates keys from sequences.
    fn sequence_expr(&self, _sequence: &str) -> Option<String> {
        None
    }

    /// The strategy for retrieving a generated key after an insert.
    fn pk_retrieval(&self, pk_column: &str, out_param: &str) -> PkRetrieval;

    /// The grammar used for a multi-row insert. `uses_sequence` is
    /// true when the batch fills keys from a sequence literal.
    fn bulk_strategy(&self, _uses_sequence: bool) -> BulkStrategy {
        BulkStrategy::MultiRowValues
    }

    /// How this backend binds large objects.
    fn lob_binding(&self) -> LobBinding {
        LobBinding::Direct
    }

    /// Releases large-object slots after execution. Best-effort; runs
    /// on success and failure alike.
    fn dispose_lobs(&self, params: &mut [SqlParam]) {
        if self.lob_binding() == LobBinding::ProviderHandle {
            for param in params.iter_mut().filter(|p| p.is_lob()) {
                param.value = SqlValue::Null;
            }
        }
    }

    /// Accepted temp-table name prefixes.
    fn temp_table_prefixes(&self) -> &'static [&'static str] {
        &["temp_", "tmp_"]
    }

    /// Validates a temp-table name against the backend's convention.
    ///
    /// # Errors
    ///
    /// `InvalidTempTableName` when the name lacks a required prefix.
    fn validate_temp_table(&self, name: &str) -> Result<()> {
        let prefixes = self.temp_table_prefixes();
        let lowered = name.to_ascii_lowercase();
        if prefixes.iter().any(|p| lowered.starts_with(p)) {
            Ok(())
        } else {
            Err(CoreError::InvalidTempTableName {
                name: name.to_string(),
                dialect: self.name(),
                expected: prefixes,
            })
        }
    }

    /// Query returning the backend's current time.
    fn server_time_query(&self) -> &'static str;

    /// Frames a stored-procedure call.
    ///
    /// # Errors
    ///
    /// `UnsupportedFeature` when the backend has no procedures.
    fn call_procedure(&self, name: &str, params: &[SqlParam]) -> Result<String>;

    /// Frames a function call returning a scalar.
    ///
    /// # Errors
    ///
    /// `UnsupportedFeature` when the backend has no functions.
    fn call_function(&self, name: &str, params: &[SqlParam]) -> Result<String>;
}

/// Renders the comma-separated placeholder list for a call frame.
pub(crate) fn placeholder_list(dialect: &dyn Dialect, params: &[SqlParam]) -> String {
    params
        .iter()
        .map(|p| dialect.placeholder(&p.name))
        .collect::<Vec<_>>()
        .join(", ")
}
