//! SQLite dialect implementation.

use super::{Dialect, DialectKind, PkRetrieval};
use crate::error::{CoreError, Result};
use crate::param::SqlParam;

/// SQLite dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sqlite;

impl Sqlite {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for Sqlite {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn pk_retrieval(&self, _pk_column: &str, _out_param: &str) -> PkRetrieval {
        PkRetrieval::FollowUpQuery {
            query: String::from("SELECT last_insert_rowid()"),
        }
    }

    fn server_time_query(&self) -> &'static str {
        "SELECT CURRENT_TIMESTAMP"
    }

    fn call_procedure(&self, _name: &str, _params: &[SqlParam]) -> Result<String> {
        Err(CoreError::UnsupportedFeature {
            dialect: self.name(),
            feature: "stored procedures",
        })
    }

    fn call_function(&self, _name: &str, _params: &[SqlParam]) -> Result<String> {
        Err(CoreError::UnsupportedFeature {
            dialect: self.name(),
            feature: "stored functions",
        })
    }
}
