//! Oracle dialect implementation.

use super::{placeholder_list, BulkStrategy, Dialect, DialectKind, LobBinding, PkRetrieval};
use crate::error::Result;
use crate::param::SqlParam;

/// Oracle Database dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct Oracle;

impl Oracle {
    /// Creates a new Oracle dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for Oracle {
    fn kind(&self) -> DialectKind {
        DialectKind::Oracle
    }

    fn name(&self) -> &'static str {
        "oracle"
    }

    fn parameter_marker(&self) -> char {
        ':'
    }

    fn normalize_statement(&self, sql: &str) -> String {
        // Convert canonical @name markers to :name, leaving string
        // literals untouched.
        let mut out = String::with_capacity(sql.len());
        let mut in_literal = false;
        for c in sql.chars() {
            match c {
                '\'' => {
                    in_literal = !in_literal;
                    out.push(c);
                }
                '@' if !in_literal => out.push(':'),
                _ => out.push(c),
            }
        }
        out
    }

    fn sequence_expr(&self, sequence: &str) -> Option<String> {
        Some(format!("{sequence}.NEXTVAL"))
    }

    fn pk_retrieval(&self, pk_column: &str, out_param: &str) -> PkRetrieval {
        PkRetrieval::OutputParameter {
            clause: format!(" RETURNING {pk_column} INTO {}", self.placeholder(out_param)),
            param: out_param.to_string(),
        }
    }

    fn bulk_strategy(&self, uses_sequence: bool) -> BulkStrategy {
        // Sequences cannot be evaluated inside INSERT ALL's subquery
        // form; fall back to an anonymous block for those batches.
        if uses_sequence {
            BulkStrategy::AnonymousBlock
        } else {
            BulkStrategy::InsertAll
        }
    }

    fn lob_binding(&self) -> LobBinding {
        LobBinding::ProviderHandle
    }

    fn server_time_query(&self) -> &'static str {
        "SELECT SYSTIMESTAMP FROM dual"
    }

    fn call_procedure(&self, name: &str, params: &[SqlParam]) -> Result<String> {
        Ok(format!(
            "BEGIN {name}({}); END;",
            placeholder_list(self, params)
        ))
    }

    fn call_function(&self, name: &str, params: &[SqlParam]) -> Result<String> {
        Ok(format!(
            "SELECT {name}({}) FROM dual",
            placeholder_list(self, params)
        ))
    }
}
