//! PostgreSQL dialect implementation.

use super::{placeholder_list, Dialect, DialectKind, PkRetrieval};
use crate::error::Result;
use crate::param::{LobKind, SqlParam};

/// PostgreSQL dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct Postgres;

impl Postgres {
    /// Creates a new Postgres dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for Postgres {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn name(&self) -> &'static str {
        "postgres"
    }

    fn decorated_placeholder(&self, name: &str, lob: LobKind) -> String {
        match lob {
            LobKind::Json => format!("{}::jsonb", self.placeholder(name)),
            _ => self.placeholder(name),
        }
    }

    fn sequence_expr(&self, sequence: &str) -> Option<String> {
        Some(format!("nextval('{sequence}')"))
    }

    fn pk_retrieval(&self, pk_column: &str, _out_param: &str) -> PkRetrieval {
        PkRetrieval::Returning {
            clause: format!(" RETURNING {pk_column}"),
        }
    }

    fn server_time_query(&self) -> &'static str {
        "SELECT now()"
    }

    fn call_procedure(&self, name: &str, params: &[SqlParam]) -> Result<String> {
        Ok(format!("CALL {name}({})", placeholder_list(self, params)))
    }

    fn call_function(&self, name: &str, params: &[SqlParam]) -> Result<String> {
        Ok(format!("SELECT {name}({})", placeholder_list(self, params)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;

    #[test]
    fn test_postgres_placeholders() {
        let d = Postgres::new();
        assert_eq!(d.placeholder("p_name"), "@p_name");
        assert_eq!(
            d.decorated_placeholder("p_doc", LobKind::Json),
            "@p_doc::jsonb"
        );
        assert_eq!(d.decorated_placeholder("p_bin", LobKind::Blob), "@p_bin");
    }

    #[test]
    fn test_postgres_pk_retrieval() {
        let d = Postgres::new();
        assert_eq!(
            d.pk_retrieval("id", "p_out_id"),
            PkRetrieval::Returning {
                clause: String::from(" RETURNING id")
            }
        );
    }

    #[test]
    fn test_postgres_sequence_expr() {
        let d = Postgres::new();
        assert_eq!(
            d.sequence_expr("customers_id_seq").as_deref(),
            Some("nextval('customers_id_seq')")
        );
    }

    #[test]
    fn test_postgres_call_framing() {
        let d = Postgres::new();
        let params = vec![SqlParam::new("p_0", SqlValue::Int(1))];
        assert_eq!(d.call_procedure("refresh_totals", &params).unwrap(), "CALL refresh_totals(@p_0)");
        assert_eq!(d.call_function("total_for", &params).unwrap(), "SELECT total_for(@p_0)");
    }
}
