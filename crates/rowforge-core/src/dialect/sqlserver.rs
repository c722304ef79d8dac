//! SQL Server dialect implementation.

use super::{Dialect, DialectKind, PkRetrieval};
use crate::error::Result;
use crate::param::SqlParam;

/// Microsoft SQL Server dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServer;

impl SqlServer {
    /// Creates a new SQL Server dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqlServer {
    fn kind(&self) -> DialectKind {
        DialectKind::SqlServer
    }

    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn pk_retrieval(&self, _pk_column: &str, _out_param: &str) -> PkRetrieval {
        PkRetrieval::TrailingScalar {
            statement: String::from("; SELECT SCOPE_IDENTITY()"),
        }
    }

    fn temp_table_prefixes(&self) -> &'static [&'static str] {
        &["##", "#"]
    }

    fn server_time_query(&self) -> &'static str {
        "SELECT GETDATE()"
    }

    fn call_procedure(&self, name: &str, params: &[SqlParam]) -> Result<String> {
        let args = params
            .iter()
            .map(|p| self.placeholder(&p.name))
            .collect::<Vec<_>>()
            .join(", ");
        if args.is_empty() {
            Ok(format!("EXEC {name}"))
        } else {
            Ok(format!("EXEC {name} {args}"))
        }
    }

    fn call_function(&self, name: &str, params: &[SqlParam]) -> Result<String> {
        let args = params
            .iter()
            .map(|p| self.placeholder(&p.name))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("SELECT {name}({args})"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::value::SqlValue;

    #[test]
    fn test_sqlserver_pk_retrieval() {
        let d = SqlServer::new();
        assert_eq!(
            d.pk_retrieval("id", "p_out_id"),
            PkRetrieval::TrailingScalar {
                statement: String::from("; SELECT SCOPE_IDENTITY()")
            }
        );
    }

    #[test]
    fn test_sqlserver_temp_tables() {
        let d = SqlServer::new();
        assert!(d.validate_temp_table("#work").is_ok());
        assert!(d.validate_temp_table("##shared_work").is_ok());
        assert!(matches!(
            d.validate_temp_table("temp_work"),
            Err(CoreError::InvalidTempTableName { .. })
        ));
    }

    #[test]
    fn test_sqlserver_exec_framing() {
        let d = SqlServer::new();
        let params = vec![
            SqlParam::new("p_0", SqlValue::Int(1)),
            SqlParam::new("p_1", SqlValue::Int(2)),
        ];
        assert_eq!(
            d.call_procedure("dbo.refresh_totals", &params).unwrap(),
            "EXEC dbo.refresh_totals @p_0, @p_1"
        );
        assert_eq!(d.call_procedure("dbo.nightly", &[]).unwrap(), "EXEC dbo.nightly");
    }
}
