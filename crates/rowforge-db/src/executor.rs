//! The raw execution seam over the backend driver.
//!
//! An `Executor` submits synthesized statements and reports affected
//! rows or a scalar result. The SQLite implementation ships here,
//! built on `sqlx`; other backends plug in behind the same trait,
//! which is also how tests script backend behavior without a server.

use rowforge_core::{CoreError, ParamDirection, SqlParam, SqlValue};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Connection, Row, SqliteConnection};
use tracing::debug;

use crate::error::{DbError, Result};

/// Driver-level execution of statement text with ordered parameters.
///
/// Implementations write values back onto `Out`/`InOut` parameters
/// when the backend supports them.
#[allow(async_fn_in_trait)]
pub trait Executor: Send {
    /// Executes a statement, returning the number of affected rows.
    async fn execute(&mut self, sql: &str, params: &mut [SqlParam]) -> Result<u64>;

    /// Executes a statement and returns its first scalar, if any.
    async fn fetch_scalar(
        &mut self,
        sql: &str,
        params: &mut [SqlParam],
    ) -> Result<Option<SqlValue>>;

    /// Begins a transaction on this connection.
    async fn begin(&mut self) -> Result<()>;

    /// Commits the active transaction.
    async fn commit(&mut self) -> Result<()>;

    /// Rolls back the active transaction.
    async fn rollback(&mut self) -> Result<()>;
}

/// SQLite executor over a single owned `sqlx` connection.
#[derive(Debug)]
pub struct SqliteExecutor {
    conn: SqliteConnection,
}

impl SqliteExecutor {
    /// Opens a connection to the given SQLite URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let conn = SqliteConnection::connect(url).await?;
        Ok(Self { conn })
    }

    /// Wraps an already-open connection.
    #[must_use]
    pub fn from_connection(conn: SqliteConnection) -> Self {
        Self { conn }
    }

    /// Rewrites `@name` placeholders to `?` and returns the bind order.
    ///
    /// String literals are left untouched. Every placeholder must name
    /// a supplied parameter.
    fn rewrite<'p>(sql: &str, params: &'p [SqlParam]) -> Result<(String, Vec<&'p SqlValue>)> {
        let mut out = String::with_capacity(sql.len());
        let mut order: Vec<&'p SqlValue> = Vec::with_capacity(params.len());
        let mut chars = sql.chars().peekable();
        let mut in_literal = false;

        while let Some(c) = chars.next() {
            match c {
                '\'' => {
                    in_literal = !in_literal;
                    out.push(c);
                }
                '@' if !in_literal => {
                    let mut name = String::new();
                    while let Some(&n) = chars.peek() {
                        if n.is_ascii_alphanumeric() || n == '_' {
                            name.push(n);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    let param = params.iter().find(|p| p.name == name).ok_or_else(|| {
                        DbError::Configuration(CoreError::UnknownField { field: name.clone() })
                    })?;
                    order.push(&param.value);
                    out.push('?');
                }
                _ => out.push(c),
            }
        }

        Ok((out, order))
    }

    fn reject_out_params(params: &[SqlParam]) -> Result<()> {
        if params.iter().any(|p| p.direction != ParamDirection::In) {
            return Err(DbError::Unsupported("output parameters"));
        }
        Ok(())
    }

    /// Fetches at most one row, mapped through `sqlx::FromRow`.
    pub async fn fetch_optional_as<T>(
        &mut self,
        sql: &str,
        params: &mut [SqlParam],
    ) -> Result<Option<T>>
    where
        T: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin,
    {
        Self::reject_out_params(params)?;
        let (rewritten, order) = Self::rewrite(sql, params)?;
        debug!(sql = %rewritten, "fetching row");

        let mut query = sqlx::query_as::<_, T>(&rewritten);
        for value in order {
            query = bind_as(query, value);
        }
        Ok(query.fetch_optional(&mut self.conn).await?)
    }
}

impl Executor for SqliteExecutor {
    async fn execute(&mut self, sql: &str, params: &mut [SqlParam]) -> Result<u64> {
        Self::reject_out_params(params)?;
        let (rewritten, order) = Self::rewrite(sql, params)?;
        debug!(sql = %rewritten, "executing");

        let mut query = sqlx::query(&rewritten);
        for value in order {
            query = bind(query, value);
        }
        let result = query.execute(&mut self.conn).await?;
        Ok(result.rows_affected())
    }

    async fn fetch_scalar(
        &mut self,
        sql: &str,
        params: &mut [SqlParam],
    ) -> Result<Option<SqlValue>> {
        Self::reject_out_params(params)?;
        let (rewritten, order) = Self::rewrite(sql, params)?;
        debug!(sql = %rewritten, "fetching scalar");

        let mut query = sqlx::query(&rewritten);
        for value in order {
            query = bind(query, value);
        }
        let row = query.fetch_optional(&mut self.conn).await?;
        Ok(row.map(|r| decode_scalar(&r)))
    }

    async fn begin(&mut self) -> Result<()> {
        sqlx::query("BEGIN").execute(&mut self.conn).await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        sqlx::query("COMMIT").execute(&mut self.conn).await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        sqlx::query("ROLLBACK").execute(&mut self.conn).await?;
        Ok(())
    }
}

/// Binds a `SqlValue` onto a plain query.
fn bind<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
    value: &'q SqlValue,
) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(i) => query.bind(*i),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.as_str()),
        SqlValue::Blob(b) => query.bind(b.as_slice()),
        SqlValue::DateTime(dt) => query.bind(*dt),
        SqlValue::Json(v) => query.bind(v.to_string()),
    }
}

/// Binds a `SqlValue` onto a `query_as` query.
fn bind_as<'q, T>(
    query: sqlx::query::QueryAs<'q, sqlx::Sqlite, T, SqliteArguments<'q>>,
    value: &'q SqlValue,
) -> sqlx::query::QueryAs<'q, sqlx::Sqlite, T, SqliteArguments<'q>>
where
    T: for<'r> sqlx::FromRow<'r, SqliteRow>,
{
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(i) => query.bind(*i),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.as_str()),
        SqlValue::Blob(b) => query.bind(b.as_slice()),
        SqlValue::DateTime(dt) => query.bind(*dt),
        SqlValue::Json(v) => query.bind(v.to_string()),
    }
}

/// Decodes the first column of a row into a `SqlValue`.
fn decode_scalar(row: &SqliteRow) -> SqlValue {
    if let Ok(v) = row.try_get::<i64, _>(0) {
        return SqlValue::Int(v);
    }
    if let Ok(v) = row.try_get::<f64, _>(0) {
        return SqlValue::Float(v);
    }
    if let Ok(v) = row.try_get::<String, _>(0) {
        return SqlValue::Text(v);
    }
    if let Ok(v) = row.try_get::<Vec<u8>, _>(0) {
        return SqlValue::Blob(v);
    }
    SqlValue::Null
}
