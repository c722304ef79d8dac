//! Fetch-by-key helpers for the SQLite executor.
//!
//! Thin wrappers over `sqlx::FromRow`; the generic row-to-object
//! mapping itself is the driver's concern, not this crate's.

use rowforge_core::{Entity, SqlParam, ToSqlValue};
use sqlx::sqlite::SqliteRow;

use crate::connection::DbConnection;
use crate::error::{DbError, Result};
use crate::executor::SqliteExecutor;

impl DbConnection<SqliteExecutor> {
    /// Fetches one row by primary key, or `None`.
    pub async fn fetch_optional_by_pk<E>(
        &mut self,
        table: &str,
        pk: impl ToSqlValue,
    ) -> Result<Option<E>>
    where
        E: Entity + for<'r> sqlx::FromRow<'r, SqliteRow> + Unpin + Send,
    {
        let mapping = self.synthesizer.mapping::<E>(table)?;
        let Some(pk_col) = mapping.pk_columns().next().filter(|_| mapping.pk_len() == 1)
        else {
            return Err(DbError::Unsupported("fetch by composite key"));
        };

        let sql = format!(
            "SELECT {} FROM {} WHERE {} = @p_pk",
            mapping.select_list(),
            mapping.table(),
            pk_col.column
        );
        let mut params = [SqlParam::new("p_pk", pk.to_sql_value())];
        self.executor.fetch_optional_as::<E>(&sql, &mut params).await
    }

    /// Fetches exactly one row by primary key.
    ///
    /// # Errors
    ///
    /// `NotFound` when no row matches, as opposed to the legitimately
    /// empty result of [`Self::fetch_optional_by_pk`].
    pub async fn fetch_by_pk<E>(&mut self, table: &str, pk: impl ToSqlValue) -> Result<E>
    where
        E: Entity + for<'r> sqlx::FromRow<'r, SqliteRow> + Unpin + Send,
    {
        self.fetch_optional_by_pk(table, pk)
            .await?
            .ok_or(DbError::NotFound)
    }
}
