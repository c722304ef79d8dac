//! The connection and transaction wrapper.
//!
//! A `DbConnection` owns one live executor and at most one active
//! transaction. Transactions are explicit: an uncommitted transaction
//! is rolled back on `close`, and a connection dropped mid-transaction
//! leaves the backend to discard the uncommitted work.

use std::sync::Arc;

use rowforge_core::{
    Dialect, DialectKind, NamingConvention, SchemaRegistry, SqlParam, SqlValue, Synthesizer,
};
use tracing::{debug, warn};

use crate::error::{DbError, Result};
use crate::executor::{Executor, SqliteExecutor};

/// A live backend connection with save/delete orchestration.
///
/// Created through a connection factory such as [`connect_sqlite`], or
/// directly from any [`Executor`] implementation via [`Self::new`].
#[derive(Debug)]
pub struct DbConnection<X: Executor> {
    pub(crate) executor: X,
    pub(crate) synthesizer: Arc<Synthesizer>,
    pub(crate) in_tx: bool,
}

impl<X: Executor> DbConnection<X> {
    /// Wraps an executor with a shared synthesis engine.
    #[must_use]
    pub fn new(executor: X, synthesizer: Arc<Synthesizer>) -> Self {
        Self {
            executor,
            synthesizer,
            in_tx: false,
        }
    }

    /// The capability provider for this connection's backend.
    #[must_use]
    pub fn dialect(&self) -> &'static dyn Dialect {
        self.synthesizer.dialect()
    }

    /// The synthesis engine behind this connection.
    #[must_use]
    pub fn synthesizer(&self) -> &Arc<Synthesizer> {
        &self.synthesizer
    }

    /// Returns whether a transaction is active.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.in_tx
    }

    /// The underlying executor, for driver-level access.
    #[must_use]
    pub fn executor(&self) -> &X {
        &self.executor
    }

    /// Mutable access to the underlying executor.
    pub fn executor_mut(&mut self) -> &mut X {
        &mut self.executor
    }

    /// Begins a transaction. Nested transactions are not supported.
    pub async fn begin(&mut self) -> Result<()> {
        if self.in_tx {
            return Err(DbError::Transaction("transaction already active"));
        }
        self.executor.begin().await?;
        self.in_tx = true;
        debug!("transaction started");
        Ok(())
    }

    /// Commits the active transaction.
    pub async fn commit(&mut self) -> Result<()> {
        if !self.in_tx {
            return Err(DbError::Transaction("no active transaction"));
        }
        self.executor.commit().await?;
        self.in_tx = false;
        debug!("transaction committed");
        Ok(())
    }

    /// Rolls back the active transaction.
    pub async fn rollback(&mut self) -> Result<()> {
        if !self.in_tx {
            return Err(DbError::Transaction("no active transaction"));
        }
        self.executor.rollback().await?;
        self.in_tx = false;
        debug!("transaction rolled back");
        Ok(())
    }

    /// Closes the connection, rolling back any open transaction.
    pub async fn close(mut self) -> Result<()> {
        if self.in_tx {
            warn!("connection closed with open transaction; rolling back");
            self.rollback().await?;
        }
        Ok(())
    }

    /// Executes caller-supplied SQL, returning affected rows.
    ///
    /// The text uses the canonical `@name` marker; it is rewritten to
    /// the backend's marker before submission.
    pub async fn execute_raw(&mut self, sql: &str, params: &mut [SqlParam]) -> Result<u64> {
        let sql = self.dialect().normalize_statement(sql);
        self.executor.execute(&sql, params).await
    }

    /// Executes caller-supplied SQL, returning its first scalar.
    pub async fn fetch_scalar_raw(
        &mut self,
        sql: &str,
        params: &mut [SqlParam],
    ) -> Result<Option<SqlValue>> {
        let sql = self.dialect().normalize_statement(sql);
        self.executor.fetch_scalar(&sql, params).await
    }

    /// Returns the backend's current time.
    pub async fn server_time(&mut self) -> Result<SqlValue> {
        let query = self.dialect().server_time_query();
        self.executor
            .fetch_scalar(query, &mut [])
            .await?
            .ok_or(DbError::NotFound)
    }

    /// Validates a temp-table name against the backend's convention.
    ///
    /// Call before any temp-table DDL; a mismatch is a configuration
    /// error, not a SQL error.
    pub fn validate_temp_table(&self, name: &str) -> Result<()> {
        self.dialect().validate_temp_table(name)?;
        Ok(())
    }

    /// Calls a stored procedure, framed for the backend.
    pub async fn call_procedure(&mut self, name: &str, params: &mut [SqlParam]) -> Result<u64> {
        let sql = self.dialect().call_procedure(name, params)?;
        self.executor.execute(&sql, params).await
    }

    /// Calls a function returning a scalar, framed for the backend.
    pub async fn call_function(
        &mut self,
        name: &str,
        params: &mut [SqlParam],
    ) -> Result<Option<SqlValue>> {
        let sql = self.dialect().call_function(name, params)?;
        self.executor.fetch_scalar(&sql, params).await
    }
}

impl<X: Executor> Drop for DbConnection<X> {
    fn drop(&mut self) {
        if self.in_tx {
            warn!("connection dropped with open transaction; backend will discard it");
        }
    }
}

/// Opens a SQLite connection with the process-wide schema registry.
///
/// Session setup beyond opening the handle (timezones, commit-wait
/// modes on other backends) belongs to the caller's connection
/// factory, not here.
pub async fn connect_sqlite(
    url: &str,
    convention: NamingConvention,
) -> Result<DbConnection<SqliteExecutor>> {
    let executor = SqliteExecutor::connect(url).await?;
    let synthesizer = Arc::new(Synthesizer::with_registry(
        DialectKind::Sqlite,
        convention,
        SchemaRegistry::global(),
    ));
    Ok(DbConnection::new(executor, synthesizer))
}
