//! The save/delete orchestrator.
//!
//! `save` decides insert-vs-update from the entity's primary-key
//! value, falls back to insert when an update matches no rows, and
//! retrieves the generated key through the dialect's strategy exactly
//! once. Bulk saves run under a single transaction by default and roll
//! back entirely on any failure.

use rowforge_core::{Entity, PkMode, PkRetrieval, SqlParam, SqlValue, Statement};
use tracing::{debug, warn};

use crate::connection::DbConnection;
use crate::error::Result;
use crate::executor::Executor;

/// Per-call options for `save` and bulk saves.
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Insert the entity's primary-key value verbatim instead of
    /// letting the backend generate one.
    pub include_pk: bool,
    /// Fill the key column from this named sequence on insert.
    pub sequence: Option<String>,
    /// Retrieve the generated key and assign it back onto the entity.
    /// Only applies to single-column keys the caller did not supply.
    pub retrieve_pk: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            include_pk: false,
            sequence: None,
            retrieve_pk: true,
        }
    }
}

impl SaveOptions {
    /// Options that insert the entity's key verbatim.
    #[must_use]
    pub fn with_pk() -> Self {
        Self {
            include_pk: true,
            ..Self::default()
        }
    }

    /// Options that fill the key from a named sequence.
    #[must_use]
    pub fn with_sequence(sequence: impl Into<String>) -> Self {
        Self {
            sequence: Some(sequence.into()),
            ..Self::default()
        }
    }

    fn pk_mode(&self) -> PkMode {
        if self.include_pk {
            PkMode::Include
        } else if let Some(sequence) = &self.sequence {
            PkMode::Sequence(sequence.clone())
        } else {
            PkMode::Omit
        }
    }
}

/// How a bulk save scopes its transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulkMode {
    /// The whole batch in one transaction; any failure rolls back
    /// every row.
    #[default]
    SingleTransaction,
    /// Each row in its own implicit transaction; earlier rows stay
    /// committed when a later row fails.
    PerRow,
}

impl<X: Executor> DbConnection<X> {
    /// Saves an entity to its default table.
    ///
    /// Insert or update is chosen from the primary-key value: a key
    /// equal to its type default (or the `-1` sentinel) counts as
    /// absent. On insert the generated key is written back onto the
    /// entity.
    pub async fn save<E: Entity>(&mut self, entity: &mut E) -> Result<()> {
        self.save_with(entity, E::TABLE, &SaveOptions::default()).await
    }

    /// Saves an entity to an explicit table.
    pub async fn save_to<E: Entity>(&mut self, entity: &mut E, table: &str) -> Result<()> {
        self.save_with(entity, table, &SaveOptions::default()).await
    }

    /// Saves an entity with explicit options.
    ///
    /// A key that is "present" attempts an UPDATE first; when that
    /// matches no rows the entity did not exist under that key, and
    /// the save falls through to INSERT.
    pub async fn save_with<E: Entity>(
        &mut self,
        entity: &mut E,
        table: &str,
        options: &SaveOptions,
    ) -> Result<()> {
        let mapping = self.synthesizer.mapping::<E>(table)?;

        let pk_present = mapping
            .pk_columns()
            .all(|c| !entity.value_of(c.field).is_type_default());

        if pk_present {
            let mut stmt = self.synthesizer.update(entity, table)?;
            let affected = self.run_statement(&mut stmt).await?;
            if affected > 0 {
                return Ok(());
            }
            debug!(table, "update matched no rows; falling back to insert");
        }

        self.insert_entity(entity, table, options).await
    }

    /// Deletes an entity's row from its default table.
    pub async fn delete<E: Entity>(&mut self, entity: &E) -> Result<()> {
        self.delete_from(entity, E::TABLE).await
    }

    /// Deletes an entity's row from an explicit table. Hard delete by
    /// full key.
    pub async fn delete_from<E: Entity>(&mut self, entity: &E, table: &str) -> Result<()> {
        let mut stmt = self.synthesizer.delete(entity, table)?;
        self.run_statement(&mut stmt).await?;
        Ok(())
    }

    /// Saves a homogeneous batch to its default table, atomically.
    pub async fn save_all<E: Entity>(&mut self, entities: &mut [E]) -> Result<()> {
        self.save_all_with(entities, E::TABLE, &SaveOptions::default(), BulkMode::default())
            .await
    }

    /// Saves a homogeneous batch with explicit options.
    ///
    /// The first element goes through the single-row path (and gets
    /// its generated key back); the rest combine into one multi-row
    /// statement in the dialect's bulk grammar, in list order. Under
    /// [`BulkMode::SingleTransaction`] a mid-batch failure rolls the
    /// whole batch back and rethrows the original error; a transaction
    /// the caller already opened is left for the caller.
    pub async fn save_all_with<E: Entity>(
        &mut self,
        entities: &mut [E],
        table: &str,
        options: &SaveOptions,
        mode: BulkMode,
    ) -> Result<()> {
        let Some((first, rest)) = entities.split_first_mut() else {
            return Ok(());
        };

        match mode {
            BulkMode::PerRow => {
                self.save_with(first, table, options).await?;
                for entity in rest.iter_mut() {
                    self.save_with(entity, table, options).await?;
                }
                Ok(())
            }
            BulkMode::SingleTransaction => {
                let own_tx = !self.in_tx;
                if own_tx {
                    self.begin().await?;
                }

                let result = self.bulk_body(first, rest, table, options).await;
                match result {
                    Ok(()) => {
                        if own_tx {
                            self.commit().await?;
                        }
                        Ok(())
                    }
                    Err(err) => {
                        if own_tx {
                            if let Err(rollback_err) = self.rollback().await {
                                warn!(
                                    error = %rollback_err,
                                    "rollback after failed bulk save also failed"
                                );
                            }
                        }
                        Err(err)
                    }
                }
            }
        }
    }

    async fn bulk_body<E: Entity>(
        &mut self,
        first: &mut E,
        rest: &mut [E],
        table: &str,
        options: &SaveOptions,
    ) -> Result<()> {
        self.save_with(first, table, options).await?;
        if rest.is_empty() {
            return Ok(());
        }

        let mut stmt = self
            .synthesizer
            .bulk_insert(&*rest, table, &options.pk_mode())?;
        self.run_statement(&mut stmt).await?;
        Ok(())
    }

    async fn insert_entity<E: Entity>(
        &mut self,
        entity: &mut E,
        table: &str,
        options: &SaveOptions,
    ) -> Result<()> {
        let pk_mode = options.pk_mode();
        let want_key = options.retrieve_pk && !options.include_pk;
        let mut stmt = self.synthesizer.insert(entity, table, &pk_mode, want_key)?;
        debug!(table, sql = %stmt.sql, "inserting");

        let generated = match stmt.pk_retrieval.clone() {
            Some(PkRetrieval::Returning { .. } | PkRetrieval::TrailingScalar { .. }) => {
                let result = self.executor.fetch_scalar(&stmt.sql, &mut stmt.params).await;
                self.dispose(&mut stmt);
                result.map_err(|e| e.tag(stmt.kind))?
            }
            Some(PkRetrieval::OutputParameter { param, .. }) => {
                let result = self.executor.execute(&stmt.sql, &mut stmt.params).await;
                let out = stmt
                    .params
                    .iter()
                    .find(|p| p.name == param)
                    .map(|p| p.value.clone());
                self.dispose(&mut stmt);
                result.map_err(|e| e.tag(stmt.kind))?;
                out
            }
            Some(PkRetrieval::FollowUpQuery { query }) => {
                let result = self.executor.execute(&stmt.sql, &mut stmt.params).await;
                self.dispose(&mut stmt);
                result.map_err(|e| e.tag(stmt.kind))?;
                self.executor
                    .fetch_scalar(&query, &mut [])
                    .await
                    .map_err(|e| e.tag(stmt.kind))?
            }
            None => {
                let result = self.executor.execute(&stmt.sql, &mut stmt.params).await;
                self.dispose(&mut stmt);
                result.map_err(|e| e.tag(stmt.kind))?;
                None
            }
        };

        if let (Some(field), Some(value)) = (stmt.pk_field, generated) {
            if value != SqlValue::Null {
                entity.write_pk(field, &value)?;
            }
        }

        Ok(())
    }

    /// Executes a statement and releases LOB slots afterwards,
    /// success or failure; disposal never masks the original error.
    async fn run_statement(&mut self, stmt: &mut Statement) -> Result<u64> {
        debug!(op = %stmt.kind, sql = %stmt.sql, "executing");
        let result = self.executor.execute(&stmt.sql, &mut stmt.params).await;
        self.dispose(stmt);
        result.map_err(|e| e.tag(stmt.kind))
    }

    fn dispose(&self, stmt: &mut Statement) {
        if stmt.params.iter().any(SqlParam::is_lob) {
            self.dialect().dispose_lobs(&mut stmt.params);
        }
    }
}
