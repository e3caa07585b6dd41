//! Per-table batch transfer pipeline.
//!
//! Moves one table's rows from source to target: optional DDL, optional
//! truncate, trigger scope, keyset-paginated reads (or a degraded cursor
//! stream for keyless tables), batched idempotent inserts, and sequence
//! reset.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::catalog::{TableRef, TableSchema};
use crate::client::DbClient;
use crate::config::MigrationOptions;
use crate::error::{MigrateError, Result};

/// Cooperative cancellation token shared between a run and its caller.
///
/// Checked at batch and table boundaries only; an in-flight batch always
/// finishes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Outcome of one table's transfer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferStats {
    /// Rows read from the source and offered to the target.
    pub rows_transferred: u64,

    /// Number of batches processed.
    pub batches: u64,

    /// Whether the keyless single-pass cursor fallback was used.
    pub degraded: bool,
}

/// One table's transfer, bound to a source/target pair and run options.
pub struct TableTransfer<'a> {
    pub source: &'a Arc<dyn DbClient>,
    pub target: &'a Arc<dyn DbClient>,
    pub options: &'a MigrationOptions,
    pub cancel: &'a CancelToken,
}

impl TableTransfer<'_> {
    /// Run the full pipeline for `table`, writing to `target_table`.
    ///
    /// `on_batch` is invoked after every batch with cumulative rows and
    /// whether the keyless fallback is in use. Errors are scoped to this
    /// table except [`MigrateError::Cancelled`], which the orchestrator
    /// treats as run-scoped.
    pub async fn run(
        &self,
        table: &TableRef,
        target_table: &TableRef,
        on_batch: &mut (dyn FnMut(u64, bool) + Send),
    ) -> Result<TransferStats> {
        let started = Instant::now();

        let schema = self
            .source
            .table_schema(table)
            .await?
            .ok_or_else(|| MigrateError::transfer(table.full_name(), "table not found on source"))?;

        self.prepare_target(&schema, target_table).await?;

        let triggers_disabled = if self.options.disable_constraints {
            self.target.set_triggers_enabled(target_table, false).await?;
            true
        } else {
            false
        };

        // Re-enable triggers on every exit path before propagating the body
        // result, including cancellation.
        let body = self.copy_rows(&schema, table, target_table, on_batch).await;

        if triggers_disabled {
            if let Err(e) = self.target.set_triggers_enabled(target_table, true).await {
                warn!("Failed to re-enable triggers on {}: {}", target_table, e);
            }
        }

        let stats = body?;

        if schema.has_sequence_columns() {
            self.target.reset_sequences(target_table).await?;
        }

        let elapsed = started.elapsed();
        info!(
            "Transferred {}: {} rows in {} batches ({:.0} rows/sec){}",
            table,
            stats.rows_transferred,
            stats.batches,
            rows_per_second(stats.rows_transferred, elapsed.as_secs_f64()),
            if stats.degraded { " [degraded]" } else { "" }
        );

        Ok(stats)
    }

    async fn prepare_target(&self, schema: &TableSchema, target_table: &TableRef) -> Result<()> {
        if self.options.create_table_if_not_exists {
            self.target.create_schema(&target_table.schema).await?;
            self.target.create_table(schema, target_table).await?;
        }

        if self.options.truncate_before_insert {
            // Truncating a table that does not exist yet is a no-op.
            if self.target.table_exists(target_table).await? {
                self.target.truncate_table(target_table).await?;
            }
        }

        Ok(())
    }

    async fn copy_rows(
        &self,
        schema: &TableSchema,
        table: &TableRef,
        target_table: &TableRef,
        on_batch: &mut (dyn FnMut(u64, bool) + Send),
    ) -> Result<TransferStats> {
        match schema.transfer_key() {
            Some(key) => {
                self.copy_keyset(schema, table, target_table, key, on_batch)
                    .await
            }
            None => {
                warn!(
                    "{} has no single-column key; falling back to a single-pass cursor stream",
                    table
                );
                self.copy_streamed(schema, table, target_table, on_batch)
                    .await
            }
        }
    }

    async fn copy_keyset(
        &self,
        schema: &TableSchema,
        table: &TableRef,
        target_table: &TableRef,
        key: &str,
        on_batch: &mut (dyn FnMut(u64, bool) + Send),
    ) -> Result<TransferStats> {
        let columns = schema.column_names();
        let key_idx = columns
            .iter()
            .position(|c| c == key)
            .ok_or_else(|| MigrateError::transfer(table.full_name(), "transfer key not in column list"))?;

        let mut stats = TransferStats::default();
        let mut cursor = None;

        loop {
            if self.cancel.is_cancelled() {
                return Err(MigrateError::Cancelled);
            }

            let batch = self
                .source
                .fetch_key_batch(
                    table,
                    &columns,
                    key,
                    cursor.as_ref(),
                    self.options.batch_size,
                )
                .await?;
            if batch.is_empty() {
                break;
            }

            let last_row = &batch[batch.len() - 1];
            cursor = Some(last_row[key_idx].clone());

            let fetched = batch.len();
            self.target
                .insert_batch(target_table, &columns, &batch)
                .await
                .map_err(|e| MigrateError::transfer(table.full_name(), e))?;

            stats.rows_transferred += fetched as u64;
            stats.batches += 1;
            on_batch(stats.rows_transferred, false);
            debug!(
                "{}: batch {} done, {} rows so far",
                table, stats.batches, stats.rows_transferred
            );

            if fetched < self.options.batch_size {
                break;
            }
        }

        Ok(stats)
    }

    async fn copy_streamed(
        &self,
        schema: &TableSchema,
        table: &TableRef,
        target_table: &TableRef,
        on_batch: &mut (dyn FnMut(u64, bool) + Send),
    ) -> Result<TransferStats> {
        let columns = schema.column_names();
        let mut stream = self.source.open_row_stream(table, &columns).await?;

        let mut stats = TransferStats {
            degraded: true,
            ..Default::default()
        };

        loop {
            if self.cancel.is_cancelled() {
                return Err(MigrateError::Cancelled);
            }

            let batch = stream.next_batch(self.options.batch_size).await?;
            if batch.is_empty() {
                break;
            }

            self.target
                .insert_batch(target_table, &columns, &batch)
                .await
                .map_err(|e| MigrateError::transfer(table.full_name(), e))?;

            stats.rows_transferred += batch.len() as u64;
            stats.batches += 1;
            on_batch(stats.rows_transferred, true);
        }

        Ok(stats)
    }
}

fn rows_per_second(rows: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs > 0.0 {
        rows as f64 / elapsed_secs
    } else {
        0.0
    }
}
