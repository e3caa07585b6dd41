//! Migration run orchestration: sequential table processing, progress
//! snapshots, cancellation, and result aggregation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

use crate::catalog::TableRef;
use crate::client::DbClient;
use crate::config::MigrationRequest;
use crate::error::{MigrateError, Result};
use crate::transfer::{CancelToken, TableTransfer};

/// Lifecycle stage of the table named in a progress snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Starting,
    Preparing,
    Migrating,
    Completed,
    Failed,
    Cancelled,
}

/// Full progress snapshot, emitted after every batch and at every table
/// lifecycle transition. Consumers can render any single event without
/// history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationProgress {
    /// Table currently being processed, `schema.name`.
    pub table_name: String,

    /// 1-based position of that table in the run.
    pub current_table: usize,

    /// Total tables in the run.
    pub total_tables: usize,

    /// Cumulative rows transferred across the whole run.
    pub rows_transferred: u64,

    /// Advisory run denominator, from source row counts taken at run start.
    pub total_rows: u64,

    /// Stage of the named table.
    pub status: TableStatus,

    /// Whether the named table is moving through the keyless single-pass
    /// cursor fallback instead of keyset pagination.
    #[serde(default)]
    pub degraded: bool,

    /// Failure detail when `status` is `Failed`.
    pub error: Option<String>,
}

/// Terminal summary of a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    /// True when every table transferred and the run was not cancelled.
    pub success: bool,

    /// Tables that completed without error.
    pub tables_migrated: usize,

    /// Rows transferred by completed tables.
    pub total_rows: u64,

    /// One entry per failed table, in attempt order, each naming the table.
    /// Cancellation appends a run-scoped marker.
    pub errors: Vec<String>,

    /// Wall-clock duration of the run.
    pub elapsed_ms: u64,
}

impl MigrationResult {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Runs one migration request end to end.
///
/// Tables are processed sequentially in request order; a per-table failure is
/// recorded and the run moves on. Only validation failures, an unusable
/// connection, and cancellation end the run early.
pub struct Orchestrator {
    source: Arc<dyn DbClient>,
    target: Arc<dyn DbClient>,
    running: AtomicBool,
}

/// Clears the running flag when the run exits, on every path.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Orchestrator {
    pub fn new(source: Arc<dyn DbClient>, target: Arc<dyn DbClient>) -> Self {
        Self {
            source,
            target,
            running: AtomicBool::new(false),
        }
    }

    /// Execute the request. At most one run per orchestrator may be in
    /// flight; a second call fails fast with [`MigrateError::AlreadyRunning`].
    pub async fn run(
        &self,
        request: &MigrationRequest,
        cancel: &CancelToken,
        progress: Option<UnboundedSender<MigrationProgress>>,
    ) -> Result<MigrationResult> {
        request.validate()?;

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(MigrateError::AlreadyRunning);
        }
        let _guard = RunGuard(&self.running);

        let started = Instant::now();
        let total_tables = request.tables.len();
        info!("Starting migration of {} tables", total_tables);

        let total_rows = self.count_source_rows(&request.tables).await;

        let transfer = TableTransfer {
            source: &self.source,
            target: &self.target,
            options: &request.options,
            cancel,
        };

        let emit = |snapshot: MigrationProgress| {
            if let Some(tx) = &progress {
                // Fire and forget; a gone consumer never stalls the run.
                let _ = tx.send(snapshot);
            }
        };

        let mut tables_migrated = 0usize;
        let mut rows_transferred = 0u64;
        let mut errors: Vec<String> = Vec::new();
        let mut cancelled = false;

        for (idx, table) in request.tables.iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let current_table = idx + 1;
            let target_table = match &request.target_schema_override {
                Some(schema) => table.in_schema(schema),
                None => table.clone(),
            };

            let snapshot = |status, rows, degraded, err: Option<String>| MigrationProgress {
                table_name: table.full_name(),
                current_table,
                total_tables,
                rows_transferred: rows,
                total_rows,
                status,
                degraded,
                error: err,
            };

            emit(snapshot(TableStatus::Starting, rows_transferred, false, None));
            emit(snapshot(TableStatus::Preparing, rows_transferred, false, None));

            let base_rows = rows_transferred;
            let mut on_batch = |table_rows: u64, degraded: bool| {
                emit(snapshot(
                    TableStatus::Migrating,
                    base_rows + table_rows,
                    degraded,
                    None,
                ));
            };

            match transfer.run(table, &target_table, &mut on_batch).await {
                Ok(stats) => {
                    tables_migrated += 1;
                    rows_transferred += stats.rows_transferred;
                    emit(snapshot(
                        TableStatus::Completed,
                        rows_transferred,
                        stats.degraded,
                        None,
                    ));
                }
                Err(MigrateError::Cancelled) => {
                    // Partial rows of the interrupted table stay out of the
                    // totals; already-completed tables are never rolled back.
                    warn!("Migration cancelled during {}", table);
                    emit(snapshot(TableStatus::Cancelled, rows_transferred, false, None));
                    cancelled = true;
                    break;
                }
                Err(e) if e.is_run_fatal() => {
                    // No table-level work can be trusted once the connection
                    // itself is gone; abort instead of recording and moving on.
                    error!("Aborting run at {}: {}", table, e);
                    return Err(e);
                }
                Err(e) => {
                    let message = format!("{}: {}", table.full_name(), e);
                    error!("Table {} failed: {}", table, e);
                    emit(snapshot(
                        TableStatus::Failed,
                        rows_transferred,
                        false,
                        Some(message.clone()),
                    ));
                    errors.push(message);
                }
            }
        }

        if cancelled {
            errors.push("migration cancelled by user".to_string());
        }

        let result = MigrationResult {
            success: errors.is_empty(),
            tables_migrated,
            total_rows: rows_transferred,
            errors,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            "Migration finished: success={} tables={} rows={} elapsed={}ms",
            result.success, result.tables_migrated, result.total_rows, result.elapsed_ms
        );

        Ok(result)
    }

    /// Sum exact source row counts for the progress denominator. A count
    /// failure degrades that table to 0 rather than blocking the run; the
    /// transfer itself will surface the real error.
    async fn count_source_rows(&self, tables: &[TableRef]) -> u64 {
        let mut total = 0u64;
        for table in tables {
            match self.source.row_count(table).await {
                Ok(count) => total += count.max(0) as u64,
                Err(e) => warn!("Could not count rows of {}: {}", table, e),
            }
        }
        total
    }
}
