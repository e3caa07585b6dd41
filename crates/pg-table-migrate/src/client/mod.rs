//! Database client capability seam.
//!
//! The engine consumes the driver through the [`DbClient`] trait: catalog
//! introspection, target-side DDL, and batched row movement. Source and
//! target share the PostgreSQL dialect, so one trait serves both sides.
//! Tests substitute in-memory implementations at this seam.

mod manager;
pub mod postgres;

pub use manager::ConnectionManager;
pub use postgres::PgClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{ForeignKey, TableListing, TableRef, TableSchema};
use crate::error::Result;
use crate::value::SqlValue;

/// Opaque identifier for an open database session.
///
/// The engine holds only this identifier; the pool and credentials live in
/// the [`ConnectionManager`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionHandle(String);

impl ConnectionHandle {
    /// Mint a fresh handle.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single pass over a table's rows, for tables with no stable key.
///
/// Backed by a server-side cursor in the PostgreSQL implementation; the pass
/// is not resumable.
#[async_trait]
pub trait RowStream: Send {
    /// Fetch up to `limit` rows. An empty batch signals the end of the pass.
    async fn next_batch(&mut self, limit: usize) -> Result<Vec<Vec<SqlValue>>>;
}

/// Capabilities the engine requires from a database session.
#[async_trait]
pub trait DbClient: Send + Sync {
    // --- catalog introspection (read-only) ---

    /// List user tables with advisory metadata. Statistics failures for one
    /// table degrade to zeros rather than aborting the listing.
    async fn list_tables(&self) -> Result<Vec<TableListing>>;

    /// List user-visible schemas.
    async fn list_schemas(&self) -> Result<Vec<String>>;

    /// Whether the table exists.
    async fn table_exists(&self, table: &TableRef) -> Result<bool>;

    /// Full schema for a table, or `None` when the table does not exist.
    async fn table_schema(&self, table: &TableRef) -> Result<Option<TableSchema>>;

    /// Foreign keys declared on `table` (the referencing side).
    async fn foreign_keys(&self, table: &TableRef) -> Result<Vec<ForeignKey>>;

    /// Exact row count for a table.
    async fn row_count(&self, table: &TableRef) -> Result<i64>;

    // --- target-side preparation ---

    /// Create a schema if it does not exist.
    async fn create_schema(&self, schema: &str) -> Result<()>;

    /// Create `target` from `schema`'s definition if it does not exist.
    async fn create_table(&self, schema: &TableSchema, target: &TableRef) -> Result<()>;

    /// Truncate a table.
    async fn truncate_table(&self, table: &TableRef) -> Result<()>;

    /// Enable or disable all triggers (including FK enforcement) on a table.
    async fn set_triggers_enabled(&self, table: &TableRef, enabled: bool) -> Result<()>;

    /// Reset every sequence owned by the table's columns to `max(column)+1`.
    async fn reset_sequences(&self, table: &TableRef) -> Result<()>;

    // --- row movement ---

    /// Fetch the next keyset page: rows with `key_column > after`, ordered by
    /// `key_column`, limited to `limit`. `after = None` starts from the top.
    async fn fetch_key_batch(
        &self,
        table: &TableRef,
        columns: &[String],
        key_column: &str,
        after: Option<&SqlValue>,
        limit: usize,
    ) -> Result<Vec<Vec<SqlValue>>>;

    /// Open a single-pass stream over all rows, for keyless tables.
    async fn open_row_stream(
        &self,
        table: &TableRef,
        columns: &[String],
    ) -> Result<Box<dyn RowStream>>;

    /// Write one batch as a single multi-row INSERT with
    /// `ON CONFLICT DO NOTHING` semantics. Returns the number of rows
    /// actually inserted (conflicting rows are skipped, never overwritten).
    async fn insert_batch(
        &self,
        table: &TableRef,
        columns: &[String],
        rows: &[Vec<SqlValue>],
    ) -> Result<u64>;
}
