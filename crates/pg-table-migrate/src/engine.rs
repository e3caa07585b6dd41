//! Engine facade: the operations exposed to front ends.
//!
//! Owns the connection registry and the active run's cancellation token.
//! Callers interact through connection handles and plain request/result
//! types; pools and credentials never cross this boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc::UnboundedSender;

use crate::catalog::{TableListing, TableRef};
use crate::client::{ConnectionHandle, ConnectionManager};
use crate::config::{ConnectionConfig, MigrationRequest};
use crate::deps;
use crate::diff::{self, SchemaDiffResult};
use crate::error::{MigrateError, Result};
use crate::orchestrator::{MigrationProgress, MigrationResult, Orchestrator};
use crate::transfer::CancelToken;

/// Migration engine. One instance serves many connections but at most one
/// migration run at a time.
#[derive(Default)]
pub struct Engine {
    manager: ConnectionManager,
    running: AtomicBool,
    active_cancel: Mutex<Option<CancelToken>>,
}

struct RunGuard<'a>(&'a Engine);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.0.active_cancel.lock() {
            *slot = None;
        }
        self.0.running.store(false, Ordering::SeqCst);
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The connection registry. Tests register mock clients here.
    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Open a connection and return its handle.
    pub async fn connect(&self, config: &ConnectionConfig) -> Result<ConnectionHandle> {
        self.manager.connect(config).await
    }

    /// Close a connection. Idempotent.
    pub async fn disconnect(&self, handle: &ConnectionHandle) {
        self.manager.disconnect(handle).await;
    }

    /// List user tables on a connection, with advisory row counts and sizes.
    pub async fn list_tables(&self, handle: &ConnectionHandle) -> Result<Vec<TableListing>> {
        self.manager.client(handle).await?.list_tables().await
    }

    /// List user-visible schemas on a connection.
    pub async fn list_schemas(&self, handle: &ConnectionHandle) -> Result<Vec<String>> {
        self.manager.client(handle).await?.list_schemas().await
    }

    /// Compare the selected tables' schemas between two connections.
    pub async fn analyze_schema(
        &self,
        source: &ConnectionHandle,
        target: &ConnectionHandle,
        tables: &[TableRef],
    ) -> Result<Vec<SchemaDiffResult>> {
        let source = self.manager.client(source).await?;
        let target = self.manager.client(target).await?;
        Ok(diff::analyze(&source, &target, tables).await)
    }

    /// Reorder a table selection so foreign key targets come first.
    pub async fn sort_tables_by_dependency(
        &self,
        handle: &ConnectionHandle,
        tables: &[TableRef],
    ) -> Result<Vec<TableRef>> {
        let client = self.manager.client(handle).await?;
        deps::topological_order(&client, tables).await
    }

    /// Run a migration to completion, streaming progress snapshots to
    /// `progress` if supplied. Tables are migrated in request order.
    pub async fn start_migration(
        &self,
        request: &MigrationRequest,
        progress: Option<UnboundedSender<MigrationProgress>>,
    ) -> Result<MigrationResult> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(MigrateError::AlreadyRunning);
        }
        let _guard = RunGuard(self);

        let cancel = CancelToken::new();
        if let Ok(mut slot) = self.active_cancel.lock() {
            *slot = Some(cancel.clone());
        }

        let source = self.manager.client(&request.source).await?;
        let target = self.manager.client(&request.target).await?;

        let orchestrator = Orchestrator::new(source, target);
        orchestrator.run(request, &cancel, progress).await
    }

    /// Request cancellation of the active run. The run winds down at the
    /// next batch or table boundary.
    pub fn cancel_migration(&self) -> Result<()> {
        let slot = self
            .active_cancel
            .lock()
            .map_err(|_| MigrateError::Config("cancellation state poisoned".into()))?;
        match slot.as_ref() {
            Some(token) => {
                token.cancel();
                Ok(())
            }
            None => Err(MigrateError::Config("no migration in progress".into())),
        }
    }
}
