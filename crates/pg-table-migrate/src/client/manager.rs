//! Connection registry mapping opaque handles to live clients.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::config::ConnectionConfig;
use crate::error::{MigrateError, Result};

use super::{ConnectionHandle, DbClient, PgClient};

/// Registry of open connections, keyed by handle.
///
/// Credentials are consumed by `connect` and never stored; callers hold only
/// the returned handle afterwards.
#[derive(Default)]
pub struct ConnectionManager {
    clients: RwLock<HashMap<ConnectionHandle, Arc<dyn DbClient>>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a connection and register it under a fresh handle.
    pub async fn connect(&self, config: &ConnectionConfig) -> Result<ConnectionHandle> {
        let client = PgClient::connect(config).await?;
        self.register(Arc::new(client)).await
    }

    /// Register an already-built client. Tests use this to install mock
    /// clients behind ordinary handles.
    pub async fn register(&self, client: Arc<dyn DbClient>) -> Result<ConnectionHandle> {
        let handle = ConnectionHandle::new();
        self.clients.write().await.insert(handle.clone(), client);
        Ok(handle)
    }

    /// Close a connection. Unknown handles are fine: disconnect is
    /// idempotent.
    pub async fn disconnect(&self, handle: &ConnectionHandle) {
        if self.clients.write().await.remove(handle).is_some() {
            info!("Disconnected {}", handle);
        }
    }

    /// Resolve a handle to its client.
    pub async fn client(&self, handle: &ConnectionHandle) -> Result<Arc<dyn DbClient>> {
        self.clients
            .read()
            .await
            .get(handle)
            .cloned()
            .ok_or_else(|| MigrateError::Connection(format!("unknown connection: {}", handle)))
    }
}
