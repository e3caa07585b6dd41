//! Connection and migration request configuration.

use serde::{Deserialize, Serialize};

use crate::catalog::TableRef;
use crate::error::{MigrateError, Result};

/// Upper bound on `batch_size` to keep per-batch memory bounded.
pub const MAX_BATCH_SIZE: usize = 100_000;

/// Connection parameters for one PostgreSQL instance.
///
/// Held only for the duration of `connect`; the engine keeps the resulting
/// handle, never the credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database host.
    pub host: String,

    /// Database port. Zero or absent means the PostgreSQL default (5432).
    #[serde(default)]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub username: String,

    /// Password.
    pub password: String,

    /// SSL mode: disable, require (default), verify-ca, verify-full.
    #[serde(default = "default_ssl_mode")]
    pub ssl_mode: String,
}

impl ConnectionConfig {
    /// Effective port, with the PostgreSQL default applied.
    pub fn effective_port(&self) -> u16 {
        if self.port == 0 {
            5432
        } else {
            self.port
        }
    }
}

// Manual Debug so passwords never leak into logs.
impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

fn default_ssl_mode() -> String {
    "require".to_string()
}

/// Per-run migration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationOptions {
    /// Create missing target tables from the source definition.
    pub create_table_if_not_exists: bool,

    /// Truncate each existing target table before inserting.
    pub truncate_before_insert: bool,

    /// Disable triggers/constraints on the target table for the duration of
    /// its transfer.
    pub disable_constraints: bool,

    /// Rows per fetch/insert batch.
    pub batch_size: usize,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            create_table_if_not_exists: true,
            truncate_before_insert: false,
            disable_constraints: true,
            batch_size: 1000,
        }
    }
}

impl MigrationOptions {
    /// Validate option values. Rejected before any table is touched.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(MigrateError::Config(
                "batch_size must be at least 1".into(),
            ));
        }
        if self.batch_size > MAX_BATCH_SIZE {
            return Err(MigrateError::Config(format!(
                "batch_size must not exceed {}, got {}",
                MAX_BATCH_SIZE, self.batch_size
            )));
        }
        Ok(())
    }
}

/// A request to migrate a set of tables between two connections.
///
/// Tables are migrated in exactly the order supplied here. Dependency sorting
/// is a separate, explicit step (`sort_tables_by_dependency`) so the caller
/// can inspect the reordering before committing to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationRequest {
    /// Source connection handle.
    pub source: crate::client::ConnectionHandle,

    /// Target connection handle.
    pub target: crate::client::ConnectionHandle,

    /// Tables to migrate, in migration order.
    pub tables: Vec<TableRef>,

    /// Transfer options.
    #[serde(default)]
    pub options: MigrationOptions,

    /// Optional schema applied to every migrated table's target location.
    #[serde(default)]
    pub target_schema_override: Option<String>,
}

impl MigrationRequest {
    /// Validate the request: options in range, selection non-empty and free
    /// of duplicate table identities.
    pub fn validate(&self) -> Result<()> {
        self.options.validate()?;

        if self.tables.is_empty() {
            return Err(MigrateError::Config("no tables selected".into()));
        }

        let mut seen = std::collections::HashSet::new();
        for table in &self.tables {
            if !seen.insert(table.full_name()) {
                return Err(MigrateError::Config(format!(
                    "duplicate table in selection: {}",
                    table.full_name()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ConnectionHandle;

    fn request(tables: Vec<TableRef>) -> MigrationRequest {
        MigrationRequest {
            source: ConnectionHandle::new(),
            target: ConnectionHandle::new(),
            tables,
            options: MigrationOptions::default(),
            target_schema_override: None,
        }
    }

    #[test]
    fn test_default_options_are_valid() {
        assert!(MigrationOptions::default().validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let opts = MigrationOptions {
            batch_size: 0,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_oversized_batch_rejected() {
        let opts = MigrationOptions {
            batch_size: MAX_BATCH_SIZE + 1,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_duplicate_tables_rejected() {
        let t = TableRef::new("public", "users");
        let req = request(vec![t.clone(), t]);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_empty_selection_rejected() {
        assert!(request(vec![]).validate().is_err());
    }

    #[test]
    fn test_port_default() {
        let config = ConnectionConfig {
            host: "localhost".into(),
            port: 0,
            database: "db".into(),
            username: "u".into(),
            password: "p".into(),
            ssl_mode: "disable".into(),
        };
        assert_eq!(config.effective_port(), 5432);
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = ConnectionConfig {
            host: "localhost".into(),
            port: 5432,
            database: "db".into(),
            username: "u".into(),
            password: "super_secret_password_123".into(),
            ssl_mode: "require".into(),
        };
        let debug_output = format!("{:?}", config);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_password_123"));
    }
}
