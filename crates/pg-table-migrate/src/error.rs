//! Error types for the migration engine.

use thiserror::Error;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Invalid options or request (non-positive batch size, duplicate tables, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection handle is unknown, closed, or unusable.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Connection pool error with context about where it occurred.
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// A query was rejected by the database.
    #[error("Query failed ({context}): {message}")]
    Query { context: String, message: String },

    /// Underlying PostgreSQL driver error.
    #[error("Database error: {0}")]
    Db(#[from] tokio_postgres::Error),

    /// Catalog/schema introspection failed.
    #[error("Schema extraction failed: {0}")]
    SchemaExtraction(String),

    /// Data transfer failed for a specific table.
    #[error("Transfer failed for table {table}: {message}")]
    Transfer { table: String, message: String },

    /// A migration run is already in flight on this orchestrator.
    #[error("A migration is already running")]
    AlreadyRunning,

    /// Migration was cancelled by the caller.
    #[error("Migration cancelled")]
    Cancelled,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Pool error with context about where it occurred.
    pub fn pool(message: impl ToString, context: impl Into<String>) -> Self {
        MigrateError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Query error with context about where it occurred.
    pub fn query(message: impl ToString, context: impl Into<String>) -> Self {
        MigrateError::Query {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Transfer error.
    pub fn transfer(table: impl Into<String>, message: impl ToString) -> Self {
        MigrateError::Transfer {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error terminates the whole run rather than a single
    /// table. No table-level work can be trusted after a connection or
    /// configuration failure.
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            MigrateError::Config(_)
                | MigrateError::Connection(_)
                | MigrateError::AlreadyRunning
                | MigrateError::Cancelled
        )
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
