//! PostgreSQL to PostgreSQL table migration engine.
//!
//! Moves selected tables between two PostgreSQL databases: foreign key
//! dependency ordering, schema diff analysis, optional target DDL, and
//! batched keyset-paginated row transfer with progress reporting and
//! cooperative cancellation.
//!
//! # Example
//!
//! ```no_run
//! use pg_table_migrate::{
//!     ConnectionConfig, Engine, MigrationOptions, MigrationRequest, TableRef,
//! };
//!
//! # async fn example() -> pg_table_migrate::Result<()> {
//! let engine = Engine::new();
//!
//! let source = engine
//!     .connect(&ConnectionConfig {
//!         host: "src.example.com".into(),
//!         port: 5432,
//!         database: "app".into(),
//!         username: "migrator".into(),
//!         password: std::env::var("SOURCE_PASSWORD").unwrap_or_default(),
//!         ssl_mode: "verify-full".into(),
//!     })
//!     .await?;
//! let target = engine
//!     .connect(&ConnectionConfig {
//!         host: "dst.example.com".into(),
//!         port: 5432,
//!         database: "app".into(),
//!         username: "migrator".into(),
//!         password: std::env::var("TARGET_PASSWORD").unwrap_or_default(),
//!         ssl_mode: "verify-full".into(),
//!     })
//!     .await?;
//!
//! let tables = vec![
//!     TableRef::new("public", "orders"),
//!     TableRef::new("public", "users"),
//! ];
//! let ordered = engine.sort_tables_by_dependency(&source, &tables).await?;
//!
//! let result = engine
//!     .start_migration(
//!         &MigrationRequest {
//!             source,
//!             target,
//!             tables: ordered,
//!             options: MigrationOptions::default(),
//!             target_schema_override: None,
//!         },
//!         None,
//!     )
//!     .await?;
//! println!("{}", result.to_json()?);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod config;
pub mod deps;
pub mod diff;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod transfer;
pub mod value;

pub use catalog::{Column, ForeignKey, TableListing, TableMetadata, TableRef, TableSchema};
pub use client::{ConnectionHandle, ConnectionManager, DbClient, PgClient, RowStream};
pub use config::{ConnectionConfig, MigrationOptions, MigrationRequest, MAX_BATCH_SIZE};
pub use diff::{DiffStatus, SchemaDiffResult};
pub use engine::Engine;
pub use error::{MigrateError, Result};
pub use orchestrator::{MigrationProgress, MigrationResult, TableStatus};
pub use transfer::{CancelToken, TableTransfer, TransferStats};
pub use value::{SqlNullType, SqlValue};
