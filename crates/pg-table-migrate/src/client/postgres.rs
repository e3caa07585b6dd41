//! PostgreSQL implementation of the [`DbClient`] capability trait.
//!
//! One `PgClient` wraps a deadpool connection pool to a single database and
//! serves both sides of a migration: catalog introspection on the source,
//! DDL and batched inserts on the target.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use rustls::ClientConfig;
use tokio_postgres::types::Type;
use tokio_postgres::Config as PgConfig;
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{debug, info, warn};

use crate::catalog::{
    quote_ident, Column, ForeignKey, TableListing, TableMetadata, TableRef, TableSchema,
};
use crate::config::ConnectionConfig;
use crate::error::{MigrateError, Result};
use crate::value::{SqlNullType, SqlValue};

use super::{DbClient, RowStream};

/// PostgreSQL client backed by a deadpool connection pool.
pub struct PgClient {
    pool: Pool,
    /// Monotonic counter for unique cursor names on this client.
    cursor_seq: AtomicU64,
}

impl PgClient {
    /// Connect and verify the session with a probe query.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let mut pg_config = PgConfig::new();
        pg_config.host(&config.host);
        pg_config.port(config.effective_port());
        pg_config.dbname(&config.database);
        pg_config.user(&config.username);
        pg_config.password(&config.password);

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let pool = match config.ssl_mode.to_lowercase().as_str() {
            "disable" => {
                warn!("PostgreSQL TLS is disabled. Credentials will be transmitted in plaintext.");
                let mgr = Manager::from_config(pg_config, tokio_postgres::NoTls, mgr_config);
                Pool::builder(mgr)
                    .max_size(5)
                    .build()
                    .map_err(|e| MigrateError::pool(e, "creating PostgreSQL pool"))?
            }
            mode => {
                let tls_config = build_tls_config(mode)?;
                let tls_connector = MakeRustlsConnect::new(tls_config);
                let mgr = Manager::from_config(pg_config, tls_connector, mgr_config);
                Pool::builder(mgr)
                    .max_size(5)
                    .build()
                    .map_err(|e| MigrateError::pool(e, "creating PostgreSQL pool"))?
            }
        };

        let client = pool
            .get()
            .await
            .map_err(|e| MigrateError::Connection(format!("failed to connect: {}", e)))?;
        client.simple_query("SELECT 1").await?;

        info!(
            "Connected to PostgreSQL: {}:{}/{}",
            config.host,
            config.effective_port(),
            config.database
        );

        Ok(Self {
            pool,
            cursor_seq: AtomicU64::new(0),
        })
    }

    async fn conn(&self, context: &str) -> Result<Object> {
        self.pool
            .get()
            .await
            .map_err(|e| MigrateError::pool(e, context))
    }
}

/// Build a rustls config for the given ssl_mode.
fn build_tls_config(ssl_mode: &str) -> Result<ClientConfig> {
    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = match ssl_mode {
        "require" => {
            warn!(
                "ssl_mode=require: TLS enabled but server certificate is not verified. \
                 Consider 'verify-full' for production."
            );
            ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyCert))
                .with_no_client_auth()
        }
        "verify-ca" | "verify-full" => ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth(),
        other => {
            return Err(MigrateError::Config(format!(
                "Invalid ssl_mode '{}'. Valid options: disable, require, verify-ca, verify-full",
                other
            )));
        }
    };

    Ok(config)
}

#[async_trait]
impl DbClient for PgClient {
    async fn list_tables(&self) -> Result<Vec<TableListing>> {
        let client = self.conn("listing tables").await?;

        // reltuples/relation size come from planner statistics; COALESCE keeps
        // a table with missing stats at zero instead of failing the listing.
        let query = r#"
            SELECT
                t.table_schema,
                t.table_name,
                COALESCE(c.reltuples, 0)::int8 AS row_count,
                COALESCE(pg_total_relation_size(c.oid), 0) AS size_bytes
            FROM information_schema.tables t
            LEFT JOIN pg_catalog.pg_namespace n ON n.nspname = t.table_schema
            LEFT JOIN pg_catalog.pg_class c
                ON c.relname = t.table_name AND c.relnamespace = n.oid
            WHERE t.table_schema NOT IN ('pg_catalog', 'information_schema', 'pg_toast')
              AND t.table_type = 'BASE TABLE'
            ORDER BY t.table_schema, t.table_name
        "#;

        let rows = client
            .query(query, &[])
            .await
            .map_err(|e| MigrateError::query(e, "listing tables"))?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in rows {
            let row_count: i64 = row.get(2);
            tables.push(TableListing {
                table: TableRef::new(row.get::<_, String>(0), row.get::<_, String>(1)),
                metadata: TableMetadata {
                    // reltuples is -1 on never-analyzed tables
                    row_count: row_count.max(0),
                    size_bytes: row.get(3),
                },
            });
        }

        debug!("Listed {} tables", tables.len());
        Ok(tables)
    }

    async fn list_schemas(&self) -> Result<Vec<String>> {
        let client = self.conn("listing schemas").await?;

        let query = r#"
            SELECT schema_name
            FROM information_schema.schemata
            WHERE schema_name NOT IN ('pg_catalog', 'information_schema', 'pg_toast')
              AND schema_name NOT LIKE 'pg_temp_%'
              AND schema_name NOT LIKE 'pg_toast_temp_%'
            ORDER BY schema_name
        "#;

        let rows = client
            .query(query, &[])
            .await
            .map_err(|e| MigrateError::query(e, "listing schemas"))?;

        Ok(rows.iter().map(|r| r.get(0)).collect())
    }

    async fn table_exists(&self, table: &TableRef) -> Result<bool> {
        let client = self.conn("checking table existence").await?;

        let query = r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = $1 AND table_name = $2
            )
        "#;

        let row = client.query_one(query, &[&table.schema, &table.name]).await?;
        Ok(row.get(0))
    }

    async fn table_schema(&self, table: &TableRef) -> Result<Option<TableSchema>> {
        let client = self.conn("loading table schema").await?;

        let columns_query = r#"
            SELECT
                c.column_name,
                c.data_type,
                c.is_nullable = 'YES' AS is_nullable,
                c.column_default,
                c.ordinal_position::int4
            FROM information_schema.columns c
            WHERE c.table_schema = $1 AND c.table_name = $2
            ORDER BY c.ordinal_position
        "#;

        let rows = client
            .query(columns_query, &[&table.schema, &table.name])
            .await
            .map_err(|e| MigrateError::SchemaExtraction(format!("{}: {}", table, e)))?;

        if rows.is_empty() {
            return Ok(None);
        }

        let columns: Vec<Column> = rows
            .iter()
            .map(|row| Column {
                name: row.get(0),
                data_type: row.get(1),
                is_nullable: row.get(2),
                column_default: row.get(3),
                ordinal_position: row.get(4),
            })
            .collect();

        let pk_query = r#"
            SELECT a.attname
            FROM pg_catalog.pg_constraint con
            JOIN pg_catalog.pg_class t ON t.oid = con.conrelid
            JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
            JOIN pg_catalog.pg_attribute a ON a.attrelid = t.oid
            WHERE n.nspname = $1
              AND t.relname = $2
              AND con.contype = 'p'
              AND a.attnum = ANY(con.conkey)
            ORDER BY array_position(con.conkey, a.attnum)
        "#;

        let pk_rows = client
            .query(pk_query, &[&table.schema, &table.name])
            .await
            .map_err(|e| MigrateError::SchemaExtraction(format!("{}: {}", table, e)))?;
        let primary_key: Vec<String> = pk_rows.iter().map(|r| r.get(0)).collect();

        // Single-column unique indexes provide the keyset fallback when the
        // primary key is composite or absent. Nullable columns are excluded:
        // a unique index admits many NULLs, and `key > cursor` never matches
        // a NULL key.
        let unique_query = r#"
            SELECT a.attname
            FROM pg_catalog.pg_index ix
            JOIN pg_catalog.pg_class t ON t.oid = ix.indrelid
            JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
            JOIN pg_catalog.pg_attribute a
                ON a.attrelid = t.oid AND a.attnum = ix.indkey[0]
            WHERE n.nspname = $1
              AND t.relname = $2
              AND ix.indisunique
              AND NOT ix.indisprimary
              AND ix.indnkeyatts = 1
              AND a.attnotnull
            ORDER BY a.attname
        "#;

        let unique_rows = client
            .query(unique_query, &[&table.schema, &table.name])
            .await
            .map_err(|e| MigrateError::SchemaExtraction(format!("{}: {}", table, e)))?;
        let unique_columns: Vec<String> = unique_rows.iter().map(|r| r.get(0)).collect();

        debug!(
            "Loaded schema for {}: {} columns, pk {:?}",
            table,
            columns.len(),
            primary_key
        );

        Ok(Some(TableSchema {
            table: table.clone(),
            columns,
            primary_key,
            unique_columns,
        }))
    }

    async fn foreign_keys(&self, table: &TableRef) -> Result<Vec<ForeignKey>> {
        let client = self.conn("loading foreign keys").await?;

        let query = r#"
            SELECT
                c.conname,
                rn.nspname AS ref_schema,
                rt.relname AS ref_table
            FROM pg_catalog.pg_constraint c
            JOIN pg_catalog.pg_class t ON t.oid = c.conrelid
            JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
            JOIN pg_catalog.pg_class rt ON rt.oid = c.confrelid
            JOIN pg_catalog.pg_namespace rn ON rn.oid = rt.relnamespace
            WHERE n.nspname = $1
              AND t.relname = $2
              AND c.contype = 'f'
            ORDER BY c.conname
        "#;

        let rows = client
            .query(query, &[&table.schema, &table.name])
            .await
            .map_err(|e| MigrateError::query(e, "loading foreign keys"))?;

        Ok(rows
            .iter()
            .map(|row| ForeignKey {
                name: row.get(0),
                references: TableRef::new(row.get::<_, String>(1), row.get::<_, String>(2)),
            })
            .collect())
    }

    async fn row_count(&self, table: &TableRef) -> Result<i64> {
        let client = self.conn("counting rows").await?;

        let query = format!("SELECT COUNT(*)::int8 FROM {}", table.qualified());
        let row = client
            .query_one(&query, &[])
            .await
            .map_err(|e| MigrateError::query(e, format!("counting rows of {}", table)))?;
        Ok(row.get(0))
    }

    async fn create_schema(&self, schema: &str) -> Result<()> {
        let client = self.conn("creating schema").await?;
        let sql = format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema));
        client
            .execute(&sql, &[])
            .await
            .map_err(|e| MigrateError::query(e, format!("creating schema {}", schema)))?;
        Ok(())
    }

    async fn create_table(&self, schema: &TableSchema, target: &TableRef) -> Result<()> {
        let client = self.conn("creating table").await?;
        let sql = schema.create_statement(target);
        debug!("Creating table: {}", target);
        client
            .execute(&sql, &[])
            .await
            .map_err(|e| MigrateError::query(e, format!("creating table {}", target)))?;
        Ok(())
    }

    async fn truncate_table(&self, table: &TableRef) -> Result<()> {
        let client = self.conn("truncating table").await?;
        let sql = format!("TRUNCATE TABLE {} CASCADE", table.qualified());
        debug!("Truncating table: {}", table);
        client
            .execute(&sql, &[])
            .await
            .map_err(|e| MigrateError::query(e, format!("truncating {}", table)))?;
        Ok(())
    }

    async fn set_triggers_enabled(&self, table: &TableRef, enabled: bool) -> Result<()> {
        let client = self.conn("toggling triggers").await?;
        let verb = if enabled { "ENABLE" } else { "DISABLE" };
        let sql = format!("ALTER TABLE {} {} TRIGGER ALL", table.qualified(), verb);
        client
            .execute(&sql, &[])
            .await
            .map_err(|e| MigrateError::query(e, format!("{} triggers on {}", verb, table)))?;
        Ok(())
    }

    async fn reset_sequences(&self, table: &TableRef) -> Result<()> {
        let client = self.conn("resetting sequences").await?;

        // Walks pg_depend for sequences owned by this table's columns and
        // sets each to max(column)+1 with is_called = false, so the next
        // nextval on the target cannot collide with migrated values.
        // DO bodies are opaque string literals, so the table identity is
        // inlined as escaped literals rather than bound parameters.
        let query = format!(
            r#"
            DO $$
            DECLARE
                r RECORD;
            BEGIN
                FOR r IN (
                    SELECT
                        quote_ident(sn.nspname) || '.' || quote_ident(s.relname) AS seq_fqn,
                        quote_ident(a.attname) AS col_name,
                        quote_ident(n.nspname) || '.' || quote_ident(t.relname) AS table_fqn
                    FROM pg_class s
                    JOIN pg_namespace sn ON sn.oid = s.relnamespace
                    JOIN pg_depend d ON d.objid = s.oid AND d.deptype = 'a'
                    JOIN pg_class t ON t.oid = d.refobjid
                    JOIN pg_namespace n ON n.oid = t.relnamespace
                    JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = d.refobjsubid
                    WHERE s.relkind = 'S'
                      AND n.nspname = {schema}
                      AND t.relname = {name}
                ) LOOP
                    EXECUTE format(
                        'SELECT setval(%L, COALESCE((SELECT MAX(%s) FROM %s), 0) + 1, false)',
                        r.seq_fqn, r.col_name, r.table_fqn
                    );
                END LOOP;
            END $$;
            "#,
            schema = quote_literal(&table.schema),
            name = quote_literal(&table.name),
        );

        client
            .execute(&query, &[])
            .await
            .map_err(|e| MigrateError::query(e, format!("resetting sequences for {}", table)))?;
        debug!("Reset sequences for {}", table);
        Ok(())
    }

    async fn fetch_key_batch(
        &self,
        table: &TableRef,
        columns: &[String],
        key_column: &str,
        after: Option<&SqlValue>,
        limit: usize,
    ) -> Result<Vec<Vec<SqlValue>>> {
        let client = self.conn("fetching batch").await?;

        let query = build_keyset_query(table, columns, key_column, after, limit);
        let rows = client
            .query(&query, &[])
            .await
            .map_err(|e| MigrateError::query(e, format!("fetching batch from {}", table)))?;

        rows.iter().map(convert_row).collect()
    }

    async fn open_row_stream(
        &self,
        table: &TableRef,
        columns: &[String],
    ) -> Result<Box<dyn RowStream>> {
        let client = self.conn("opening row stream").await?;

        let cursor = format!(
            "migrate_cur_{}",
            self.cursor_seq.fetch_add(1, Ordering::Relaxed)
        );
        let col_list = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");

        // The cursor lives inside a transaction pinned to this pooled
        // connection; dropping the stream rolls both back.
        client.batch_execute("BEGIN").await?;
        let declare = format!(
            "DECLARE {} NO SCROLL CURSOR FOR SELECT {} FROM {}",
            cursor,
            col_list,
            table.qualified()
        );
        client
            .batch_execute(&declare)
            .await
            .map_err(|e| MigrateError::query(e, format!("declaring cursor on {}", table)))?;

        Ok(Box::new(PgRowStream {
            client: Some(client),
            cursor,
            done: false,
        }))
    }

    async fn insert_batch(
        &self,
        table: &TableRef,
        columns: &[String],
        rows: &[Vec<SqlValue>],
    ) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let client = self.conn("inserting batch").await?;
        let sql = build_insert_statement(table, columns, rows);
        let inserted = client
            .execute(&sql, &[])
            .await
            .map_err(|e| MigrateError::query(e, format!("inserting into {}", table)))?;
        Ok(inserted)
    }
}

/// Server-side cursor stream over one table.
///
/// The pooled connection holds an open transaction until the pass finishes,
/// fails, or the stream is dropped.
struct PgRowStream {
    client: Option<Object>,
    cursor: String,
    done: bool,
}

impl PgRowStream {
    /// Roll the cursor transaction back and leave the connection clean for
    /// recycling.
    async fn abort(&mut self) {
        self.done = true;
        if let Some(client) = self.client.as_ref() {
            client.batch_execute("ROLLBACK").await.ok();
        }
    }
}

#[async_trait]
impl RowStream for PgRowStream {
    async fn next_batch(&mut self, limit: usize) -> Result<Vec<Vec<SqlValue>>> {
        if self.done {
            return Ok(Vec::new());
        }
        let Some(client) = self.client.as_ref() else {
            return Ok(Vec::new());
        };

        let fetch_sql = format!("FETCH {} FROM {}", limit, self.cursor);
        let rows = match client.query(&fetch_sql, &[]).await {
            Ok(rows) => rows,
            Err(e) => {
                self.abort().await;
                return Err(MigrateError::query(e, "fetching from cursor"));
            }
        };

        let batch: Result<Vec<Vec<SqlValue>>> = rows.iter().map(convert_row).collect();
        let batch = match batch {
            Ok(batch) => batch,
            Err(e) => {
                self.abort().await;
                return Err(e);
            }
        };

        if rows.len() < limit {
            self.done = true;
            if let Some(client) = self.client.as_ref() {
                let close = format!("CLOSE {}", self.cursor);
                client.batch_execute(&close).await.ok();
                client.batch_execute("COMMIT").await.ok();
            }
        }

        Ok(batch)
    }
}

impl Drop for PgRowStream {
    fn drop(&mut self) {
        // A stream dropped mid-pass (error, cancellation) still holds an open
        // transaction. Detach the connection from the pool so no later
        // checkout inherits that transaction; the server aborts it when the
        // connection closes.
        if !self.done {
            if let Some(client) = self.client.take() {
                drop(Object::take(client));
            }
        }
    }
}

/// Build the keyset pagination query for one batch.
///
/// `key > after ORDER BY key LIMIT n` keeps each page's cost proportional to
/// the batch size regardless of how many rows were already transferred,
/// unlike OFFSET paging which rescans everything it skips.
fn build_keyset_query(
    table: &TableRef,
    columns: &[String],
    key_column: &str,
    after: Option<&SqlValue>,
    limit: usize,
) -> String {
    let col_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let key = quote_ident(key_column);

    let mut query = format!("SELECT {} FROM {}", col_list, table.qualified());
    if let Some(cursor) = after {
        query.push_str(&format!(" WHERE {} > {}", key, cursor.to_sql_literal()));
    }
    query.push_str(&format!(" ORDER BY {} LIMIT {}", key, limit));
    query
}

/// Build a single multi-row INSERT with ON CONFLICT DO NOTHING.
fn build_insert_statement(table: &TableRef, columns: &[String], rows: &[Vec<SqlValue>]) -> String {
    let col_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");

    let values: Vec<String> = rows
        .iter()
        .map(|row| {
            let rendered: Vec<String> = row.iter().map(SqlValue::to_sql_literal).collect();
            format!("({})", rendered.join(", "))
        })
        .collect();

    format!(
        "INSERT INTO {} ({}) VALUES {} ON CONFLICT DO NOTHING",
        table.qualified(),
        col_list,
        values.join(", ")
    )
}

/// Convert one driver row into pipeline values, keyed off the wire type.
fn convert_row(row: &tokio_postgres::Row) -> Result<Vec<SqlValue>> {
    (0..row.columns().len())
        .map(|idx| convert_value(row, idx))
        .collect()
}

fn convert_value(row: &tokio_postgres::Row, idx: usize) -> Result<SqlValue> {
    let ty = row.columns()[idx].type_();

    if *ty == Type::BOOL {
        fetch(row, idx, SqlValue::Bool, SqlNullType::Bool)
    } else if *ty == Type::INT2 {
        fetch(row, idx, SqlValue::I16, SqlNullType::I16)
    } else if *ty == Type::INT4 {
        fetch(row, idx, SqlValue::I32, SqlNullType::I32)
    } else if *ty == Type::INT8 {
        fetch(row, idx, SqlValue::I64, SqlNullType::I64)
    } else if *ty == Type::FLOAT4 {
        fetch(row, idx, SqlValue::F32, SqlNullType::F32)
    } else if *ty == Type::FLOAT8 {
        fetch(row, idx, SqlValue::F64, SqlNullType::F64)
    } else if *ty == Type::UUID {
        fetch(row, idx, SqlValue::Uuid, SqlNullType::Uuid)
    } else if *ty == Type::NUMERIC {
        fetch(row, idx, SqlValue::Decimal, SqlNullType::Decimal)
    } else if *ty == Type::TIMESTAMP {
        fetch(row, idx, SqlValue::DateTime, SqlNullType::DateTime)
    } else if *ty == Type::TIMESTAMPTZ {
        fetch(row, idx, SqlValue::DateTimeOffset, SqlNullType::DateTimeOffset)
    } else if *ty == Type::DATE {
        fetch(row, idx, SqlValue::Date, SqlNullType::Date)
    } else if *ty == Type::TIME {
        fetch(row, idx, SqlValue::Time, SqlNullType::Time)
    } else if *ty == Type::BYTEA {
        fetch(row, idx, SqlValue::Bytes, SqlNullType::Bytes)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        fetch(row, idx, SqlValue::Json, SqlNullType::Json)
    } else {
        // Everything else (text, varchar, char, name, enums, ...) moves as
        // its text representation.
        fetch(row, idx, SqlValue::Text, SqlNullType::Text)
    }
}

/// Pull one nullable column. SQL NULL maps to a typed NULL; a decode failure
/// is an error, never a NULL, so bad data cannot silently reach the target.
fn fetch<'a, T>(
    row: &'a tokio_postgres::Row,
    idx: usize,
    wrap: fn(T) -> SqlValue,
    null: SqlNullType,
) -> Result<SqlValue>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    match row.try_get::<_, Option<T>>(idx) {
        Ok(Some(v)) => Ok(wrap(v)),
        Ok(None) => Ok(SqlValue::Null(null)),
        Err(e) => Err(MigrateError::query(
            e,
            format!("decoding column '{}'", row.columns()[idx].name()),
        )),
    }
}

/// Quote a string literal for inline SQL, doubling embedded single quotes.
fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Certificate verifier for ssl_mode=require: TLS on the wire, no
/// certificate validation. Use verify-full against untrusted networks.
#[derive(Debug)]
struct AcceptAnyCert;

impl rustls::client::danger::ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        vec![
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::RSA_PKCS1_SHA384,
            rustls::SignatureScheme::RSA_PKCS1_SHA512,
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP384_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA256,
            rustls::SignatureScheme::RSA_PSS_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA512,
            rustls::SignatureScheme::ED25519,
        ]
    }
}
