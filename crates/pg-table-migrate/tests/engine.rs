//! End-to-end engine tests against an in-memory database mock.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pg_table_migrate::{
    CancelToken, Column, ConnectionHandle, DbClient, DiffStatus, Engine, ForeignKey,
    MigrateError, MigrationOptions, MigrationRequest, Result, RowStream, SqlValue, TableListing,
    TableMetadata, TableRef, TableSchema, TableStatus,
};
use pg_table_migrate::orchestrator::{MigrationProgress, Orchestrator};

#[derive(Clone)]
struct MockTable {
    schema: TableSchema,
    rows: Vec<Vec<SqlValue>>,
    foreign_keys: Vec<ForeignKey>,
}

/// In-memory stand-in for one database. Serves as source and target alike.
#[derive(Default)]
struct MockDb {
    tables: Mutex<HashMap<String, MockTable>>,
    schemas: Mutex<HashSet<String>>,
    failing_inserts: Mutex<HashSet<String>>,
    failing_connections: Mutex<HashSet<String>>,
    cancel_on_insert: Mutex<Option<(String, CancelToken)>>,
    sequence_resets: Mutex<Vec<String>>,
    sequence_next: Mutex<HashMap<String, i64>>,
}

impl MockDb {
    fn new() -> Self {
        Self::default()
    }

    fn add_table(&self, schema: TableSchema, rows: Vec<Vec<SqlValue>>, fks: Vec<ForeignKey>) {
        let key = schema.table.full_name();
        self.schemas.lock().unwrap().insert(schema.table.schema.clone());
        self.tables.lock().unwrap().insert(
            key,
            MockTable {
                schema,
                rows,
                foreign_keys: fks,
            },
        );
    }

    fn fail_inserts_for(&self, table: &TableRef) {
        self.failing_inserts.lock().unwrap().insert(table.full_name());
    }

    fn fail_connection_for(&self, table: &TableRef) {
        self.failing_connections
            .lock()
            .unwrap()
            .insert(table.full_name());
    }

    fn cancel_when_inserting(&self, table: &TableRef, token: CancelToken) {
        *self.cancel_on_insert.lock().unwrap() = Some((table.full_name(), token));
    }

    fn rows_in(&self, table: &TableRef) -> Vec<Vec<SqlValue>> {
        self.tables
            .lock()
            .unwrap()
            .get(&table.full_name())
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    fn sequence_resets(&self) -> Vec<String> {
        self.sequence_resets.lock().unwrap().clone()
    }

    fn next_sequence_value(&self, table: &TableRef) -> Option<i64> {
        self.sequence_next.lock().unwrap().get(&table.full_name()).copied()
    }
}

fn cmp_values(a: &SqlValue, b: &SqlValue) -> Ordering {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.to_sql_literal().cmp(&b.to_sql_literal()),
    }
}

struct MockStream {
    rows: VecDeque<Vec<SqlValue>>,
}

#[async_trait]
impl RowStream for MockStream {
    async fn next_batch(&mut self, limit: usize) -> Result<Vec<Vec<SqlValue>>> {
        let take = limit.min(self.rows.len());
        Ok(self.rows.drain(..take).collect())
    }
}

#[async_trait]
impl DbClient for MockDb {
    async fn list_tables(&self) -> Result<Vec<TableListing>> {
        let tables = self.tables.lock().unwrap();
        let mut listings: Vec<TableListing> = tables
            .values()
            .map(|t| TableListing {
                table: t.schema.table.clone(),
                metadata: TableMetadata {
                    row_count: t.rows.len() as i64,
                    size_bytes: 0,
                },
            })
            .collect();
        listings.sort_by_key(|l| l.table.full_name());
        Ok(listings)
    }

    async fn list_schemas(&self) -> Result<Vec<String>> {
        let mut schemas: Vec<String> = self.schemas.lock().unwrap().iter().cloned().collect();
        schemas.sort();
        Ok(schemas)
    }

    async fn table_exists(&self, table: &TableRef) -> Result<bool> {
        Ok(self.tables.lock().unwrap().contains_key(&table.full_name()))
    }

    async fn table_schema(&self, table: &TableRef) -> Result<Option<TableSchema>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(&table.full_name())
            .map(|t| t.schema.clone()))
    }

    async fn foreign_keys(&self, table: &TableRef) -> Result<Vec<ForeignKey>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(&table.full_name())
            .map(|t| t.foreign_keys.clone())
            .unwrap_or_default())
    }

    async fn row_count(&self, table: &TableRef) -> Result<i64> {
        Ok(self.rows_in(table).len() as i64)
    }

    async fn create_schema(&self, schema: &str) -> Result<()> {
        self.schemas.lock().unwrap().insert(schema.to_string());
        Ok(())
    }

    async fn create_table(&self, schema: &TableSchema, target: &TableRef) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        let key = target.full_name();
        if !tables.contains_key(&key) {
            let mut created = schema.clone();
            created.table = target.clone();
            tables.insert(
                key,
                MockTable {
                    schema: created,
                    rows: Vec::new(),
                    foreign_keys: Vec::new(),
                },
            );
        }
        Ok(())
    }

    async fn truncate_table(&self, table: &TableRef) -> Result<()> {
        if let Some(t) = self.tables.lock().unwrap().get_mut(&table.full_name()) {
            t.rows.clear();
        }
        Ok(())
    }

    async fn set_triggers_enabled(&self, _table: &TableRef, _enabled: bool) -> Result<()> {
        Ok(())
    }

    async fn reset_sequences(&self, table: &TableRef) -> Result<()> {
        let key = table.full_name();
        self.sequence_resets.lock().unwrap().push(key.clone());

        let mut tables = self.tables.lock().unwrap();
        let Some(t) = tables.get_mut(&key) else {
            return Ok(());
        };
        let Some(pk) = t.schema.primary_key.first().cloned() else {
            return Ok(());
        };
        let pk_idx = t
            .schema
            .columns
            .iter()
            .position(|c| c.name == pk)
            .unwrap_or(0);
        let max = t
            .rows
            .iter()
            .filter_map(|r| r[pk_idx].as_i64())
            .max()
            .unwrap_or(0);
        self.sequence_next.lock().unwrap().insert(key, max + 1);
        Ok(())
    }

    async fn fetch_key_batch(
        &self,
        table: &TableRef,
        _columns: &[String],
        key_column: &str,
        after: Option<&SqlValue>,
        limit: usize,
    ) -> Result<Vec<Vec<SqlValue>>> {
        if self
            .failing_connections
            .lock()
            .unwrap()
            .contains(&table.full_name())
        {
            return Err(MigrateError::Connection("connection reset".to_string()));
        }

        let tables = self.tables.lock().unwrap();
        let t = tables
            .get(&table.full_name())
            .ok_or_else(|| MigrateError::query("relation does not exist", table.full_name()))?;
        let key_idx = t
            .schema
            .columns
            .iter()
            .position(|c| c.name == key_column)
            .ok_or_else(|| MigrateError::query("no such column", key_column.to_string()))?;

        let mut rows: Vec<Vec<SqlValue>> = t
            .rows
            .iter()
            .filter(|r| match after {
                Some(cursor) => cmp_values(&r[key_idx], cursor) == Ordering::Greater,
                None => true,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| cmp_values(&a[key_idx], &b[key_idx]));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn open_row_stream(
        &self,
        table: &TableRef,
        _columns: &[String],
    ) -> Result<Box<dyn RowStream>> {
        Ok(Box::new(MockStream {
            rows: self.rows_in(table).into(),
        }))
    }

    async fn insert_batch(
        &self,
        table: &TableRef,
        _columns: &[String],
        rows: &[Vec<SqlValue>],
    ) -> Result<u64> {
        let key = table.full_name();

        if self.failing_inserts.lock().unwrap().contains(&key) {
            return Err(MigrateError::query("deadlock detected", key));
        }
        if let Some((target, token)) = self.cancel_on_insert.lock().unwrap().as_ref() {
            if *target == key {
                token.cancel();
            }
        }

        let mut tables = self.tables.lock().unwrap();
        let t = tables
            .get_mut(&key)
            .ok_or_else(|| MigrateError::query("relation does not exist", key))?;

        // ON CONFLICT DO NOTHING on the first primary key column.
        let pk_idx = t
            .schema
            .primary_key
            .first()
            .and_then(|pk| t.schema.columns.iter().position(|c| &c.name == pk));

        let mut inserted = 0u64;
        for row in rows {
            let conflict = pk_idx.is_some_and(|idx| {
                t.rows
                    .iter()
                    .any(|existing| cmp_values(&existing[idx], &row[idx]) == Ordering::Equal)
            });
            if !conflict {
                t.rows.push(row.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

fn int_pk_schema(table: TableRef) -> TableSchema {
    TableSchema {
        columns: vec![
            Column {
                name: "id".to_string(),
                data_type: "integer".to_string(),
                is_nullable: false,
                column_default: Some(format!("nextval('{}_id_seq'::regclass)", table.name)),
                ordinal_position: 1,
            },
            Column {
                name: "name".to_string(),
                data_type: "text".to_string(),
                is_nullable: true,
                column_default: None,
                ordinal_position: 2,
            },
        ],
        primary_key: vec!["id".to_string()],
        unique_columns: vec![],
        table,
    }
}

fn rows(n: usize) -> Vec<Vec<SqlValue>> {
    (1..=n)
        .map(|i| vec![SqlValue::I32(i as i32), SqlValue::Text(format!("row{}", i))])
        .collect()
}

fn t(name: &str) -> TableRef {
    TableRef::new("public", name)
}

fn fk(to: &TableRef) -> ForeignKey {
    ForeignKey {
        name: format!("fk_{}", to.name),
        references: to.clone(),
    }
}

async fn engine_with(
    source: Arc<MockDb>,
    target: Arc<MockDb>,
) -> (Engine, ConnectionHandle, ConnectionHandle) {
    let engine = Engine::new();
    let src = engine.manager().register(source).await.unwrap();
    let dst = engine.manager().register(target).await.unwrap();
    (engine, src, dst)
}

fn request(
    src: ConnectionHandle,
    dst: ConnectionHandle,
    tables: Vec<TableRef>,
) -> MigrationRequest {
    MigrationRequest {
        source: src,
        target: dst,
        tables,
        options: MigrationOptions {
            batch_size: 10,
            ..Default::default()
        },
        target_schema_override: None,
    }
}

#[tokio::test]
async fn dependency_sort_puts_referenced_tables_first() {
    let source = Arc::new(MockDb::new());
    source.add_table(int_pk_schema(t("users")), rows(1), vec![]);
    source.add_table(int_pk_schema(t("orders")), rows(1), vec![fk(&t("users"))]);
    source.add_table(int_pk_schema(t("items")), rows(1), vec![fk(&t("orders"))]);

    let (engine, src, _dst) = engine_with(source, Arc::new(MockDb::new())).await;
    let input = vec![t("items"), t("orders"), t("users")];
    let ordered = engine.sort_tables_by_dependency(&src, &input).await.unwrap();

    assert_eq!(ordered, vec![t("users"), t("orders"), t("items")]);
}

#[tokio::test]
async fn dependency_sort_survives_cycles() {
    let source = Arc::new(MockDb::new());
    source.add_table(int_pk_schema(t("a")), vec![], vec![fk(&t("b"))]);
    source.add_table(int_pk_schema(t("b")), vec![], vec![fk(&t("a"))]);

    let (engine, src, _dst) = engine_with(source, Arc::new(MockDb::new())).await;
    let input = vec![t("a"), t("b")];
    let ordered = engine.sort_tables_by_dependency(&src, &input).await.unwrap();

    // Cyclic components keep their input order instead of failing.
    assert_eq!(ordered, input);
}

#[tokio::test]
async fn keyset_transfer_moves_every_row() {
    // Counts straddling the batch size: empty, single, exact, one over.
    for n in [0usize, 1, 10, 11] {
        let source = Arc::new(MockDb::new());
        source.add_table(int_pk_schema(t("users")), rows(n), vec![]);
        let target = Arc::new(MockDb::new());

        let (engine, src, dst) = engine_with(source, target.clone()).await;
        let result = engine
            .start_migration(&request(src, dst, vec![t("users")]), None)
            .await
            .unwrap();

        assert!(result.success, "n={}: {:?}", n, result.errors);
        assert_eq!(result.total_rows, n as u64, "n={}", n);
        assert_eq!(target.rows_in(&t("users")).len(), n, "n={}", n);
    }
}

#[tokio::test]
async fn rerun_does_not_duplicate_rows() {
    let source = Arc::new(MockDb::new());
    source.add_table(int_pk_schema(t("users")), rows(25), vec![]);
    let target = Arc::new(MockDb::new());

    let (engine, src, dst) = engine_with(source, target.clone()).await;
    let req = request(src, dst, vec![t("users")]);

    let first = engine.start_migration(&req, None).await.unwrap();
    assert!(first.success);
    assert_eq!(target.rows_in(&t("users")).len(), 25);

    let second = engine.start_migration(&req, None).await.unwrap();
    assert!(second.success);
    assert_eq!(target.rows_in(&t("users")).len(), 25);
}

#[tokio::test]
async fn keyless_table_streams_all_rows() {
    let source = Arc::new(MockDb::new());
    let mut schema = int_pk_schema(t("log_lines"));
    schema.primary_key.clear();
    schema.columns[0].column_default = None;
    source.add_table(schema, rows(23), vec![]);
    let target = Arc::new(MockDb::new());

    let (engine, src, dst) = engine_with(source, target.clone()).await;
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let result = engine
        .start_migration(&request(src, dst, vec![t("log_lines")]), Some(tx))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(target.rows_in(&t("log_lines")).len(), 23);

    // The fallback is surfaced in the progress stream, not just in a log.
    let mut events: Vec<MigrationProgress> = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(events
        .iter()
        .any(|e| e.status == TableStatus::Migrating && e.degraded));
    assert!(events
        .iter()
        .any(|e| e.status == TableStatus::Completed && e.degraded));
}

#[tokio::test]
async fn nullable_unique_key_streams_instead_of_paging() {
    // A unique index over a nullable column admits NULL keys; paging by it
    // would stop at the last non-NULL value and drop the NULL-keyed rows.
    let source = Arc::new(MockDb::new());
    let schema = TableSchema {
        table: t("contacts"),
        columns: vec![
            Column {
                name: "email".to_string(),
                data_type: "text".to_string(),
                is_nullable: true,
                column_default: None,
                ordinal_position: 1,
            },
            Column {
                name: "name".to_string(),
                data_type: "text".to_string(),
                is_nullable: true,
                column_default: None,
                ordinal_position: 2,
            },
        ],
        primary_key: vec![],
        unique_columns: vec!["email".to_string()],
    };
    let data = vec![
        vec![SqlValue::Text("a@x".into()), SqlValue::Text("a".into())],
        vec![SqlValue::Text("b@x".into()), SqlValue::Text("b".into())],
        vec![
            SqlValue::Null(pg_table_migrate::SqlNullType::Text),
            SqlValue::Text("no-email".into()),
        ],
    ];
    source.add_table(schema, data, vec![]);
    let target = Arc::new(MockDb::new());

    let (engine, src, dst) = engine_with(source, target.clone()).await;
    let mut req = request(src, dst, vec![t("contacts")]);
    req.options.batch_size = 2;

    let result = engine.start_migration(&req, None).await.unwrap();

    assert!(result.success);
    assert_eq!(result.total_rows, 3);
    assert_eq!(target.rows_in(&t("contacts")).len(), 3);
}

#[tokio::test]
async fn failed_table_does_not_stop_the_run() {
    let source = Arc::new(MockDb::new());
    source.add_table(int_pk_schema(t("alpha")), rows(5), vec![]);
    source.add_table(int_pk_schema(t("beta")), rows(5), vec![]);
    source.add_table(int_pk_schema(t("gamma")), rows(5), vec![]);
    let target = Arc::new(MockDb::new());
    target.fail_inserts_for(&t("beta"));

    let (engine, src, dst) = engine_with(source, target.clone()).await;
    let result = engine
        .start_migration(&request(src, dst, vec![t("alpha"), t("beta"), t("gamma")]), None)
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.tables_migrated, 2);
    assert_eq!(result.total_rows, 10);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("public.beta"));
    assert_eq!(target.rows_in(&t("alpha")).len(), 5);
    assert_eq!(target.rows_in(&t("gamma")).len(), 5);
}

#[tokio::test]
async fn cancellation_stops_before_later_tables() {
    let source = Arc::new(MockDb::new());
    source.add_table(int_pk_schema(t("one")), rows(5), vec![]);
    // 25 rows at batch size 10: cancellation lands between batches.
    source.add_table(int_pk_schema(t("two")), rows(25), vec![]);
    source.add_table(int_pk_schema(t("three")), rows(5), vec![]);
    let target = Arc::new(MockDb::new());

    let cancel = CancelToken::new();
    target.cancel_when_inserting(&t("two"), cancel.clone());

    let orchestrator = Orchestrator::new(source, target.clone());
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let req = request(
        ConnectionHandle::new(),
        ConnectionHandle::new(),
        vec![t("one"), t("two"), t("three")],
    );

    let result = orchestrator.run(&req, &cancel, Some(tx)).await.unwrap();

    assert!(!result.success);
    assert_eq!(result.tables_migrated, 1);
    // The interrupted table's partial rows are not counted.
    assert_eq!(result.total_rows, 5);
    assert!(result.errors.iter().any(|e| e.contains("cancelled")));

    let mut events: Vec<MigrationProgress> = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(!events.iter().any(|e| e.table_name == "public.three"));
    assert!(events
        .iter()
        .any(|e| e.table_name == "public.two" && e.status == TableStatus::Cancelled));
    // Table three was never attempted, but completed work stays.
    assert_eq!(target.rows_in(&t("one")).len(), 5);
    assert!(target.rows_in(&t("three")).is_empty());
}

#[tokio::test]
async fn connection_failure_aborts_the_run() {
    let source = Arc::new(MockDb::new());
    source.add_table(int_pk_schema(t("alpha")), rows(5), vec![]);
    source.add_table(int_pk_schema(t("beta")), rows(5), vec![]);
    source.add_table(int_pk_schema(t("gamma")), rows(5), vec![]);
    source.fail_connection_for(&t("beta"));
    let target = Arc::new(MockDb::new());

    let (engine, src, dst) = engine_with(source, target.clone()).await;
    let err = engine
        .start_migration(&request(src, dst, vec![t("alpha"), t("beta"), t("gamma")]), None)
        .await
        .unwrap_err();

    // A dead connection ends the run; later tables are never attempted.
    assert!(matches!(err, MigrateError::Connection(_)));
    assert_eq!(target.rows_in(&t("alpha")).len(), 5);
    assert!(target.rows_in(&t("gamma")).is_empty());
}

#[tokio::test]
async fn stream_cancel_then_rerun_transfers_everything() {
    let source = Arc::new(MockDb::new());
    let mut schema = int_pk_schema(t("logs"));
    schema.primary_key.clear();
    schema.columns[0].column_default = None;
    source.add_table(schema, rows(25), vec![]);
    let target = Arc::new(MockDb::new());

    let cancel = CancelToken::new();
    target.cancel_when_inserting(&t("logs"), cancel.clone());

    let mut req = request(
        ConnectionHandle::new(),
        ConnectionHandle::new(),
        vec![t("logs")],
    );
    req.options.truncate_before_insert = true;

    let first = Orchestrator::new(source.clone(), target.clone())
        .run(&req, &cancel, None)
        .await
        .unwrap();
    assert!(!first.success);
    assert!(first.errors.iter().any(|e| e.contains("cancelled")));

    // The interrupted pass must not poison a later run on the same clients.
    let second = Orchestrator::new(source, target.clone())
        .run(&req, &CancelToken::new(), None)
        .await
        .unwrap();
    assert!(second.success);
    assert_eq!(second.total_rows, 25);
    assert_eq!(target.rows_in(&t("logs")).len(), 25);
}

#[tokio::test]
async fn sequences_reset_past_migrated_max() {
    let source = Arc::new(MockDb::new());
    source.add_table(int_pk_schema(t("users")), rows(42), vec![]);
    let target = Arc::new(MockDb::new());

    let (engine, src, dst) = engine_with(source, target.clone()).await;
    let result = engine
        .start_migration(&request(src, dst, vec![t("users")]), None)
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(target.sequence_resets(), vec!["public.users".to_string()]);
    assert_eq!(target.next_sequence_value(&t("users")), Some(43));
}

#[tokio::test]
async fn schema_override_relocates_target_tables() {
    let source = Arc::new(MockDb::new());
    source.add_table(int_pk_schema(t("users")), rows(3), vec![]);
    let target = Arc::new(MockDb::new());

    let (engine, src, dst) = engine_with(source, target.clone()).await;
    let mut req = request(src, dst, vec![t("users")]);
    req.target_schema_override = Some("staging".to_string());

    let result = engine.start_migration(&req, None).await.unwrap();

    assert!(result.success);
    assert!(target.rows_in(&t("users")).is_empty());
    assert_eq!(target.rows_in(&TableRef::new("staging", "users")).len(), 3);
    assert!(target.list_schemas().await.unwrap().contains(&"staging".to_string()));
}

#[tokio::test]
async fn truncate_clears_existing_target_rows() {
    let source = Arc::new(MockDb::new());
    source.add_table(int_pk_schema(t("users")), rows(4), vec![]);
    let target = Arc::new(MockDb::new());
    // Pre-existing rows with different ids would otherwise survive the run.
    target.add_table(
        int_pk_schema(t("users")),
        vec![vec![SqlValue::I32(99), SqlValue::Text("stale".into())]],
        vec![],
    );

    let (engine, src, dst) = engine_with(source, target.clone()).await;
    let mut req = request(src, dst, vec![t("users")]);
    req.options.truncate_before_insert = true;

    let result = engine.start_migration(&req, None).await.unwrap();

    assert!(result.success);
    assert_eq!(target.rows_in(&t("users")).len(), 4);
}

#[tokio::test]
async fn diff_classifies_tables_in_input_order() {
    let source = Arc::new(MockDb::new());
    source.add_table(int_pk_schema(t("same")), vec![], vec![]);
    source.add_table(int_pk_schema(t("missing")), vec![], vec![]);
    source.add_table(int_pk_schema(t("drifted")), vec![], vec![]);

    let target = Arc::new(MockDb::new());
    target.add_table(int_pk_schema(t("same")), vec![], vec![]);
    let mut drifted = int_pk_schema(t("drifted"));
    drifted.columns[1].data_type = "varchar".to_string();
    target.add_table(drifted, vec![], vec![]);

    let (engine, src, dst) = engine_with(source, target).await;
    let results = engine
        .analyze_schema(&src, &dst, &[t("same"), t("missing"), t("drifted")])
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].status, DiffStatus::Match);
    assert_eq!(results[1].status, DiffStatus::MissingInTarget);
    assert_eq!(results[2].status, DiffStatus::ColumnsMismatch);
    assert!(results[2].details.as_deref().unwrap().contains("name"));
}

#[tokio::test]
async fn unknown_handle_fails_before_touching_tables() {
    let engine = Engine::new();
    let req = request(ConnectionHandle::new(), ConnectionHandle::new(), vec![t("users")]);
    let err = engine.start_migration(&req, None).await.unwrap_err();
    assert!(matches!(err, MigrateError::Connection(_)));
}
