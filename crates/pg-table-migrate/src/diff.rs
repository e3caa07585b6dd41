//! Schema diff analysis between source and target.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{TableRef, TableSchema};
use crate::client::DbClient;
use crate::error::Result;

/// Classification of one table's source/target schema comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffStatus {
    /// Column sets agree on name, type, and nullability.
    Match,
    /// The table does not exist on the target.
    MissingInTarget,
    /// Both sides exist but the column sets differ.
    ColumnsMismatch,
    /// Comparison itself failed for this table.
    Error,
}

/// Diff result for a single table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDiffResult {
    /// Source table identity.
    pub table: TableRef,

    /// Comparison outcome.
    pub status: DiffStatus,

    /// Human-readable detail for mismatches and errors.
    pub details: Option<String>,
}

/// What a column is compared by. Ordinal position deliberately excluded:
/// column order does not affect transfer correctness.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ColumnSignature {
    data_type: String,
    is_nullable: bool,
}

/// Compare each selected table's schema between source and target.
///
/// Returns one result per input table, in input order. A failure while
/// comparing one table is recorded as `DiffStatus::Error` for that table and
/// the analysis continues.
pub async fn analyze(
    source: &Arc<dyn DbClient>,
    target: &Arc<dyn DbClient>,
    tables: &[TableRef],
) -> Vec<SchemaDiffResult> {
    let mut results = Vec::with_capacity(tables.len());

    for table in tables {
        let result = match diff_table(source, target, table).await {
            Ok(result) => result,
            Err(e) => SchemaDiffResult {
                table: table.clone(),
                status: DiffStatus::Error,
                details: Some(e.to_string()),
            },
        };
        debug!("Diff {}: {:?}", table, result.status);
        results.push(result);
    }

    results
}

async fn diff_table(
    source: &Arc<dyn DbClient>,
    target: &Arc<dyn DbClient>,
    table: &TableRef,
) -> Result<SchemaDiffResult> {
    let source_schema = match source.table_schema(table).await? {
        Some(schema) => schema,
        None => {
            return Ok(SchemaDiffResult {
                table: table.clone(),
                status: DiffStatus::Error,
                details: Some("table not found on source".to_string()),
            });
        }
    };

    let target_schema = match target.table_schema(table).await? {
        Some(schema) => schema,
        None => {
            return Ok(SchemaDiffResult {
                table: table.clone(),
                status: DiffStatus::MissingInTarget,
                details: None,
            });
        }
    };

    Ok(compare_schemas(table, &source_schema, &target_schema))
}

/// Order-insensitive column-set comparison on (name, type, nullability).
fn compare_schemas(
    table: &TableRef,
    source: &TableSchema,
    target: &TableSchema,
) -> SchemaDiffResult {
    let source_cols = signature_map(source);
    let target_cols = signature_map(target);

    let mut problems = Vec::new();

    let mut source_names: Vec<&String> = source_cols.keys().collect();
    source_names.sort();
    for name in source_names {
        match target_cols.get(name) {
            None => problems.push(format!("column '{}' missing in target", name)),
            Some(target_sig) => {
                let source_sig = &source_cols[name];
                if source_sig.data_type != target_sig.data_type {
                    problems.push(format!(
                        "column '{}' type differs: source {} vs target {}",
                        name, source_sig.data_type, target_sig.data_type
                    ));
                } else if source_sig.is_nullable != target_sig.is_nullable {
                    problems.push(format!(
                        "column '{}' nullability differs: source {} vs target {}",
                        name,
                        nullability(source_sig.is_nullable),
                        nullability(target_sig.is_nullable)
                    ));
                }
            }
        }
    }

    let mut target_names: Vec<&String> = target_cols.keys().collect();
    target_names.sort();
    for name in target_names {
        if !source_cols.contains_key(name) {
            problems.push(format!("column '{}' missing in source", name));
        }
    }

    if problems.is_empty() {
        SchemaDiffResult {
            table: table.clone(),
            status: DiffStatus::Match,
            details: None,
        }
    } else {
        SchemaDiffResult {
            table: table.clone(),
            status: DiffStatus::ColumnsMismatch,
            details: Some(problems.join("; ")),
        }
    }
}

fn signature_map(schema: &TableSchema) -> HashMap<String, ColumnSignature> {
    schema
        .columns
        .iter()
        .map(|c| {
            (
                c.name.clone(),
                ColumnSignature {
                    data_type: c.data_type.clone(),
                    is_nullable: c.is_nullable,
                },
            )
        })
        .collect()
}

fn nullability(is_nullable: bool) -> &'static str {
    if is_nullable {
        "NULL"
    } else {
        "NOT NULL"
    }
}
