//! Catalog types: table identity, metadata, and schema definitions.

use serde::{Deserialize, Serialize};

/// Identity of a table: `schema.name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableRef {
    /// Schema name.
    pub schema: String,

    /// Table name.
    pub name: String,
}

impl TableRef {
    /// Create a table reference.
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// The identity key, `schema.name`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Quoted, schema-qualified name for use in SQL.
    pub fn qualified(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.name))
    }

    /// The same table relocated into another schema.
    pub fn in_schema(&self, schema: &str) -> TableRef {
        TableRef::new(schema, self.name.clone())
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Advisory per-table statistics, used for progress denominators and sizing.
///
/// Derived from database statistics, so counts may be approximate.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Approximate row count (0 when statistics are unavailable).
    pub row_count: i64,

    /// Total on-disk size in bytes (0 when unavailable).
    pub size_bytes: i64,
}

/// A table listing entry: identity plus advisory metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableListing {
    /// Table identity.
    pub table: TableRef,

    /// Advisory statistics.
    pub metadata: TableMetadata,
}

/// Column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Declared data type (information_schema spelling, e.g. "integer").
    pub data_type: String,

    /// Whether the column allows NULL.
    pub is_nullable: bool,

    /// Column default expression, if any.
    pub column_default: Option<String>,

    /// Ordinal position (1-based).
    pub ordinal_position: i32,
}

impl Column {
    /// Whether the default draws from a sequence (SERIAL-style column).
    pub fn is_sequence_backed(&self) -> bool {
        self.column_default
            .as_deref()
            .is_some_and(|d| d.contains("nextval"))
    }
}

/// Full table schema as introspected from one side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table identity.
    pub table: TableRef,

    /// Columns in ordinal order.
    pub columns: Vec<Column>,

    /// Primary key column names, in key order.
    pub primary_key: Vec<String>,

    /// Columns covered by a single-column unique index (keyset fallbacks).
    pub unique_columns: Vec<String>,
}

impl TableSchema {
    /// The column used for keyset pagination: a single-column primary key,
    /// or the first non-nullable single-column unique column when no usable
    /// key exists. Nullable unique columns are rejected: `key > cursor` is
    /// NULL for NULL keys, so rows past the last non-NULL value would never
    /// be fetched. `None` means the table has no stable key and must be
    /// streamed.
    pub fn transfer_key(&self) -> Option<&str> {
        if self.primary_key.len() == 1 {
            return Some(self.primary_key[0].as_str());
        }
        self.unique_columns
            .iter()
            .find(|name| {
                self.columns
                    .iter()
                    .any(|c| &c.name == *name && !c.is_nullable)
            })
            .map(|s| s.as_str())
    }

    /// Column names in ordinal order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Whether any column is backed by a sequence (SERIAL and friends).
    pub fn has_sequence_columns(&self) -> bool {
        self.columns.iter().any(Column::is_sequence_backed)
    }

    /// Generate a CREATE TABLE statement for this schema at `target`.
    ///
    /// Sequence-backed integer columns are rewritten to SERIAL types so the
    /// target does not reference source-side sequence names that may not
    /// exist there.
    pub fn create_statement(&self, target: &TableRef) -> String {
        let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", target.qualified());

        let column_defs: Vec<String> = self
            .columns
            .iter()
            .map(|col| {
                let mut data_type = col.data_type.clone();
                let mut default_clause = String::new();

                if col.is_sequence_backed() {
                    match data_type.to_lowercase().as_str() {
                        "integer" => data_type = "SERIAL".to_string(),
                        "bigint" => data_type = "BIGSERIAL".to_string(),
                        "smallint" => data_type = "SMALLSERIAL".to_string(),
                        _ => {
                            if let Some(ref default) = col.column_default {
                                default_clause = format!(" DEFAULT {}", default);
                            }
                        }
                    }
                } else if let Some(ref default) = col.column_default {
                    default_clause = format!(" DEFAULT {}", default);
                }

                let mut def = format!("    {} {}", quote_ident(&col.name), data_type);
                // SERIAL implies NOT NULL
                if !col.is_nullable && !col.is_sequence_backed() {
                    def.push_str(" NOT NULL");
                }
                def.push_str(&default_clause);
                def
            })
            .collect();

        sql.push_str(&column_defs.join(",\n"));

        if !self.primary_key.is_empty() {
            let pk_cols: Vec<String> = self.primary_key.iter().map(|c| quote_ident(c)).collect();
            sql.push_str(&format!(",\n    PRIMARY KEY ({})", pk_cols.join(", ")));
        }

        sql.push_str("\n)");
        sql
    }
}

/// Foreign key constraint, as seen from the referencing table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name.
    pub name: String,

    /// Referenced table.
    pub references: TableRef,
}

/// Quote a PostgreSQL identifier, escaping embedded double quotes.
///
/// Identifiers cannot be parameterized in prepared statements, so dynamic
/// table and column names are always routed through this helper.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
