//! SQL value types for row transfer.
//!
//! Rows move through the pipeline as `Vec<SqlValue>` and are written to the
//! target as SQL literals inside multi-row INSERT statements, so every
//! variant knows how to render itself as a safely escaped PostgreSQL literal.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Type hint for NULL values so a typed NULL survives the round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlNullType {
    Bool,
    I16,
    I32,
    I64,
    F32,
    F64,
    Text,
    Bytes,
    Uuid,
    Decimal,
    DateTime,
    DateTimeOffset,
    Date,
    Time,
    Json,
}

/// SQL value enum for type-safe row handling.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL with a type hint.
    Null(SqlNullType),

    /// Boolean value.
    Bool(bool),

    /// 16-bit signed integer (smallint).
    I16(i16),

    /// 32-bit signed integer (integer).
    I32(i32),

    /// 64-bit signed integer (bigint).
    I64(i64),

    /// 32-bit floating point (real).
    F32(f32),

    /// 64-bit floating point (double precision).
    F64(f64),

    /// Text/string data.
    Text(String),

    /// Binary data (bytea).
    Bytes(Vec<u8>),

    /// UUID value.
    Uuid(Uuid),

    /// Decimal value with arbitrary precision.
    Decimal(Decimal),

    /// Timestamp without timezone.
    DateTime(NaiveDateTime),

    /// Timestamp with timezone offset.
    DateTimeOffset(DateTime<FixedOffset>),

    /// Date without time component.
    Date(NaiveDate),

    /// Time without date component.
    Time(NaiveTime),

    /// JSON/JSONB value.
    Json(serde_json::Value),
}

impl SqlValue {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null(_))
    }

    /// Integer view of the value, if it has one. Used for sequence math and
    /// keyset cursors over integer keys.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::I16(v) => Some(*v as i64),
            SqlValue::I32(v) => Some(*v as i64),
            SqlValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Render as a PostgreSQL literal, escaped for inline use in a statement.
    ///
    /// Identifiers cannot be parameterized in SQL and the batch INSERT is a
    /// single dynamically built statement, so data values are rendered as
    /// escaped literals the same way.
    #[must_use]
    pub fn to_sql_literal(&self) -> String {
        match self {
            SqlValue::Null(_) => "NULL".to_string(),
            SqlValue::Bool(v) => if *v { "TRUE" } else { "FALSE" }.to_string(),
            SqlValue::I16(v) => v.to_string(),
            SqlValue::I32(v) => v.to_string(),
            SqlValue::I64(v) => v.to_string(),
            SqlValue::F32(v) => float_literal(*v as f64),
            SqlValue::F64(v) => float_literal(*v),
            SqlValue::Text(v) => quote_text(v),
            SqlValue::Bytes(v) => {
                let hex: String = v.iter().map(|b| format!("{:02x}", b)).collect();
                format!("'\\x{}'", hex)
            }
            SqlValue::Uuid(v) => format!("'{}'", v),
            SqlValue::Decimal(v) => v.to_string(),
            SqlValue::DateTime(v) => format!("'{}'", v.format("%Y-%m-%d %H:%M:%S%.f")),
            SqlValue::DateTimeOffset(v) => format!("'{}'", v.to_rfc3339()),
            SqlValue::Date(v) => format!("'{}'", v.format("%Y-%m-%d")),
            SqlValue::Time(v) => format!("'{}'", v.format("%H:%M:%S%.f")),
            SqlValue::Json(v) => quote_text(&v.to_string()),
        }
    }
}

/// Quote and escape a text literal (doubling embedded single quotes).
fn quote_text(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Render a float, spelling out the non-finite values PostgreSQL accepts.
fn float_literal(v: f64) -> String {
    if v.is_nan() {
        "'NaN'".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "'Infinity'" } else { "'-Infinity'" }.to_string()
    } else {
        v.to_string()
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i16> for SqlValue {
    fn from(v: i16) -> Self {
        SqlValue::I16(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::I32(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::I64(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::F64(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_literal() {
        assert_eq!(SqlValue::Null(SqlNullType::Text).to_sql_literal(), "NULL");
        assert!(SqlValue::Null(SqlNullType::I64).is_null());
    }

    #[test]
    fn test_integer_literals() {
        assert_eq!(SqlValue::I32(42).to_sql_literal(), "42");
        assert_eq!(SqlValue::I64(-7).to_sql_literal(), "-7");
    }

    #[test]
    fn test_text_escaping() {
        assert_eq!(
            SqlValue::Text("it's".to_string()).to_sql_literal(),
            "'it''s'"
        );
    }

    #[test]
    fn test_bool_literals() {
        assert_eq!(SqlValue::Bool(true).to_sql_literal(), "TRUE");
        assert_eq!(SqlValue::Bool(false).to_sql_literal(), "FALSE");
    }

    #[test]
    fn test_bytes_hex_literal() {
        assert_eq!(
            SqlValue::Bytes(vec![0xde, 0xad]).to_sql_literal(),
            "'\\xdead'"
        );
    }

    #[test]
    fn test_date_literal() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(SqlValue::Date(d).to_sql_literal(), "'2024-03-09'");
    }

    #[test]
    fn test_json_escaping() {
        let v = SqlValue::Json(serde_json::json!({"k": "o'clock"}));
        assert_eq!(v.to_sql_literal(), r#"'{"k":"o''clock"}'"#);
    }

    #[test]
    fn test_non_finite_floats() {
        assert_eq!(SqlValue::F64(f64::NAN).to_sql_literal(), "'NaN'");
        assert_eq!(
            SqlValue::F64(f64::NEG_INFINITY).to_sql_literal(),
            "'-Infinity'"
        );
    }

    #[test]
    fn test_as_i64() {
        assert_eq!(SqlValue::I16(3).as_i64(), Some(3));
        assert_eq!(SqlValue::Text("3".into()).as_i64(), None);
    }

    #[test]
    fn test_from_implementations() {
        let v: SqlValue = 42i32.into();
        assert_eq!(v, SqlValue::I32(42));

        let v: SqlValue = "hello".into();
        assert_eq!(v, SqlValue::Text("hello".to_string()));
    }
}
