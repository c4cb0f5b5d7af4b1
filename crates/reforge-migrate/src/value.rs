//! Row and value types exchanged between the stores and the engine.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// A value as read from the SQLite source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    /// A blob, or text that is not valid UTF-8.
    Bytes(Vec<u8>),
}

static NULL: SourceValue = SourceValue::Null;

impl SourceValue {
    /// Integer view of the value, used for legacy ids and references.
    ///
    /// Text holding a decimal integer is accepted; SQLite's loose typing
    /// allows it in INTEGER columns.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SourceValue::Integer(n) => Some(*n),
            SourceValue::Real(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            SourceValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// True for NULL and for text that is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        match self {
            SourceValue::Null => true,
            SourceValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<i64> for SourceValue {
    fn from(n: i64) -> Self {
        SourceValue::Integer(n)
    }
}

impl From<f64> for SourceValue {
    fn from(f: f64) -> Self {
        SourceValue::Real(f)
    }
}

impl From<&str> for SourceValue {
    fn from(s: &str) -> Self {
        SourceValue::Text(s.to_string())
    }
}

impl From<String> for SourceValue {
    fn from(s: String) -> Self {
        SourceValue::Text(s)
    }
}

impl<T: Into<SourceValue>> From<Option<T>> for SourceValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SourceValue::Null)
    }
}

/// One source row, addressed by column name.
///
/// Columns the source table does not have read as NULL, so a database created
/// before a column was added still migrates with that column's default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRow {
    values: HashMap<String, SourceValue>,
}

impl SourceRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SourceValue>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<SourceValue>) {
        self.values.insert(column.into(), value.into());
    }

    /// Value of `column`, or NULL when the column is absent.
    pub fn get(&self, column: &str) -> &SourceValue {
        self.values.get(column).unwrap_or(&NULL)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A value bound for the PostgreSQL target.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Bytes(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl From<&SourceValue> for SqlValue {
    fn from(v: &SourceValue) -> Self {
        match v {
            SourceValue::Null => SqlValue::Null,
            SourceValue::Integer(n) => SqlValue::I64(*n),
            SourceValue::Real(f) => SqlValue::F64(*f),
            SourceValue::Text(s) => SqlValue::Text(s.clone()),
            SourceValue::Bytes(b) => SqlValue::Bytes(b.clone()),
        }
    }
}

/// A fully transformed row ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetRow {
    /// Target table name (unqualified).
    pub table: String,
    /// Column names, parallel to `values`.
    pub columns: Vec<String>,
    pub values: Vec<SqlValue>,
}

impl TargetRow {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn push(&mut self, column: impl Into<String>, value: SqlValue) {
        self.columns.push(column.into());
        self.values.push(value);
    }

    /// Value written to `column`, if the row carries it.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }
}

/// How a source row is identified in error messages.
#[derive(Debug, Clone, PartialEq)]
pub enum RowKey {
    /// Legacy integer primary key.
    Id(i64),
    /// Key columns of a junction or keyed table; `None` is a NULL key part.
    Composite(Vec<(String, Option<i64>)>),
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Id(id) => write!(f, "id={}", id),
            RowKey::Composite(parts) => {
                for (i, (col, val)) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match val {
                        Some(v) => write!(f, "{}={}", col, v)?,
                        None => write!(f, "{}=NULL", col)?,
                    }
                }
                Ok(())
            }
        }
    }
}

impl Serialize for RowKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_reads_as_null() {
        let row = SourceRow::from_pairs([("id", 1i64)]);
        assert_eq!(row.get("id"), &SourceValue::Integer(1));
        assert_eq!(row.get("role"), &SourceValue::Null);
    }

    #[test]
    fn test_as_i64_accepts_loose_sqlite_integers() {
        assert_eq!(SourceValue::Integer(4).as_i64(), Some(4));
        assert_eq!(SourceValue::Text(" 12 ".into()).as_i64(), Some(12));
        assert_eq!(SourceValue::Real(3.0).as_i64(), Some(3));
        assert_eq!(SourceValue::Real(3.5).as_i64(), None);
        assert_eq!(SourceValue::Text("abc".into()).as_i64(), None);
        assert_eq!(SourceValue::Null.as_i64(), None);
    }

    #[test]
    fn test_row_key_display() {
        assert_eq!(RowKey::Id(5).to_string(), "id=5");
        let key = RowKey::Composite(vec![
            ("session_id".into(), Some(3)),
            ("problem_id".into(), None),
        ]);
        assert_eq!(key.to_string(), "session_id=3, problem_id=NULL");
    }
}
