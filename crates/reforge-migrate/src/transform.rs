//! Source row to target row conversion.
//!
//! Transformation is pure: the same row, mapper contents and clock reading
//! always produce the same result. A row is either fully converted or rejected
//! with a [`RowError`]; a required foreign key is never replaced by NULL.

use crate::catalog::{ColumnKind, ColumnSpec, Identity, TableSpec};
use crate::error::RowError;
use crate::mapper::IdMapper;
use crate::value::{RowKey, SourceRow, SourceValue, SqlValue, TargetRow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

/// Naive datetime layouts written by SQLite and the Go/Python drivers.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Offset-carrying layouts not covered by RFC 3339.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Parse a source timestamp. Naive values are taken as UTC.
///
/// Returns `None` for NULL, blank or unparseable input.
pub fn parse_timestamp(value: &SourceValue) -> Option<DateTime<Utc>> {
    match value {
        SourceValue::Text(s) => parse_timestamp_str(s.trim()),
        // unixepoch() style integers
        SourceValue::Integer(secs) => DateTime::from_timestamp(*secs, 0),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Interpret a 0/1-style flag. `None` means the column default applies.
pub fn parse_bool(value: &SourceValue) -> Option<bool> {
    match value {
        SourceValue::Null => None,
        SourceValue::Integer(n) => Some(*n != 0),
        SourceValue::Real(f) => Some(*f != 0.0),
        SourceValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "t" | "yes" | "y" => Some(true),
            "0" | "false" | "f" | "no" | "n" => Some(false),
            _ => None,
        },
        SourceValue::Bytes(_) => None,
    }
}

/// Key used to name `row` in error messages.
pub fn row_key(spec: &TableSpec, row: &SourceRow) -> RowKey {
    match spec.identity {
        Identity::Minted(_) => match row.get("id").as_i64() {
            Some(id) => RowKey::Id(id),
            None => RowKey::Composite(vec![("id".to_string(), None)]),
        },
        Identity::Composite => RowKey::Composite(
            spec.order_by
                .iter()
                .map(|col| (col.to_string(), row.get(col).as_i64()))
                .collect(),
        ),
    }
}

/// Legacy integer id of a row from a minted table.
pub fn legacy_id(spec: &TableSpec, row: &SourceRow) -> Result<Option<i64>, RowError> {
    match spec.identity {
        Identity::Composite => Ok(None),
        Identity::Minted(_) => row
            .get("id")
            .as_i64()
            .map(Some)
            .ok_or_else(|| RowError::InvalidId {
                table: spec.name.to_string(),
                row: row_key(spec, row),
                reason: "missing or non-integer id".to_string(),
            }),
    }
}

/// Convert one source row into a target row.
///
/// `new_id` is written to the `id` column of minted tables. `now` fills
/// timestamp columns whose documented default is the current time.
pub fn transform_row(
    spec: &TableSpec,
    row: &SourceRow,
    new_id: Option<Uuid>,
    mapper: &IdMapper,
    now: DateTime<Utc>,
) -> Result<TargetRow, RowError> {
    let mut out = TargetRow::new(spec.name);

    if let (Identity::Minted(_), Some(id)) = (spec.identity, new_id) {
        out.push("id", SqlValue::Uuid(id));
    }

    for column in spec.columns {
        let value = convert_column(spec, column, row, mapper, now)?;
        out.push(column.name, value);
    }

    Ok(out)
}

fn convert_column(
    spec: &TableSpec,
    column: &ColumnSpec,
    row: &SourceRow,
    mapper: &IdMapper,
    now: DateTime<Utc>,
) -> Result<SqlValue, RowError> {
    let value = row.get(column.name);

    if let SourceValue::Bytes(bytes) = value {
        return Err(RowError::InvalidValue {
            table: spec.name.to_string(),
            row: row_key(spec, row),
            column: column.name.to_string(),
            reason: format!("holds {} bytes that are not valid UTF-8 text", bytes.len()),
        });
    }

    let converted = match column.kind {
        ColumnKind::Copy => SqlValue::from(value),
        ColumnKind::Text { default } => {
            if value.is_blank() {
                SqlValue::Text(default.to_string())
            } else {
                SqlValue::from(value)
            }
        }
        ColumnKind::Bool { default } => SqlValue::Bool(parse_bool(value).unwrap_or(default)),
        ColumnKind::Timestamp { default_now } => match parse_timestamp(value) {
            Some(ts) => SqlValue::Timestamp(ts),
            None if default_now => SqlValue::Timestamp(now),
            None => SqlValue::Null,
        },
        ColumnKind::Reference { entity, required } => match value.as_i64() {
            Some(legacy) => match mapper.get(entity, legacy) {
                Some(id) => SqlValue::Uuid(id),
                None => {
                    return Err(RowError::UnresolvedReference {
                        table: spec.name.to_string(),
                        row: row_key(spec, row),
                        column: column.name.to_string(),
                        entity: entity.to_string(),
                        legacy_id: legacy,
                    })
                }
            },
            None if value.is_blank() && !required => SqlValue::Null,
            None => {
                return Err(RowError::MissingReference {
                    table: spec.name.to_string(),
                    row: row_key(spec, row),
                    column: column.name.to_string(),
                })
            }
        },
    };

    Ok(converted)
}
