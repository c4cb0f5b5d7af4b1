//! SQLite source store.

use super::{select_ordered_sql, SourceStore};
use crate::error::{MigrateError, Result};
use crate::value::{SourceRow, SourceValue};
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Read-only connection to the legacy SQLite database.
///
/// Reads run synchronously on the calling task; the migration never has more
/// than one store operation in flight.
pub struct SqliteSource {
    conn: Mutex<Option<Connection>>,
    path: PathBuf,
}

impl SqliteSource {
    /// Open `path` read-only and check that it is a SQLite database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            MigrateError::connection("sqlite", format!("{}: {}", path.display(), e))
        })?;

        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(|e| MigrateError::connection("sqlite", format!("{}: {}", path.display(), e)))?;

        info!("Connected to SQLite: {}", path.display());

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_rows(conn: &Connection, sql: &str) -> Result<Vec<SourceRow>> {
        let mut stmt = conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = SourceRow::new();
            for (i, name) in names.iter().enumerate() {
                record.insert(name.clone(), to_source_value(row.get_ref(i)?));
            }
            out.push(record);
        }
        Ok(out)
    }
}

fn to_source_value(value: ValueRef<'_>) -> SourceValue {
    match value {
        ValueRef::Null => SourceValue::Null,
        ValueRef::Integer(n) => SourceValue::Integer(n),
        ValueRef::Real(f) => SourceValue::Real(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => SourceValue::Text(text.to_string()),
            Err(_) => SourceValue::Bytes(bytes.to_vec()),
        },
    }
}

#[async_trait]
impl SourceStore for SqliteSource {
    async fn list_rows(&self, table: &str, order_by: &[&str]) -> Result<Vec<SourceRow>> {
        let sql = select_ordered_sql(table, order_by);
        debug!("Reading source rows: {}", sql);

        let guard = self
            .conn
            .lock()
            .map_err(|_| MigrateError::connection("sqlite", "connection lock poisoned"))?;
        let conn = guard
            .as_ref()
            .ok_or_else(|| MigrateError::connection("sqlite", "connection is closed"))?;
        Self::read_rows(conn, &sql)
    }

    fn db_type(&self) -> &str {
        "sqlite"
    }

    async fn close(&self) {
        let conn = match self.conn.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(conn) = conn {
            if let Err((_, e)) = conn.close() {
                tracing::warn!("Error closing SQLite connection: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SqliteSource::open(dir.path().join("missing.db")).err().unwrap();
        assert!(matches!(err, MigrateError::Connection { .. }), "{err}");
    }

    #[test]
    fn test_utf8_blob_and_text_become_text() {
        assert_eq!(
            to_source_value(ValueRef::Blob(b"abc")),
            SourceValue::Text("abc".into())
        );
        assert_eq!(
            to_source_value(ValueRef::Text(b"xyz")),
            SourceValue::Text("xyz".into())
        );
        assert_eq!(to_source_value(ValueRef::Integer(3)), SourceValue::Integer(3));
    }

    #[test]
    fn test_invalid_utf8_kept_as_bytes() {
        assert_eq!(
            to_source_value(ValueRef::Text(b"caf\xe9")),
            SourceValue::Bytes(b"caf\xe9".to_vec())
        );
        assert_eq!(
            to_source_value(ValueRef::Blob(&[0xff, 0x00])),
            SourceValue::Bytes(vec![0xff, 0x00])
        );
    }
}
