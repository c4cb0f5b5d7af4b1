//! Error types for the migration library.
//!
//! [`MigrateError`] is fatal: it unwinds the run and ends the process with a
//! non-zero exit code. [`RowError`] is recorded against a single row and never
//! interrupts a table step.

use crate::value::RowKey;
use serde::Serialize;
use thiserror::Error;

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for connection failures.
pub const EXIT_CONNECTION_ERROR: u8 = 2;
/// Exit code for a failed pre-migration clear.
pub const EXIT_CLEAR_ERROR: u8 = 3;
/// Exit code for database failures during a table step.
pub const EXIT_DATABASE_ERROR: u8 = 4;
/// Exit code for I/O errors (missing config file, etc.).
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A store connection could not be established or was lost.
    #[error("Connection error ({store}): {message}")]
    Connection { store: String, message: String },

    /// Clearing the target before migration failed.
    #[error("Failed to clear table {table}: {message}")]
    Clear { table: String, message: String },

    /// Source (SQLite) query error
    #[error("Source database error: {0}")]
    Source(#[from] rusqlite::Error),

    /// Target (PostgreSQL) error outside of a single-row rejection
    #[error("Target database error: {0}")]
    Target(#[from] tokio_postgres::Error),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Connection error for the named store.
    pub fn connection(store: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Connection {
            store: store.into(),
            message: message.into(),
        }
    }

    /// Create a Clear error for the named table.
    pub fn clear(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Clear {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) => EXIT_CONFIG_ERROR,
            MigrateError::Connection { .. } => EXIT_CONNECTION_ERROR,
            MigrateError::Clear { .. } => EXIT_CLEAR_ERROR,
            MigrateError::Source(_) | MigrateError::Target(_) | MigrateError::Json(_) => {
                EXIT_DATABASE_ERROR
            }
            MigrateError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

/// A non-fatal failure that drops one row from a table step.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowError {
    /// A foreign key points at a parent that has no mapping in this run.
    #[error("{table} row {row}: {column} references {entity} id {legacy_id}, which was not migrated")]
    UnresolvedReference {
        table: String,
        row: RowKey,
        column: String,
        entity: String,
        legacy_id: i64,
    },

    /// A required foreign key is NULL (or not an integer) in the source row.
    #[error("{table} row {row}: required reference {column} is missing")]
    MissingReference {
        table: String,
        row: RowKey,
        column: String,
    },

    /// The source row has no usable integer id, or its id was already mapped.
    #[error("{table} row {row}: {reason}")]
    InvalidId {
        table: String,
        row: RowKey,
        reason: String,
    },

    /// A column holds a value that cannot be written without altering it.
    #[error("{table} row {row}: {column} {reason}")]
    InvalidValue {
        table: String,
        row: RowKey,
        column: String,
        reason: String,
    },

    /// The target rejected the transformed row.
    #[error("{table} row {row}: insert rejected: {cause}")]
    InsertRejected {
        table: String,
        row: RowKey,
        cause: String,
    },
}

impl RowError {
    /// Table the failing row belongs to.
    pub fn table(&self) -> &str {
        match self {
            RowError::UnresolvedReference { table, .. }
            | RowError::MissingReference { table, .. }
            | RowError::InvalidId { table, .. }
            | RowError::InvalidValue { table, .. }
            | RowError::InsertRejected { table, .. } => table,
        }
    }

    /// Key of the failing row.
    pub fn row(&self) -> &RowKey {
        match self {
            RowError::UnresolvedReference { row, .. }
            | RowError::MissingReference { row, .. }
            | RowError::InvalidId { row, .. }
            | RowError::InvalidValue { row, .. }
            | RowError::InsertRejected { row, .. } => row,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(MigrateError::Config("x".into()).exit_code(), EXIT_CONFIG_ERROR);
        assert_eq!(
            MigrateError::connection("postgres", "refused").exit_code(),
            EXIT_CONNECTION_ERROR
        );
        assert_eq!(MigrateError::clear("users", "locked").exit_code(), EXIT_CLEAR_ERROR);
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(MigrateError::from(io).exit_code(), EXIT_IO_ERROR);
    }

    #[test]
    fn test_unresolved_reference_message_names_row_and_parent() {
        let err = RowError::UnresolvedReference {
            table: "attempts".into(),
            row: RowKey::Id(7),
            column: "session_id".into(),
            entity: "sessions".into(),
            legacy_id: 99,
        };
        let msg = err.to_string();
        assert!(msg.contains("attempts row id=7"), "{msg}");
        assert!(msg.contains("session_id references sessions id 99"), "{msg}");
        assert_eq!(err.table(), "attempts");
        assert_eq!(err.row(), &RowKey::Id(7));
    }
}
