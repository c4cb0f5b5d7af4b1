//! Target (write) side of the migration.

mod postgres;

pub use postgres::PgTarget;

use crate::error::Result;
use crate::value::TargetRow;
use async_trait::async_trait;

/// Result of writing one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row is part of the open transaction.
    Inserted,
    /// The target refused the row (constraint or type violation). The open
    /// transaction is left as it was before the attempt.
    Rejected(String),
}

/// Write port over the new store.
///
/// Errors returned from these methods are fatal to the run; a row the
/// database merely refuses is reported through [`InsertOutcome::Rejected`].
#[async_trait]
pub trait TargetStore: Send + Sync {
    /// Open a transaction.
    async fn begin(&self) -> Result<()>;

    /// Commit the open transaction.
    async fn commit(&self) -> Result<()>;

    /// Roll back the open transaction.
    async fn rollback(&self) -> Result<()>;

    /// Remove every row from `table`.
    async fn truncate(&self, table: &str) -> Result<()>;

    /// Insert one row inside the open transaction.
    async fn insert_row(&self, row: &TargetRow) -> Result<InsertOutcome>;

    /// Get the database type.
    fn db_type(&self) -> &str;

    /// Close the connection.
    async fn close(&self);
}
