//! Source (read) side of the migration.

mod sqlite;

pub use sqlite::SqliteSource;

use crate::error::Result;
use crate::value::SourceRow;
use async_trait::async_trait;

/// Read port over the legacy store.
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Read every row of `table`, sorted ascending by `order_by`.
    async fn list_rows(&self, table: &str, order_by: &[&str]) -> Result<Vec<SourceRow>>;

    /// Get the database type.
    fn db_type(&self) -> &str;

    /// Close the connection. Later reads fail.
    async fn close(&self);
}

/// Quote an identifier for SQL, doubling embedded quotes.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Build the ordered full-table read.
pub(crate) fn select_ordered_sql(table: &str, order_by: &[&str]) -> String {
    let mut sql = format!("SELECT * FROM {}", quote_ident(table));
    if !order_by.is_empty() {
        let cols: Vec<String> = order_by.iter().map(|c| quote_ident(c)).collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&cols.join(", "));
    }
    sql
}
