//! In-memory stores for exercising the engine without live databases.

#![allow(dead_code)]

use async_trait::async_trait;
use reforge_migrate::{
    InsertOutcome, MigrateError, Result, SourceRow, SourceStore, SourceValue, SqlValue, TargetRow,
    TargetStore,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Source rows keyed by table, returned sorted like `ORDER BY` would.
#[derive(Clone, Default)]
pub struct MemorySource {
    tables: Arc<Mutex<HashMap<String, Vec<SourceRow>>>>,
    pub reads: Arc<Mutex<Vec<String>>>,
    pub closed: Arc<Mutex<bool>>,
    fail_on: Option<String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, table: &str, rows: Vec<SourceRow>) -> Self {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
        self
    }

    /// Make reads of `table` fail as a lost connection would.
    pub fn failing_on(mut self, table: &str) -> Self {
        self.fail_on = Some(table.to_string());
        self
    }

    pub fn read_tables(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

#[async_trait]
impl SourceStore for MemorySource {
    async fn list_rows(&self, table: &str, order_by: &[&str]) -> Result<Vec<SourceRow>> {
        self.reads.lock().unwrap().push(table.to_string());
        if self.fail_on.as_deref() == Some(table) {
            return Err(MigrateError::connection("memory", "source went away"));
        }
        let mut rows = self
            .tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default();
        // SQLite sorts NULL first in ascending order, as does Option.
        rows.sort_by_key(|row| {
            order_by
                .iter()
                .map(|col| row.get(col).as_i64())
                .collect::<Vec<_>>()
        });
        Ok(rows)
    }

    fn db_type(&self) -> &str {
        "memory"
    }

    async fn close(&self) {
        *self.closed.lock().unwrap() = true;
    }
}

type Rejecter = Arc<dyn Fn(&TargetRow) -> Option<String> + Send + Sync>;

#[derive(Default)]
pub struct TargetState {
    pub committed: HashMap<String, Vec<TargetRow>>,
    pending: Vec<TargetRow>,
    pending_clears: Vec<String>,
    in_tx: bool,
    pub cleared: Vec<String>,
    pub commits: usize,
    pub closed: bool,
}

/// Transactional in-memory target.
#[derive(Clone, Default)]
pub struct MemoryTarget {
    pub state: Arc<Mutex<TargetState>>,
    rejecter: Option<Rejecter>,
    fail_clear_on: Option<String>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse rows for which `f` returns a cause.
    pub fn rejecting<F>(mut self, f: F) -> Self
    where
        F: Fn(&TargetRow) -> Option<String> + Send + Sync + 'static,
    {
        self.rejecter = Some(Arc::new(f));
        self
    }

    pub fn failing_clear_on(mut self, table: &str) -> Self {
        self.fail_clear_on = Some(table.to_string());
        self
    }

    /// Pre-populate committed rows, as if left over from an earlier run.
    pub fn seed(&self, row: TargetRow) {
        self.state
            .lock()
            .unwrap()
            .committed
            .entry(row.table.clone())
            .or_default()
            .push(row);
    }

    pub fn rows(&self, table: &str) -> Vec<TargetRow> {
        self.state
            .lock()
            .unwrap()
            .committed
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn count(&self, table: &str) -> usize {
        self.rows(table).len()
    }

    pub fn cleared(&self) -> Vec<String> {
        self.state.lock().unwrap().cleared.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    /// Committed row of `table` whose `column` holds `text`.
    pub fn find(&self, table: &str, column: &str, text: &str) -> Option<TargetRow> {
        self.rows(table)
            .into_iter()
            .find(|r| r.get(column) == Some(&SqlValue::Text(text.to_string())))
    }
}

#[async_trait]
impl TargetStore for MemoryTarget {
    async fn begin(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.in_tx = true;
        state.pending.clear();
        state.pending_clears.clear();
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let clears: Vec<String> = state.pending_clears.drain(..).collect();
        for table in clears {
            state.committed.remove(&table);
            state.cleared.push(table);
        }
        let pending: Vec<TargetRow> = state.pending.drain(..).collect();
        for row in pending {
            state.committed.entry(row.table.clone()).or_default().push(row);
        }
        state.in_tx = false;
        state.commits += 1;
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.pending.clear();
        state.pending_clears.clear();
        state.in_tx = false;
        Ok(())
    }

    async fn truncate(&self, table: &str) -> Result<()> {
        if self.fail_clear_on.as_deref() == Some(table) {
            return Err(MigrateError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "permission denied for table",
            )));
        }
        self.state
            .lock()
            .unwrap()
            .pending_clears
            .push(table.to_string());
        Ok(())
    }

    async fn insert_row(&self, row: &TargetRow) -> Result<InsertOutcome> {
        if let Some(cause) = self.rejecter.as_ref().and_then(|f| f(row)) {
            return Ok(InsertOutcome::Rejected(cause));
        }
        let mut state = self.state.lock().unwrap();
        assert!(state.in_tx, "insert outside a transaction");
        state.pending.push(row.clone());
        Ok(InsertOutcome::Inserted)
    }

    fn db_type(&self) -> &str {
        "memory"
    }

    async fn close(&self) {
        self.state.lock().unwrap().closed = true;
    }
}

pub fn int(n: i64) -> SourceValue {
    SourceValue::Integer(n)
}

pub fn text(s: &str) -> SourceValue {
    SourceValue::Text(s.to_string())
}

pub fn row(pairs: Vec<(&str, SourceValue)>) -> SourceRow {
    SourceRow::from_pairs(pairs)
}

pub fn uuid_of(row: &TargetRow, column: &str) -> Option<uuid::Uuid> {
    match row.get(column) {
        Some(SqlValue::Uuid(id)) => Some(*id),
        _ => None,
    }
}
