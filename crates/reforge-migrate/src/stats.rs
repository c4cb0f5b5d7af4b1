//! Per-table counters, the row error log and the run summary.
//!
//! Nothing here feeds back into control flow.

use crate::catalog::TABLES;
use crate::error::RowError;
use serde::Serialize;
use std::fmt::Write as _;

/// Default number of errors listed in the summary.
pub const DEFAULT_ERRORS_SHOWN: usize = 10;

const RULE_WIDTH: usize = 60;

/// Rows migrated for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
    pub table: &'static str,
    #[serde(skip)]
    pub label: &'static str,
    pub migrated: u64,
}

/// Accumulated results of a migration run.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStats {
    tables: Vec<TableCount>,
    errors: Vec<RowError>,
}

impl Default for MigrationStats {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationStats {
    /// Zeroed counters for every table, in dependency order.
    pub fn new() -> Self {
        Self {
            tables: TABLES
                .iter()
                .map(|t| TableCount {
                    table: t.name,
                    label: t.label,
                    migrated: 0,
                })
                .collect(),
            errors: Vec::new(),
        }
    }

    /// Count one successfully written row.
    pub fn record_success(&mut self, table: &str) {
        if let Some(entry) = self.tables.iter_mut().find(|t| t.table == table) {
            entry.migrated += 1;
        }
    }

    /// Append a row failure to the error log.
    pub fn record_error(&mut self, error: RowError) {
        self.errors.push(error);
    }

    /// Rows migrated for `table`.
    pub fn migrated(&self, table: &str) -> u64 {
        self.tables
            .iter()
            .find(|t| t.table == table)
            .map(|t| t.migrated)
            .unwrap_or(0)
    }

    pub fn tables(&self) -> &[TableCount] {
        &self.tables
    }

    pub fn errors(&self) -> &[RowError] {
        &self.errors
    }

    /// Errors recorded against `table`.
    pub fn errors_for<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a RowError> + 'a {
        self.errors.iter().filter(move |e| e.table() == table)
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn total_migrated(&self) -> u64 {
        self.tables.iter().map(|t| t.migrated).sum()
    }

    /// Human-readable summary listing at most `limit` errors.
    pub fn render_summary(&self, limit: usize) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let label_width = self.tables.iter().map(|t| t.label.len()).max().unwrap_or(0) + 1;
        let mut out = String::new();

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "MIGRATION SUMMARY");
        let _ = writeln!(out, "{}", rule);
        for t in &self.tables {
            let _ = writeln!(
                out,
                "{:<width$} {}",
                format!("{}:", t.label),
                t.migrated,
                width = label_width
            );
        }
        let _ = writeln!(out, "{}", rule);

        if self.errors.is_empty() {
            let _ = writeln!(out, "Migration completed with no errors.");
        } else {
            let _ = writeln!(out, "ERRORS: {}", self.errors.len());
            for err in self.errors.iter().take(limit) {
                let _ = writeln!(out, "  - {}", err);
            }
            if self.errors.len() > limit {
                let _ = writeln!(out, "  ... and {} more errors", self.errors.len() - limit);
            }
        }
        let _ = write!(out, "{}", rule);

        out
    }
}
