//! Generic per-table migration step.
//!
//! One [`TableSpec`] drives the whole step: read the source rows in key order,
//! transform each one, insert it, and register newly minted ids only once the
//! insert has succeeded. Row failures are recorded and skipped; store failures
//! abort the step.
//!
//! Each table runs in one transaction and every insert runs inside its own
//! savepoint, so a rejected row is rolled back on its own and the rows before
//! it are kept. After the commit the table holds exactly the rows counted as
//! migrated.

use crate::catalog::TableSpec;
use crate::error::{Result, RowError};
use crate::mapper::IdMapper;
use crate::orchestrator::MigrationRun;
use crate::source::SourceStore;
use crate::target::{InsertOutcome, TargetStore};
use crate::transform::{legacy_id, row_key, transform_row};
use crate::value::SourceRow;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Outcome of one table step.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TableReport {
    /// Table name.
    pub table: String,

    /// Rows read from the source.
    pub rows_read: usize,

    /// Rows written and committed.
    pub rows_migrated: usize,

    /// Rows dropped with a recorded error.
    pub rows_failed: usize,

    /// Wall time for the step.
    #[serde(skip)]
    pub duration: Duration,
}

/// Migrate every row of one table.
///
/// Returns an error only for failures of the stores themselves (read,
/// transaction control, lost connection); those end the run.
pub async fn migrate_table(
    spec: &TableSpec,
    source: &dyn SourceStore,
    target: &dyn TargetStore,
    run: &mut MigrationRun,
) -> Result<TableReport> {
    let started = Instant::now();
    info!("Migrating {}...", spec.name);

    let rows = source.list_rows(spec.name, spec.order_by).await?;
    debug!("Read {} rows from {}", rows.len(), spec.name);

    let mut report = TableReport {
        table: spec.name.to_string(),
        rows_read: rows.len(),
        ..Default::default()
    };

    target.begin().await?;

    for row in &rows {
        match migrate_row(spec, row, target, run).await {
            Ok(true) => report.rows_migrated += 1,
            Ok(false) => report.rows_failed += 1,
            Err(e) => {
                if let Err(rollback_err) = target.rollback().await {
                    warn!("Rollback of {} failed: {}", spec.name, rollback_err);
                }
                return Err(e);
            }
        }
    }

    target.commit().await?;

    report.duration = started.elapsed();
    info!(
        "Migrated {} {} ({} skipped) in {:.2}s",
        report.rows_migrated,
        spec.name,
        report.rows_failed,
        report.duration.as_secs_f64()
    );

    Ok(report)
}

/// Migrate one row. `Ok(false)` means the row was dropped and its error
/// recorded.
async fn migrate_row(
    spec: &TableSpec,
    row: &SourceRow,
    target: &dyn TargetStore,
    run: &mut MigrationRun,
) -> Result<bool> {
    let legacy = match legacy_id(spec, row) {
        Ok(legacy) => legacy,
        Err(e) => return Ok(run.reject(e)),
    };

    let minted = match (spec.minted(), legacy) {
        (Some(kind), Some(legacy)) => {
            if run.mapper.contains(kind, legacy) {
                return Ok(run.reject(RowError::InvalidId {
                    table: spec.name.to_string(),
                    row: row_key(spec, row),
                    reason: format!("legacy id {} is already mapped", legacy),
                }));
            }
            Some((kind, legacy, IdMapper::mint()))
        }
        _ => None,
    };

    let new_id = minted.map(|(_, _, id)| id);
    let target_row = match transform_row(spec, row, new_id, &run.mapper, run.started_at) {
        Ok(r) => r,
        Err(e) => return Ok(run.reject(e)),
    };

    match target.insert_row(&target_row).await? {
        InsertOutcome::Inserted => {
            if let Some((kind, legacy, id)) = minted {
                run.mapper.record(kind, legacy, id);
            }
            run.stats.record_success(spec.name);
            Ok(true)
        }
        InsertOutcome::Rejected(cause) => Ok(run.reject(RowError::InsertRejected {
            table: spec.name.to_string(),
            row: row_key(spec, row),
            cause,
        })),
    }
}
