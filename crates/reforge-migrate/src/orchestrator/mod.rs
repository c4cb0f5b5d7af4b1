//! Migration orchestrator - main workflow coordinator.

use crate::catalog::{self, TABLES};
use crate::config::{Config, MigrationConfig};
use crate::error::{MigrateError, Result, RowError};
use crate::mapper::IdMapper;
use crate::source::{SourceStore, SqliteSource};
use crate::stats::MigrationStats;
use crate::target::{PgTarget, TargetStore};
use crate::transfer::{migrate_table, TableReport};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

/// State owned by one migration run and threaded through every table step.
#[derive(Debug)]
pub struct MigrationRun {
    /// Legacy id to UUID map, populated as parent rows are written.
    pub mapper: IdMapper,

    /// Per-table counters and the row error log.
    pub stats: MigrationStats,

    /// Run start; fills timestamp columns that default to "now".
    pub started_at: DateTime<Utc>,
}

impl MigrationRun {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            mapper: IdMapper::new(),
            stats: MigrationStats::new(),
            started_at,
        }
    }

    /// Record a dropped row. Always returns false so callers can report the
    /// row as not migrated in one expression.
    pub fn reject(&mut self, err: RowError) -> bool {
        warn!("{}", err);
        self.stats.record_error(err);
        false
    }
}

/// Migration orchestrator.
pub struct Orchestrator {
    options: MigrationConfig,
    source: Box<dyn SourceStore>,
    target: Box<dyn TargetStore>,
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status: "completed" or "completed_with_errors".
    pub status: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// When the migration completed.
    pub completed_at: DateTime<Utc>,

    /// Total rows migrated across all tables.
    pub rows_migrated: u64,

    /// Number of dropped rows.
    pub error_count: usize,

    /// Per-table step reports, in migration order.
    pub tables: Vec<TableReport>,

    /// Counters and row errors.
    pub stats: MigrationStats,
}

impl MigrationResult {
    /// Serialize the result as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// True when no row was dropped.
    pub fn is_clean(&self) -> bool {
        self.error_count == 0
    }
}

impl Orchestrator {
    /// Create an orchestrator over already-open stores.
    pub fn new(
        source: Box<dyn SourceStore>,
        target: Box<dyn TargetStore>,
        options: MigrationConfig,
    ) -> Self {
        Self {
            options,
            source,
            target,
        }
    }

    /// Open the SQLite source, then the PostgreSQL target.
    pub async fn connect(config: Config) -> Result<Self> {
        let source = SqliteSource::open(&config.source.path)?;

        let target = match PgTarget::connect(&config.target).await {
            Ok(target) => target,
            Err(e) => {
                source.close().await;
                return Err(e);
            }
        };

        Ok(Self::new(
            Box::new(source),
            Box::new(target),
            config.migration,
        ))
    }

    /// Run the migration. Both stores are closed before this returns, whether
    /// the run succeeded or not.
    pub async fn run(self) -> Result<MigrationResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        info!("Starting migration run: {}", run_id);

        let outcome = self.execute(started_at).await;

        self.source.close().await;
        self.target.close().await;
        info!("Database connections closed");

        let (run, tables) = match outcome {
            Ok(done) => done,
            Err(e) => {
                error!("Migration failed: {}", e);
                return Err(e);
            }
        };

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
        let error_count = run.stats.error_count();

        let result = MigrationResult {
            run_id,
            status: if error_count == 0 {
                "completed"
            } else {
                "completed_with_errors"
            }
            .to_string(),
            duration_seconds: duration,
            started_at,
            completed_at,
            rows_migrated: run.stats.total_migrated(),
            error_count,
            tables,
            stats: run.stats,
        };

        info!(
            "Migration {}: {} rows in {:.1}s, {} rows skipped",
            result.status, result.rows_migrated, result.duration_seconds, result.error_count
        );

        Ok(result)
    }

    async fn execute(&self, started_at: DateTime<Utc>) -> Result<(MigrationRun, Vec<TableReport>)> {
        if self.options.clear_target {
            self.clear_target().await?;
        } else {
            warn!("Skipping target clear; existing rows are kept");
        }

        let mut run = MigrationRun::new(started_at);
        let mut reports = Vec::with_capacity(TABLES.len());

        for spec in TABLES.iter() {
            let report = migrate_table(
                spec,
                self.source.as_ref(),
                self.target.as_ref(),
                &mut run,
            )
            .await?;
            reports.push(report);
        }

        Ok((run, reports))
    }

    /// Delete all rows from every target table, children first, in one
    /// transaction.
    async fn clear_target(&self) -> Result<()> {
        info!("Clearing existing {} data", self.target.db_type());

        self.target.begin().await.map_err(as_clear_error("all tables"))?;

        for table in catalog::clear_order() {
            if let Err(e) = self.target.truncate(table).await {
                if let Err(rollback_err) = self.target.rollback().await {
                    warn!("Rollback after failed clear failed: {}", rollback_err);
                }
                return Err(as_clear_error(table)(e));
            }
        }

        self.target.commit().await.map_err(as_clear_error("all tables"))?;
        info!("All tables cleared");
        Ok(())
    }
}

/// Wrap a target failure during the clear phase. Lost connections keep their
/// own error kind.
fn as_clear_error(table: &'static str) -> impl Fn(MigrateError) -> MigrateError {
    move |e| match e {
        MigrateError::Connection { .. } => e,
        other => MigrateError::clear(table, other.to_string()),
    }
}
