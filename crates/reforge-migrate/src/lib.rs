//! # reforge-migrate
//!
//! Migrates the Reforge dataset from SQLite (integer primary keys) to
//! PostgreSQL (UUID primary keys), rewriting every foreign key on the way.
//!
//! - **Dependency-ordered steps**: ten tables, parents before children
//! - **Id remapping**: each legacy id receives one fresh UUID per run
//! - **Row isolation**: a row with an unresolved reference or a rejected
//!   insert is dropped and logged; the rest of the table still migrates
//! - **Full replace**: the target is cleared first unless told otherwise
//!
//! ## Example
//!
//! ```rust,no_run
//! use reforge_migrate::{Config, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), reforge_migrate::MigrateError> {
//!     let config = Config::from_paths("reforge.db", "postgresql://localhost/reforge")?;
//!     let orchestrator = Orchestrator::connect(config).await?;
//!     let result = orchestrator.run().await?;
//!     println!("{}", result.stats.render_summary(10));
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod mapper;
pub mod orchestrator;
pub mod source;
pub mod stats;
pub mod target;
pub mod transfer;
pub mod transform;
pub mod value;

// Re-exports for convenient access
pub use catalog::{TableSpec, TABLES};
pub use config::{Config, MigrationConfig, SourceConfig, TargetConfig};
pub use error::{MigrateError, Result, RowError};
pub use mapper::{EntityKind, IdMapper};
pub use orchestrator::{MigrationResult, MigrationRun, Orchestrator};
pub use source::{SourceStore, SqliteSource};
pub use stats::MigrationStats;
pub use target::{InsertOutcome, PgTarget, TargetStore};
pub use transfer::{migrate_table, TableReport};
pub use value::{RowKey, SourceRow, SourceValue, SqlValue, TargetRow};
