//! reforge-migrate CLI - Move the Reforge dataset from SQLite to PostgreSQL.

mod confirm;

use clap::Parser;
use reforge_migrate::{Config, MigrateError, Orchestrator};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "reforge-migrate")]
#[command(about = "Migrate Reforge data from SQLite to PostgreSQL, remapping integer ids to UUIDs")]
#[command(version)]
struct Cli {
    /// Path to the source SQLite database
    #[arg(long)]
    sqlite_db: Option<PathBuf>,

    /// Target PostgreSQL connection string
    #[arg(long)]
    postgres_url: Option<String>,

    /// Path to YAML configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override target schema
    #[arg(long)]
    target_schema: Option<String>,

    /// Keep existing target rows instead of clearing every table first
    #[arg(long)]
    no_clear: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,

    /// Number of row errors listed in the summary [default: 10]
    #[arg(long)]
    max_errors: Option<usize>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let config = build_config(&cli)?;
    let max_errors = config.migration.max_errors_shown;

    if !cli.yes && !confirm::confirm_migration(&config)? {
        println!("Migration cancelled");
        return Ok(());
    }

    info!(
        "Migrating {} -> {}",
        config.source.path.display(),
        config.target.redacted_url()
    );

    let orchestrator = Orchestrator::connect(config).await?;
    let result = orchestrator.run().await?;

    if cli.output_json {
        println!("{}", result.to_json()?);
    } else {
        println!("{}", result.stats.render_summary(max_errors));
        println!("  Run ID: {}", result.run_id);
        println!("  Duration: {:.2}s", result.duration_seconds);
    }

    Ok(())
}

/// Merge the optional config file with command-line overrides, then validate
/// the result once.
fn build_config(cli: &Cli) -> Result<Config, MigrateError> {
    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::read(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => {
            let (Some(db), Some(url)) = (&cli.sqlite_db, &cli.postgres_url) else {
                return Err(MigrateError::Config(
                    "--sqlite-db and --postgres-url are required unless --config is given"
                        .to_string(),
                ));
            };
            Config::from_paths(db.clone(), url.clone())?
        }
    };

    if let Some(db) = &cli.sqlite_db {
        config.source.path = db.clone();
    }
    if let Some(url) = &cli.postgres_url {
        config.target.url = url.clone();
    }
    if let Some(schema) = &cli.target_schema {
        config.target.schema = schema.clone();
    }
    if cli.no_clear {
        config.migration.clear_target = false;
    }
    if let Some(n) = cli.max_errors {
        config.migration.max_errors_shown = n;
    }

    config.validate()?;
    Ok(config)
}

/// Log to stderr so stdout carries only the summary or JSON result.
fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
