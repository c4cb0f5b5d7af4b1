//! Configuration validation.

use super::Config;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.path.as_os_str().is_empty() {
        return Err(MigrateError::Config("source.path is required".into()));
    }

    // Target validation
    if config.target.url.trim().is_empty() {
        return Err(MigrateError::Config("target.url is required".into()));
    }
    if let Err(e) = config.target.url.parse::<tokio_postgres::Config>() {
        return Err(MigrateError::Config(format!(
            "target.url is not a valid PostgreSQL connection string: {}",
            e
        )));
    }
    if !is_plain_identifier(&config.target.schema) {
        return Err(MigrateError::Config(format!(
            "target.schema must be a plain identifier, got '{}'",
            config.target.schema
        )));
    }

    Ok(())
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
