//! Confirmation prompt shown before a run touches the target.

use dialoguer::Input;
use reforge_migrate::{Config, MigrateError};
use std::io::{self, BufRead, IsTerminal, Write};

const CONFIRM_WORD: &str = "yes";

/// Describe the run on stderr and ask the operator to type `yes`.
///
/// Reads a plain line when stdin is not a terminal so the answer can be piped.
pub fn confirm_migration(config: &Config) -> Result<bool, MigrateError> {
    eprintln!();
    eprintln!("WARNING: This will migrate data from SQLite to PostgreSQL");
    eprintln!("  Source: {}", config.source.path.display());
    eprintln!("  Target: {}", config.target.redacted_url());
    if config.migration.clear_target {
        eprintln!(
            "  All existing rows in schema '{}' will be DELETED first.",
            config.target.schema
        );
    } else {
        eprintln!("  Existing target rows are kept; conflicting rows will be skipped.");
    }
    eprintln!();

    let answer = if io::stdin().is_terminal() {
        Input::<String>::new()
            .with_prompt("Type 'yes' to continue")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| MigrateError::Io(io::Error::other(e.to_string())))?
    } else {
        eprint!("Type 'yes' to continue: ");
        io::stderr().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        line
    };

    Ok(is_confirmed(&answer))
}

fn is_confirmed(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case(CONFIRM_WORD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_yes_confirms() {
        assert!(is_confirmed("yes"));
        assert!(is_confirmed(" YES\n"));
        assert!(!is_confirmed("y"));
        assert!(!is_confirmed(""));
        assert!(!is_confirmed("no"));
    }
}
