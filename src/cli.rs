//! CLI command implementations for Deathgame.

pub(crate) mod run;
pub(crate) mod tournament;
pub(crate) mod validate;
pub(crate) mod watch;

mod output;

use clap::ValueEnum;
use deathgame::config::Config;
use deathgame::error::{ConfigError, LoadError, SetupError};
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

/// Output format for the `run` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output with the final board.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Output format for the `tournament` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum TournamentFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<SetupError> for CliError {
    fn from(e: SetupError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<LoadError> for CliError {
    fn from(e: LoadError) -> Self {
        Self::new(e.to_string())
    }
}

/// Load `path`, then overlay each of `overrides` in order.
pub(crate) fn load_config(path: &Path, overrides: &[PathBuf]) -> Result<Config, CliError> {
    let mut config = Config::from_file(path)?;
    for overlay in overrides {
        config.merge_file(overlay)?;
    }
    Ok(config)
}
