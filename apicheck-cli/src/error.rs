//! Failures that end a run before a verdict, and their exit statuses.

use crate::config::ConfigFileError;
use apicheck_core::{ConfigError, LoadError};
use thiserror::Error;

/// No Error-severity diagnostics.
pub const EXIT_OK: u8 = 0;
/// At least one Error-severity diagnostic.
pub const EXIT_DIAGNOSTICS: u8 = 1;
/// Bad command line or configuration. Shared with clap's usage status.
pub const EXIT_CONFIG: u8 = 2;
/// A snapshot could not be read or parsed.
pub const EXIT_LOAD: u8 = 3;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    ConfigFile(#[from] ConfigFileError),

    #[error(transparent)]
    Category(#[from] ConfigError),

    #[error("{0}")]
    Usage(String),

    #[error("failed to load {side} snapshot '{path}': {source}")]
    Load {
        side: &'static str,
        path: String,
        #[source]
        source: LoadError,
    },
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::ConfigFile(_) | CliError::Category(_) | CliError::Usage(_) => EXIT_CONFIG,
            CliError::Load { .. } => EXIT_LOAD,
        }
    }
}
