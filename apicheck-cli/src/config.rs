//! Configuration loading from `.apicheckrc.toml`.
//!
//! The file is optional. When present in the working directory it supplies
//! severity overrides and output preferences; command-line flags win over it.
//!
//! # Example Configuration
//!
//! ```toml
//! [severity]
//! error = [20]
//! warning = [7]
//! hide = [23, 24]
//!
//! [output]
//! format = "json"
//! color = false
//! ```

use apicheck_core::{ConfigError, Severity, SeverityTable};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = ".apicheckrc.toml";

/// Failure to use an explicitly requested configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Root configuration structure.
#[derive(Debug, Deserialize, Default)]
pub struct ApicheckConfig {
    /// Category severity overrides.
    #[serde(default)]
    pub severity: SeveritySection,

    /// Output formatting preferences.
    #[serde(default)]
    pub output: OutputSettings,
}

/// Category codes forced to a severity. Applied in the order error, warning,
/// hide, so a code listed twice ends up with the later one.
#[derive(Debug, Deserialize, Default)]
pub struct SeveritySection {
    #[serde(default)]
    pub error: Vec<u32>,

    #[serde(default)]
    pub warning: Vec<u32>,

    #[serde(default)]
    pub hide: Vec<u32>,
}

/// Output preferences. `--format` and `--no-color` override these.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Valid values: `text`, `json`, `table`
    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub color: Option<bool>,
}

impl ApicheckConfig {
    /// Load `.apicheckrc.toml` from `root`.
    ///
    /// Returns defaults when the file is missing. Read and parse errors are
    /// logged as warnings and also fall back to defaults.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load_explicit(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}", e);
                Self::default()
            }
        }
    }

    /// Load a file named with `--config`. Any failure is fatal to the caller.
    pub fn load_explicit(path: &Path) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigFileError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the configured overrides into `table`.
    pub fn apply_severities(&self, table: &mut SeverityTable) -> Result<(), ConfigError> {
        let sections = [
            (&self.severity.error, Severity::Error),
            (&self.severity.warning, Severity::Warning),
            (&self.severity.hide, Severity::Hidden),
        ];
        for (codes, severity) in sections {
            for &code in codes {
                table.set(code, severity)?;
            }
        }
        Ok(())
    }

    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }
}
