//! Output formatting for apicheck reports.
//!
//! Text goes to stderr in the classic `location: severity code: message`
//! shape; json and table go to stdout.

use clap::ValueEnum;
use std::io::IsTerminal;
use std::str::FromStr;

mod json;
mod table;
mod text;

pub use self::json::{JsonOutput, Report};
pub use self::table::TableOutput;
pub use self::text::TextOutput;

/// Report format
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// One diagnostic per line on stderr (default)
    #[default]
    Text,
    /// JSON report on stdout
    Json,
    /// Table on stdout
    Table,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            _ => Err(format!("Unknown output format: '{}'", s)),
        }
    }
}

/// Configuration for output rendering
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub no_color: bool,
    /// Minified JSON
    pub compact: bool,
}

impl OutputConfig {
    #[cfg(test)]
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            no_color: false,
            compact: false,
        }
    }

    /// Detect color support on the stream the format writes to.
    ///
    /// `Some(false)` forces colors off, `Some(true)` forces them on.
    pub fn auto_detect_with_color_override(
        format: OutputFormat,
        color_override: Option<bool>,
    ) -> Self {
        let is_tty = match format {
            OutputFormat::Text => std::io::stderr().is_terminal(),
            OutputFormat::Json | OutputFormat::Table => std::io::stdout().is_terminal(),
        };
        Self {
            format,
            no_color: !color_override.unwrap_or(is_tty),
            compact: false,
        }
    }

    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    pub fn use_colors(&self) -> bool {
        !self.no_color
    }
}
