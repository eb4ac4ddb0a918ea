//! Line-oriented diagnostic output.

use super::OutputConfig;
use apicheck_core::{Diagnostic, Severity};
use colored::Colorize;

/// Text output formatter
pub struct TextOutput;

impl TextOutput {
    /// `location: severity code: message`, with the location dropped when
    /// unknown. Identical to the diagnostic's `Display` when colors are off.
    pub fn format_line(diagnostic: &Diagnostic, config: &OutputConfig) -> String {
        if !config.use_colors() {
            return diagnostic.to_string();
        }

        let severity = match diagnostic.severity {
            Severity::Error => diagnostic.severity.as_str().red().bold(),
            Severity::Warning => diagnostic.severity.as_str().yellow().bold(),
            Severity::Hidden => diagnostic.severity.as_str().dimmed(),
        };
        let location = diagnostic
            .location
            .as_ref()
            .map(|loc| format!("{}: ", loc.to_string().bold()))
            .unwrap_or_default();
        format!(
            "{}{} {}: {}",
            location, severity, diagnostic.code, diagnostic.message
        )
    }

    pub fn format(diagnostics: &[&Diagnostic], config: &OutputConfig) -> Vec<String> {
        diagnostics
            .iter()
            .map(|d| Self::format_line(d, config))
            .collect()
    }
}
