//! JSON report output.

use super::OutputConfig;
use apicheck_core::{Diagnostic, DiagnosticRegistry};
use serde::Serialize;

/// Machine-readable summary of one run.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub old: &'a str,
    pub new: &'a str,
    pub errors: usize,
    pub warnings: usize,
    pub suppressed: usize,
    pub diagnostics: Vec<&'a Diagnostic>,
}

impl<'a> Report<'a> {
    pub fn new(old: &'a str, new: &'a str, registry: &'a DiagnosticRegistry) -> Self {
        Self {
            old,
            new,
            errors: registry.error_count(),
            warnings: registry.warning_count(),
            suppressed: registry.suppressed(),
            diagnostics: registry.sorted(),
        }
    }
}

/// JSON output formatter
pub struct JsonOutput;

impl JsonOutput {
    /// Pretty-printed unless `config.compact` is set.
    pub fn format<T: Serialize + ?Sized>(data: &T, config: &OutputConfig) -> String {
        if config.compact {
            serde_json::to_string(data).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
        } else {
            serde_json::to_string_pretty(data)
                .unwrap_or_else(|e| format!("{{\n  \"error\": \"{}\"\n}}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::OutputFormat;
    use super::*;
    use apicheck_core::{Category, SeverityTable};

    #[test]
    fn test_report_counts() {
        let mut registry = DiagnosticRegistry::new(SeverityTable::new());
        registry.record(Category::RemovedMethod, "Removed method p.A.m()", None);
        registry.record(Category::ChangedThrows, "widened", None);
        registry.record(Category::AddedClass, "Added class p.B", None);

        let report = Report::new("old.xml", "new.xml", &registry);
        let value: serde_json::Value =
            serde_json::from_str(&JsonOutput::format(&report, &OutputConfig::new(OutputFormat::Json)))
                .unwrap();

        assert_eq!(value["errors"], 1);
        assert_eq!(value["warnings"], 1);
        assert_eq!(value["suppressed"], 1);
        assert_eq!(value["diagnostics"][0]["code"], 8);
        assert_eq!(value["diagnostics"][0]["severity"], "error");
        assert_eq!(value["diagnostics"][0]["category"], "removed_method");
    }

    #[test]
    fn test_format_compact() {
        let config = OutputConfig::new(OutputFormat::Json).compact(true);
        let output = JsonOutput::format(&[1, 2, 3], &config);
        assert_eq!(output, "[1,2,3]");
    }
}
