//! Table output using the `tabled` crate.

use super::OutputConfig;
use apicheck_core::{Category, Diagnostic, SeverityTable};
use tabled::{builder::Builder, settings::style::Style};

/// Table output formatter
pub struct TableOutput;

impl TableOutput {
    pub fn format_diagnostics(diagnostics: &[&Diagnostic], config: &OutputConfig) -> String {
        if diagnostics.is_empty() {
            return "(no diagnostics)".to_string();
        }

        let mut builder = Builder::default();
        builder.push_record(["code", "severity", "location", "message"]);
        for d in diagnostics {
            builder.push_record([
                d.code.to_string(),
                d.severity.to_string(),
                d.location.as_ref().map(|l| l.to_string()).unwrap_or_default(),
                d.message.clone(),
            ]);
        }
        Self::styled(builder, config)
    }

    /// Every category with its default and effective severity.
    pub fn format_categories(table: &SeverityTable, config: &OutputConfig) -> String {
        let mut builder = Builder::default();
        builder.push_record(["code", "key", "default", "severity"]);
        for &category in Category::ALL {
            builder.push_record([
                category.code().to_string(),
                category.key().to_string(),
                category.default_severity().to_string(),
                table.severity(category).to_string(),
            ]);
        }
        Self::styled(builder, config)
    }

    fn styled(builder: Builder, config: &OutputConfig) -> String {
        let mut table = builder.build();
        if config.compact {
            table.with(Style::blank());
        } else {
            table.with(Style::rounded());
        }
        table.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::super::OutputFormat;
    use super::*;
    use apicheck_core::Severity;

    #[test]
    fn test_empty_diagnostics() {
        let config = OutputConfig::new(OutputFormat::Table);
        assert_eq!(
            TableOutput::format_diagnostics(&[], &config),
            "(no diagnostics)"
        );
    }

    #[test]
    fn test_categories_reflect_overrides() {
        let mut table = SeverityTable::new();
        table.set(8, Severity::Hidden).unwrap();
        let output = TableOutput::format_categories(&table, &OutputConfig::new(OutputFormat::Table));

        let row = output
            .lines()
            .find(|l| l.contains("removed_method"))
            .unwrap();
        assert!(row.contains("error"));
        assert!(row.contains("hidden"));
        assert!(output.contains("added_abstract_method"));
    }
}
