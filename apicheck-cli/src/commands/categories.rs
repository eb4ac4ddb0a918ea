//! Categories command - print the diagnostic category table

use apicheck_core::{Category, Severity, SeverityTable};
use serde::Serialize;

use crate::output::{JsonOutput, OutputConfig, OutputFormat, TableOutput};

#[derive(Debug, Serialize)]
struct CategoryRow {
    code: u32,
    key: &'static str,
    default: Severity,
    severity: Severity,
}

pub fn run(table: &SeverityTable, output: &OutputConfig) -> anyhow::Result<()> {
    match output.format {
        OutputFormat::Json => {
            let rows: Vec<CategoryRow> = Category::ALL
                .iter()
                .map(|&category| CategoryRow {
                    code: category.code(),
                    key: category.key(),
                    default: category.default_severity(),
                    severity: table.severity(category),
                })
                .collect();
            println!("{}", JsonOutput::format(&rows, output));
        }
        OutputFormat::Text | OutputFormat::Table => {
            println!("{}", TableOutput::format_categories(table, output));
        }
    }
    Ok(())
}
