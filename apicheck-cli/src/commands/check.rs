//! Check command - compare two API snapshots and report incompatibilities

use std::path::Path;
use std::time::Instant;

use apicheck_core::{check, load_snapshot_pair, loader, ApiGraph, DiagnosticRegistry, SeverityTable};
use tracing::info;

use crate::error::CliError;
use crate::output::{JsonOutput, OutputConfig, OutputFormat, Report, TableOutput, TextOutput};

/// Path argument naming standard input.
pub const STDIN: &str = "-";

/// Outcome of a completed comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Compatible,
    Incompatible,
}

fn read_snapshot(path: &str) -> apicheck_core::error::Result<ApiGraph> {
    if path == STDIN {
        loader::load_reader(std::io::stdin().lock())
    } else {
        loader::load_path(Path::new(path))
    }
}

pub fn run(
    old_path: &str,
    new_path: &str,
    table: SeverityTable,
    output: &OutputConfig,
) -> anyhow::Result<Verdict> {
    if old_path == STDIN && new_path == STDIN {
        return Err(CliError::Usage(
            "standard input can supply only one of the two snapshots".to_string(),
        )
        .into());
    }

    let start = Instant::now();
    let (old, new) = load_snapshot_pair(|| read_snapshot(old_path), || read_snapshot(new_path));
    let old = old.map_err(|source| CliError::Load {
        side: "old",
        path: old_path.to_string(),
        source,
    })?;
    let new = new.map_err(|source| CliError::Load {
        side: "new",
        path: new_path.to_string(),
        source,
    })?;

    let mut registry = DiagnosticRegistry::new(table);
    let stats = check(&old, &new, &mut registry);

    info!(
        classes = stats.classes,
        members = stats.members,
        errors = registry.error_count(),
        warnings = registry.warning_count(),
        suppressed = registry.suppressed(),
        duration_ms = start.elapsed().as_millis() as u64,
        "check complete"
    );

    let diagnostics = registry.sorted();
    match output.format {
        OutputFormat::Text => {
            for line in TextOutput::format(&diagnostics, output) {
                eprintln!("{}", line);
            }
        }
        OutputFormat::Json => {
            let report = Report::new(old_path, new_path, &registry);
            println!("{}", JsonOutput::format(&report, output));
        }
        OutputFormat::Table => {
            println!("{}", TableOutput::format_diagnostics(&diagnostics, output));
        }
    }

    Ok(if registry.had_error() {
        Verdict::Incompatible
    } else {
        Verdict::Compatible
    })
}
