//! apicheck - Java API compatibility checker
//!
//! Compares two XML descriptions of a library's public API and reports the
//! changes that break existing clients.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use apicheck_core::{Severity, SeverityTable};
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod error;
mod output;

use commands::check::Verdict;
use config::ApicheckConfig;
use error::{CliError, EXIT_CONFIG, EXIT_DIAGNOSTICS, EXIT_OK};
use output::{OutputConfig, OutputFormat};

/// Check a new API snapshot for compatibility with an old one.
#[derive(Parser)]
#[command(name = "apicheck")]
#[command(author, version)]
#[command(about = "Check a new API snapshot for compatibility with an old one")]
#[command(after_help = "Exit status:
  0  no error-severity diagnostics
  1  at least one error-severity diagnostic
  2  bad arguments or configuration
  3  a snapshot could not be read or parsed

Examples:
  apicheck old.xml new.xml
  apicheck -hide 23 -warning 7 old.xml new.xml
  generate-api | apicheck old.xml -")]
pub struct Cli {
    /// Previously released API snapshot ('-' for stdin)
    #[arg(required_unless_present = "list_categories")]
    old: Option<String>,

    /// Candidate API snapshot ('-' for stdin)
    #[arg(required_unless_present = "list_categories")]
    new: Option<String>,

    /// Report category CODE as an error (repeatable)
    #[arg(long, value_name = "CODE")]
    error: Vec<u32>,

    /// Report category CODE as a warning (repeatable)
    #[arg(long, value_name = "CODE")]
    warning: Vec<u32>,

    /// Suppress category CODE (repeatable)
    #[arg(long, value_name = "CODE")]
    hide: Vec<u32>,

    /// Report format (overrides config default)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Configuration file (default: ./.apicheckrc.toml if present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minified JSON, borderless tables
    #[arg(long)]
    compact: bool,

    /// Print the diagnostic categories and their severities, then exit
    #[arg(long)]
    list_categories: bool,

    /// Enable verbose output (debug logging)
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Single-dash spellings accepted for compatibility with existing scripts.
const LEGACY_FLAGS: &[(&str, &str)] = &[
    ("-error", "--error"),
    ("-warning", "--warning"),
    ("-hide", "--hide"),
];

/// Rewrite `-error 8` style flags to their double-dash form. Arguments after
/// a `--` terminator are left alone.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut terminated = false;
    args.into_iter()
        .map(|arg| {
            if terminated {
                return arg;
            }
            if arg == "--" {
                terminated = true;
                return arg;
            }
            LEGACY_FLAGS
                .iter()
                .find(|(legacy, _)| arg == *legacy)
                .map(|(_, modern)| OsString::from(*modern))
                .unwrap_or(arg)
        })
        .collect()
}

/// Severity flags in command-line order, so the last mention of a code wins.
fn severity_overrides(matches: &ArgMatches) -> Vec<(u32, Severity)> {
    let mut overrides: Vec<(usize, u32, Severity)> = Vec::new();
    for (id, severity) in [
        ("error", Severity::Error),
        ("warning", Severity::Warning),
        ("hide", Severity::Hidden),
    ] {
        if let (Some(indices), Some(values)) =
            (matches.indices_of(id), matches.get_many::<u32>(id))
        {
            overrides.extend(indices.zip(values).map(|(i, &code)| (i, code, severity)));
        }
    }
    overrides.sort_by_key(|&(index, _, _)| index);
    overrides
        .into_iter()
        .map(|(_, code, severity)| (code, severity))
        .collect()
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

fn run(cli: Cli, overrides: Vec<(u32, Severity)>) -> anyhow::Result<Verdict> {
    let config = match &cli.config {
        Some(path) => ApicheckConfig::load_explicit(path).map_err(CliError::from)?,
        None => ApicheckConfig::load(Path::new(".")),
    };

    // Config file first, then flags in the order given.
    let mut table = SeverityTable::new();
    config.apply_severities(&mut table).map_err(CliError::from)?;
    for (code, severity) in overrides {
        table.set(code, severity).map_err(CliError::from)?;
    }

    // Resolve output format: CLI flag > config default > Text
    let format = cli.format.unwrap_or_else(|| {
        config
            .default_format()
            .and_then(|f| {
                f.parse()
                    .map_err(|e| tracing::warn!("ignoring configured format: {}", e))
                    .ok()
            })
            .unwrap_or_default()
    });
    let color = if cli.no_color {
        Some(false)
    } else {
        config.use_color()
    };
    let output =
        OutputConfig::auto_detect_with_color_override(format, color).compact(cli.compact);
    colored::control::set_override(output.use_colors());

    if cli.list_categories {
        commands::categories::run(&table, &output)?;
        return Ok(Verdict::Compatible);
    }

    match (cli.old.as_deref(), cli.new.as_deref()) {
        (Some(old), Some(new)) => commands::check::run(old, new, table, &output),
        _ => Err(CliError::Usage("both <OLD> and <NEW> snapshots are required".to_string()).into()),
    }
}

fn main() -> ExitCode {
    let args = normalize_args(std::env::args_os());
    let matches = match Cli::command().try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(e.exit_code() as u8);
        }
    };
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(e.exit_code() as u8);
        }
    };

    setup_logging(cli.verbose, cli.quiet);

    let overrides = severity_overrides(&matches);
    match run(cli, overrides) {
        Ok(Verdict::Compatible) => ExitCode::from(EXIT_OK),
        Ok(Verdict::Incompatible) => ExitCode::from(EXIT_DIAGNOSTICS),
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            let code = err
                .downcast_ref::<CliError>()
                .map(CliError::exit_code)
                .unwrap_or(EXIT_CONFIG);
            ExitCode::from(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_normalize_legacy_flags() {
        let args = normalize_args(os(&["apicheck", "-error", "8", "-hide", "3", "a.xml", "--", "-warning"]));
        assert_eq!(
            args,
            os(&["apicheck", "--error", "8", "--hide", "3", "a.xml", "--", "-warning"])
        );
    }

    #[test]
    fn test_overrides_keep_command_line_order() {
        let matches = Cli::command()
            .try_get_matches_from(os(&[
                "apicheck", "--hide", "8", "--error", "3", "--error", "8", "old.xml", "new.xml",
            ]))
            .unwrap();
        assert_eq!(
            severity_overrides(&matches),
            vec![(8, Severity::Hidden), (3, Severity::Error), (8, Severity::Error)]
        );
    }

    #[test]
    fn test_non_numeric_code_is_usage_error() {
        let err = Cli::command()
            .try_get_matches_from(os(&["apicheck", "--error", "abc", "old.xml", "new.xml"]))
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_list_categories_needs_no_snapshots() {
        let matches = Cli::command()
            .try_get_matches_from(os(&["apicheck", "--list-categories"]))
            .unwrap();
        let cli = Cli::from_arg_matches(&matches).unwrap();
        assert!(cli.list_categories);
        assert!(cli.old.is_none());
    }
}
