//! Diagnostic categories, severity configuration and the per-run registry.

mod category;
mod registry;

pub use category::{Category, Severity};
pub use registry::{Diagnostic, DiagnosticRegistry, SeverityTable};
