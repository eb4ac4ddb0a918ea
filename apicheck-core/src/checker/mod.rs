//! Compatibility checker for two resolved snapshots.
//!
//! `old` is the obligation set: every exported package, class and member it
//! declares must still be present in `new` with a contract at least as
//! permissive. Violations go to the [`DiagnosticRegistry`]; the walk never
//! stops early.
//!
//! # Matching
//!
//! - Classes by qualified name.
//! - Methods and constructors by name plus erased parameter types, so a
//!   renamed type variable is still the same method.
//! - Fields by name.

mod comparator;
pub mod rules;

pub use comparator::CheckStats;

use tracing::debug;

use crate::diagnostics::DiagnosticRegistry;
use crate::model::ApiGraph;

/// Diff `old` against `new`, recording every violation in `registry`.
pub fn check(old: &ApiGraph, new: &ApiGraph, registry: &mut DiagnosticRegistry) -> CheckStats {
    let stats = comparator::Comparator::new(old, new, registry).run();
    debug!(?stats, "compared snapshots");
    stats
}
