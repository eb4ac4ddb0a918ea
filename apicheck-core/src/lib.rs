//! apicheck core - API snapshot model and compatibility engine.
//!
//! Loads two XML descriptions of a Java library's public surface, links the
//! name references inside each, and reports every change in the new snapshot
//! that breaks clients of the old one.
//!
//! # Features
//!
//! - **Type signatures**: nested generics, arrays, varargs, wildcards and
//!   F-bounded type variables
//! - **Streaming loader**: one forward pass over the XML with quick-xml
//! - **Two-phase linking**: forward references resolve after loading
//! - **Categorized diagnostics**: stable numeric codes with configurable
//!   severities
//! - **Parallel loading**: both snapshots load on separate Rayon tasks
//!
//! # Usage
//!
//! ```no_run
//! use apicheck_core::{check, load_snapshot_pair, loader, DiagnosticRegistry, SeverityTable};
//! use std::path::Path;
//!
//! let (old, new) = load_snapshot_pair(
//!     || loader::load_path(Path::new("old.xml")),
//!     || loader::load_path(Path::new("new.xml")),
//! );
//! let (old, new) = (old?, new?);
//!
//! let mut registry = DiagnosticRegistry::new(SeverityTable::new());
//! check(&old, &new, &mut registry);
//! for line in registry.emit() {
//!     eprintln!("{}", line);
//! }
//! # Ok::<(), apicheck_core::LoadError>(())
//! ```

pub mod checker;
pub mod diagnostics;
pub mod error;
pub mod hierarchy;
pub mod loader;
pub mod model;
pub mod resolver;
pub mod signature;

pub use checker::{check, CheckStats};
pub use diagnostics::{Category, Diagnostic, DiagnosticRegistry, Severity, SeverityTable};
pub use error::{ConfigError, LoadError, TypeParseError};
pub use model::ApiGraph;
pub use resolver::resolve;
pub use signature::TypeSignature;

/// Load and resolve two snapshots on separate Rayon tasks.
///
/// Both sides always run to completion; the caller decides which error to
/// report first. Equivalent to calling each loader and [`resolve`] in turn.
pub fn load_snapshot_pair<F, G>(old: F, new: G) -> (error::Result<ApiGraph>, error::Result<ApiGraph>)
where
    F: FnOnce() -> error::Result<ApiGraph> + Send,
    G: FnOnce() -> error::Result<ApiGraph> + Send,
{
    rayon::join(|| load_resolved(old), || load_resolved(new))
}

fn load_resolved<F>(load: F) -> error::Result<ApiGraph>
where
    F: FnOnce() -> error::Result<ApiGraph>,
{
    let mut graph = load()?;
    resolve(&mut graph);
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<api><package name="p">
        <class name="B" extends="p.A" visibility="public"/>
        <class name="A" visibility="public"/>
    </package></api>"#;

    #[test]
    fn test_parallel_load_matches_sequential() {
        let (old, new) = load_snapshot_pair(|| loader::load_str(DOC), || loader::load_str(DOC));
        let old = old.unwrap();

        let mut sequential = loader::load_str(DOC).unwrap();
        resolve(&mut sequential);

        for (id, class) in sequential.classes() {
            assert_eq!(class, old.class(id));
        }
        assert!(new.is_ok());
    }

    #[test]
    fn test_pair_reports_each_side() {
        let (old, new) = load_snapshot_pair(
            || loader::load_str("<api><package>"),
            || loader::load_str(DOC),
        );
        assert!(old.is_err());
        assert!(new.is_ok());
    }
}
