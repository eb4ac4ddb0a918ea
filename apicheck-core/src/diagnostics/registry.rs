//! Severity configuration and diagnostic accumulation.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use super::category::{Category, Severity};
use crate::error::ConfigError;
use crate::model::SourcePosition;

/// Per-category severity overrides on top of the built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct SeverityTable {
    overrides: HashMap<Category, Severity>,
}

impl SeverityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the severity for the category with `code`.
    pub fn set(&mut self, code: u32, severity: Severity) -> Result<(), ConfigError> {
        let category = Category::from_code(code).ok_or(ConfigError::UnknownCategory(code))?;
        self.overrides.insert(category, severity);
        Ok(())
    }

    pub fn severity(&self, category: Category) -> Severity {
        self.overrides
            .get(&category)
            .copied()
            .unwrap_or_else(|| category.default_severity())
    }

    pub fn is_overridden(&self, category: Category) -> bool {
        self.overrides.contains_key(&category)
    }
}

/// One reported compatibility problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub category: Category,
    pub code: u32,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourcePosition>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(loc) = &self.location {
            write!(f, "{}: ", loc)?;
        }
        write!(f, "{} {}: {}", self.severity, self.code, self.message)
    }
}

/// Collects diagnostics for one run.
///
/// Hidden diagnostics are counted but not kept. The error flag is sticky.
#[derive(Debug, Default)]
pub struct DiagnosticRegistry {
    table: SeverityTable,
    diagnostics: Vec<Diagnostic>,
    suppressed: usize,
    had_error: bool,
}

impl DiagnosticRegistry {
    pub fn new(table: SeverityTable) -> Self {
        Self {
            table,
            ..Self::default()
        }
    }

    pub fn record(
        &mut self,
        category: Category,
        message: impl Into<String>,
        location: Option<&SourcePosition>,
    ) {
        let severity = self.table.severity(category);
        if severity == Severity::Hidden {
            self.suppressed += 1;
            return;
        }
        if severity == Severity::Error {
            self.had_error = true;
        }
        self.diagnostics.push(Diagnostic {
            category,
            code: category.code(),
            severity,
            message: message.into(),
            location: location.cloned(),
        });
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Diagnostics dropped because their category is hidden.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Diagnostics ordered by severity, then location (unknown last), then
    /// recording order.
    pub fn sorted(&self) -> Vec<&Diagnostic> {
        let mut out: Vec<&Diagnostic> = self.diagnostics.iter().collect();
        out.sort_by(|a, b| {
            a.severity
                .cmp(&b.severity)
                .then_with(|| a.location.is_none().cmp(&b.location.is_none()))
                .then_with(|| a.location.cmp(&b.location))
        });
        out
    }

    /// Rendered lines in [`sorted`](Self::sorted) order.
    pub fn emit(&self) -> Vec<String> {
        self.sorted().into_iter().map(|d| d.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(file: &str, line: u32) -> SourcePosition {
        SourcePosition {
            file: file.to_string(),
            line,
        }
    }

    #[test]
    fn test_record_uses_default_severity() {
        let mut reg = DiagnosticRegistry::default();
        reg.record(Category::ChangedThrows, "widened", None);
        assert!(!reg.had_error());
        assert_eq!(reg.warning_count(), 1);

        reg.record(Category::RemovedClass, "gone", None);
        assert!(reg.had_error());
        assert_eq!(reg.error_count(), 1);
    }

    #[test]
    fn test_hidden_is_suppressed() {
        let mut reg = DiagnosticRegistry::default();
        reg.record(Category::AddedClass, "new class", None);
        assert!(reg.emit().is_empty());
        assert_eq!(reg.suppressed(), 1);
    }

    #[test]
    fn test_overrides() {
        let mut table = SeverityTable::new();
        table.set(8, Severity::Hidden).unwrap();
        table.set(3, Severity::Warning).unwrap();
        assert_eq!(table.set(99, Severity::Error), Err(ConfigError::UnknownCategory(99)));

        let mut reg = DiagnosticRegistry::new(table);
        reg.record(Category::RemovedMethod, "gone", None);
        reg.record(Category::AddedMethod, "new", None);
        assert!(!reg.had_error());
        assert_eq!(reg.emit(), vec!["warning 3: new".to_string()]);
    }

    #[test]
    fn test_error_flag_is_sticky() {
        let mut table = SeverityTable::new();
        table.set(3, Severity::Error).unwrap();
        let mut reg = DiagnosticRegistry::new(table);
        reg.record(Category::AddedMethod, "first", None);
        reg.record(Category::ChangedThrows, "later", None);
        assert!(reg.had_error());
    }

    #[test]
    fn test_emit_order() {
        let mut reg = DiagnosticRegistry::default();
        reg.record(Category::ChangedThrows, "w1", Some(&pos("B.java", 1)));
        reg.record(Category::RemovedField, "e-nowhere", None);
        reg.record(Category::RemovedMethod, "e2", Some(&pos("B.java", 9)));
        reg.record(Category::RemovedClass, "e1", Some(&pos("A.java", 5)));
        reg.record(Category::RemovedMethod, "e3", Some(&pos("B.java", 9)));

        assert_eq!(
            reg.emit(),
            vec![
                "A.java:5: error 7: e1",
                "B.java:9: error 8: e2",
                "B.java:9: error 8: e3",
                "error 9: e-nowhere",
                "B.java:1: warning 20: w1",
            ]
        );
    }
}
