//! Diagnostic categories and severities.

use serde::Serialize;
use std::fmt;

/// How a recorded diagnostic affects the run.
///
/// Ordered so that sorting puts errors first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Hidden,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Hidden => "hidden",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! categories {
    ($($variant:ident = $code:literal, $key:literal, $severity:ident;)*) => {
        /// Kind of compatibility change. Codes are stable and used on the
        /// command line.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Category {
            $($variant,)*
        }

        impl Category {
            pub const ALL: &'static [Category] = &[$(Category::$variant,)*];

            pub fn code(self) -> u32 {
                match self {
                    $(Category::$variant => $code,)*
                }
            }

            pub fn key(self) -> &'static str {
                match self {
                    $(Category::$variant => $key,)*
                }
            }

            pub fn default_severity(self) -> Severity {
                match self {
                    $(Category::$variant => Severity::$severity,)*
                }
            }

            pub fn from_code(code: u32) -> Option<Category> {
                match code {
                    $($code => Some(Category::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

categories! {
    AddedPackage = 1, "added_package", Hidden;
    AddedClass = 2, "added_class", Hidden;
    AddedMethod = 3, "added_method", Hidden;
    AddedField = 4, "added_field", Hidden;
    AddedInterface = 5, "added_interface", Hidden;
    RemovedPackage = 6, "removed_package", Error;
    RemovedClass = 7, "removed_class", Error;
    RemovedMethod = 8, "removed_method", Error;
    RemovedField = 9, "removed_field", Error;
    RemovedInterface = 10, "removed_interface", Error;
    ChangedStatic = 11, "changed_static", Error;
    ChangedFinal = 12, "changed_final", Error;
    ChangedTransient = 13, "changed_transient", Warning;
    ChangedVolatile = 14, "changed_volatile", Warning;
    ChangedType = 15, "changed_type", Error;
    ChangedValue = 16, "changed_value", Error;
    ChangedSuperclass = 17, "changed_superclass", Error;
    ChangedScope = 18, "changed_scope", Error;
    ChangedAbstract = 19, "changed_abstract", Error;
    ChangedThrows = 20, "changed_throws", Warning;
    ChangedNative = 21, "changed_native", Hidden;
    ChangedClass = 22, "changed_class", Error;
    ChangedDeprecated = 23, "changed_deprecated", Hidden;
    ChangedSynchronized = 24, "changed_synchronized", Hidden;
    AddedFinalUninstantiable = 25, "added_final_uninstantiable", Warning;
    RemovedFinal = 26, "removed_final", Hidden;
    AddedAbstractMethod = 27, "added_abstract_method", Error;
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
