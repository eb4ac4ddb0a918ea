//! Error types for snapshot loading and type parsing.

use thiserror::Error;

/// Errors raised while parsing a single type expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeParseError {
    /// The expression was empty or only whitespace.
    #[error("empty type expression")]
    Empty,

    /// Angle or square brackets do not pair up.
    #[error("unbalanced brackets in type expression '{0}'")]
    Unbalanced(String),

    /// A generic argument list contained an empty slot, e.g. `Map<K,>`.
    #[error("empty type argument in '{0}'")]
    EmptyArgument(String),

    /// `extends` or `super` with nothing after it.
    #[error("dangling bound clause in '{0}'")]
    DanglingBound(String),
}

/// Errors that abort loading a snapshot.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Malformed XML.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed attribute syntax.
    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    /// Failure reading the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required attribute is absent.
    #[error("<{element}> at byte {offset} is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
        offset: usize,
    },

    /// An element appeared outside the parent it must be nested in.
    #[error("<{element}> at byte {offset} must be nested directly inside <{parent}>")]
    Misplaced {
        element: String,
        parent: &'static str,
        offset: usize,
    },

    /// A type expression in an attribute could not be parsed.
    #[error("<{element}> at byte {offset}: {source}")]
    Type {
        element: String,
        offset: usize,
        #[source]
        source: TypeParseError,
    },

    /// The same class was declared twice.
    #[error("duplicate class declaration '{0}'")]
    DuplicateClass(String),

    /// The document ended while an element was still open.
    #[error("unexpected end of document inside <{0}>")]
    Truncated(String),
}

/// Invalid severity configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No diagnostic category has this code.
    #[error("unknown diagnostic category code {0}")]
    UnknownCategory(u32),
}

/// Result alias for snapshot loading.
pub type Result<T> = std::result::Result<T, LoadError>;
