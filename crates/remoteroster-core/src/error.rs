//! Error types for RemoteRoster core.

use std::path::PathBuf;
use thiserror::Error;

/// Core result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    #[error("Address error: {0}")]
    Jid(#[from] JidError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON5 parse error: {0}")]
    Json5(String),
}

/// Errors raised while reading stanza XML.
///
/// Stanza content is untrusted, so every variant here is a data error.
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("Malformed XML: {0}")]
    Malformed(String),

    #[error("Empty document")]
    Empty,

    #[error("Unexpected content after root element")]
    TrailingContent,

    #[error("Unbound namespace prefix: {0}")]
    UnboundPrefix(String),

    #[error("Write error: {0}")]
    Write(String),
}

impl XmlError {
    /// Create a malformed-document error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

impl From<quick_xml::Error> for XmlError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Errors in a path query expression.
///
/// Expressions are authored in code, never derived from stanza content, so a
/// `QueryError` is a programming error.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Empty query expression")]
    Empty,

    #[error("Query must start with '/' or '//': {0}")]
    NotAbsolute(String),

    #[error("Unknown namespace prefix '{prefix}' in {expression}")]
    UnknownPrefix { prefix: String, expression: String },

    #[error("Invalid step '{step}' in {expression}")]
    InvalidStep { step: String, expression: String },

    #[error("Invalid predicate '{predicate}' in {expression}")]
    InvalidPredicate {
        predicate: String,
        expression: String,
    },
}

/// Address parsing errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JidError {
    #[error("Empty address")]
    Empty,

    #[error("Address has an empty domain: {0}")]
    EmptyDomain(String),

    #[error("Address has an empty local part: {0}")]
    EmptyNode(String),

    #[error("Address has an empty resource: {0}")]
    EmptyResource(String),

    #[error("Address contains whitespace: {0}")]
    Whitespace(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::Validation("bad key".to_string());
        assert_eq!(err.to_string(), "Validation error: bad key");

        let err: Error = XmlError::malformed("unclosed tag").into();
        assert_eq!(err.to_string(), "XML error: Malformed XML: unclosed tag");
    }
}
