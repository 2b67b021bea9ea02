//! Plugin error types.

use remoteroster_core::{ConfigError, XmlError};
use thiserror::Error;

/// Errors raised while intercepting stanzas or managing gateways.
#[derive(Error, Debug)]
pub enum RosterError {
    /// A stanza was rejected and must not continue as if translated.
    #[error("Stanza rejected for {domain}: {reason}")]
    Rejected {
        /// Gateway domain whose interceptor rejected the stanza.
        domain: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Roster store failure.
    #[error("Roster store error: {0}")]
    Store(String),

    /// Packet routing failure.
    #[error("Routing error: {0}")]
    Routing(String),

    /// Interceptor pipeline failure.
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Interceptor already registered with the pipeline.
    #[error("Interceptor already registered: {0}")]
    AlreadyRegistered(String),

    /// Interceptor not registered with the pipeline.
    #[error("Interceptor not found: {0}")]
    NotFound(String),

    /// Malformed roster item in a push.
    #[error("Invalid roster item: {0}")]
    InvalidItem(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// XML error.
    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    /// Other error.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl RosterError {
    /// Create a roster store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a routing error.
    pub fn routing(msg: impl Into<String>) -> Self {
        Self::Routing(msg.into())
    }

    /// Create a pipeline error.
    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline(msg.into())
    }

    /// Wrap a processing failure as a rejection of the stanza.
    pub fn rejected(domain: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Rejected {
            domain: domain.into(),
            reason: cause.to_string(),
        }
    }

    /// Whether this error rejects a single stanza rather than failing a
    /// lifecycle operation.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Result type for plugin operations.
pub type Result<T> = std::result::Result<T, RosterError>;
