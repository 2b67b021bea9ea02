//! Protocol addresses.

use crate::error::JidError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A protocol address of the form `node@domain/resource`.
///
/// Only structural checks are applied; no stringprep normalization beyond
/// lowercasing the domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Jid {
    node: Option<String>,
    domain: String,
    resource: Option<String>,
}

impl Jid {
    /// Parse an address.
    pub fn parse(input: &str) -> Result<Self, JidError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(JidError::Empty);
        }
        if input.chars().any(char::is_whitespace) {
            return Err(JidError::Whitespace(input.to_string()));
        }

        // The resource may itself contain '@' and '/', so split it off first.
        let (bare, resource) = match input.split_once('/') {
            Some((bare, resource)) => {
                if resource.is_empty() {
                    return Err(JidError::EmptyResource(input.to_string()));
                }
                (bare, Some(resource.to_string()))
            }
            None => (input, None),
        };

        let (node, domain) = match bare.split_once('@') {
            Some((node, domain)) => {
                if node.is_empty() {
                    return Err(JidError::EmptyNode(input.to_string()));
                }
                (Some(node.to_string()), domain)
            }
            None => (None, bare),
        };

        if domain.is_empty() {
            return Err(JidError::EmptyDomain(input.to_string()));
        }

        Ok(Self {
            node,
            domain: domain.to_lowercase(),
            resource,
        })
    }

    /// Create a domain-only address.
    pub fn domain_only(domain: impl Into<String>) -> Self {
        Self {
            node: None,
            domain: domain.into().to_lowercase(),
            resource: None,
        }
    }

    /// Local part, if any.
    pub fn node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    /// Domain part.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Resource part, if any.
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// The address without its resource.
    pub fn bare(&self) -> Jid {
        Self {
            node: self.node.clone(),
            domain: self.domain.clone(),
            resource: None,
        }
    }

    /// Whether this address has no resource.
    pub fn is_bare(&self) -> bool {
        self.resource.is_none()
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(node) = &self.node {
            write!(f, "{}@", node)?;
        }
        write!(f, "{}", self.domain)?;
        if let Some(resource) = &self.resource {
            write!(f, "/{}", resource)?;
        }
        Ok(())
    }
}

impl FromStr for Jid {
    type Err = JidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Jid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Jid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
