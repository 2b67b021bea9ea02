//! # remoteroster-core
//!
//! Core types and utilities for RemoteRoster, the bridge between the server
//! roster and external roster gateways.
//!
//! - **Addresses**: [`Jid`] parsing and bare/full handling
//! - **Stanzas**: the [`Stanza`] envelope over a namespace-aware XML tree
//! - **Queries**: namespace-qualified path queries for shape detection
//! - **Roster**: roster item and subscription types
//! - **Configuration**: the property store holding per-gateway enable flags

pub mod config;
pub mod error;
pub mod jid;
pub mod ns;
pub mod paths;
pub mod roster;
pub mod stanza;
pub mod xml;

// Re-exports for convenience
pub use config::{FlagSource, PropertyEvent, PropertyEventKind, PropertyStore};
pub use error::{ConfigError, Error, JidError, QueryError, Result, XmlError};
pub use jid::Jid;
pub use roster::{RosterItem, Subscription};
pub use stanza::{IqType, Stanza, StanzaKind};
pub use xml::{Element, Node};
