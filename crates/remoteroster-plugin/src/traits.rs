//! Collaborator interfaces supplied by the host server.
//!
//! The host owns roster storage, stanza routing, component sessions and the
//! interception pipeline. These traits are the only way this crate reaches
//! them. Implementations may block the calling task; nothing here adds
//! timeouts or retries.

use crate::Result;
use async_trait::async_trait;
use remoteroster_core::{Jid, RosterItem, Stanza};
use std::sync::Arc;

/// Roster storage.
#[async_trait]
pub trait RosterStore: Send + Sync {
    /// All items of `owner`'s roster, in stored order.
    async fn get_roster_items(&self, owner: &Jid) -> Result<Vec<RosterItem>>;

    /// Create the item, or update name, groups and subscription of an
    /// existing item with the same address.
    async fn upsert_item(&self, owner: &Jid, item: RosterItem) -> Result<()>;

    /// Remove the item with the given address. Removing a missing item is
    /// not an error.
    async fn remove_item(&self, owner: &Jid, jid: &Jid) -> Result<()>;
}

/// Outbound stanza delivery.
#[async_trait]
pub trait PacketRouter: Send + Sync {
    /// Route a stanza to its recipient.
    async fn route(&self, stanza: Stanza) -> Result<()>;
}

/// Lookup of live external component sessions.
pub trait ComponentSessions: Send + Sync {
    /// The domain a live component session was registered under, or `None`
    /// when no session exists for `address`.
    fn component_domain(&self, address: &Jid) -> Option<Jid>;
}

/// Session lookup that treats every address as its own component domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectSessions;

impl ComponentSessions for DirectSessions {
    fn component_domain(&self, address: &Jid) -> Option<Jid> {
        Some(Jid::domain_only(address.domain()))
    }
}

/// Delivery metadata the pipeline attaches to each stanza.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketContext {
    /// Stanza is flowing into the server.
    pub incoming: bool,
    /// Stanza was already processed by the server.
    pub processed: bool,
}

impl PacketContext {
    /// Inbound, not yet processed.
    pub fn inbound() -> Self {
        Self {
            incoming: true,
            processed: false,
        }
    }

    /// Outbound, not yet processed.
    pub fn outbound() -> Self {
        Self {
            incoming: false,
            processed: false,
        }
    }

    /// Mark as already processed.
    pub fn processed(mut self) -> Self {
        self.processed = true;
        self
    }

    /// Only inbound stanzas not yet processed are eligible for interception.
    pub fn is_interceptable(&self) -> bool {
        self.incoming && !self.processed
    }
}

/// A handler invoked for every stanza passing through the pipeline.
///
/// The interceptor may mutate the stanza in place; the pipeline continues
/// routing the mutated stanza. Returning an error rejects the stanza.
#[async_trait]
pub trait PacketInterceptor: Send + Sync {
    /// Unique interceptor name.
    fn name(&self) -> &str;

    /// Inspect, mutate or reject a stanza.
    async fn intercept(&self, stanza: &mut Stanza, ctx: PacketContext) -> Result<()>;
}

/// The host's interception pipeline.
#[async_trait]
pub trait InterceptorPipeline: Send + Sync {
    /// Register an interceptor. Fails if one with the same name exists.
    async fn add_interceptor(&self, interceptor: Arc<dyn PacketInterceptor>) -> Result<()>;

    /// Remove an interceptor by name. Fails if it is not registered.
    async fn remove_interceptor(&self, name: &str) -> Result<()>;
}
