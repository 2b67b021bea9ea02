//! Roster translation processors.
//!
//! A processor translates one stanza shape between the gateway's wire form
//! and the server roster. The variant is fixed when an interceptor is built;
//! there is no name-keyed lookup at dispatch time.

use crate::error::RosterError;
use crate::traits::{PacketRouter, RosterStore};
use crate::Result;
use once_cell::sync::Lazy;
use remoteroster_core::xml::{Query, ROSTER_NAMESPACES};
use remoteroster_core::{ns, Element, Jid, RosterItem, Stanza};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Roster items anywhere in a stanza.
pub(crate) static ROSTER_ITEM: Lazy<Query> = Lazy::new(|| {
    Query::compile(&ROSTER_NAMESPACES, "//roster:item").expect("invalid roster item query")
});

/// Which translation a stanza needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorKind {
    /// Answer a roster request from the gateway.
    SendRoster,
    /// Apply a roster push from the gateway.
    ReceiveChanges,
}

impl ProcessorKind {
    /// Stable name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SendRoster => "send-roster",
            Self::ReceiveChanges => "receive-changes",
        }
    }
}

impl fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner of the roster a stanza refers to: the bare recipient.
fn roster_owner(stanza: &Stanza) -> Result<Jid> {
    stanza
        .recipient()
        .map(|jid| jid.bare())
        .ok_or_else(|| RosterError::InvalidItem("stanza has no recipient".to_string()))
}

/// Answers a gateway's roster request with the owner's contacts on that
/// gateway.
pub struct SendRosterProcessor {
    domain: Jid,
    store: Arc<dyn RosterStore>,
    router: Arc<dyn PacketRouter>,
}

impl SendRosterProcessor {
    /// Create a processor bound to a gateway domain.
    pub fn new(domain: Jid, store: Arc<dyn RosterStore>, router: Arc<dyn PacketRouter>) -> Self {
        Self {
            domain,
            store,
            router,
        }
    }

    /// Build the result stanza for `request` without routing it.
    pub async fn build_response(&self, request: &Stanza) -> Result<Stanza> {
        let owner = roster_owner(request)?;
        let items = self.store.get_roster_items(&owner).await?;

        let mut query = Element::new("query", ns::ROSTER);
        let mut count = 0usize;
        for item in items
            .iter()
            .filter(|item| item.jid.domain() == self.domain.domain())
        {
            query.append_child(item.to_element());
            count += 1;
        }

        debug!(
            "Answering roster request from {} for {} with {} items",
            self.domain, owner, count
        );
        Ok(Stanza::result_for(request).with_payload(query))
    }

    /// Read the owner's roster and route the answer back to the gateway.
    pub async fn process(&self, request: &Stanza) -> Result<()> {
        let response = self.build_response(request).await?;
        self.router.route(response).await?;
        info!("Sent roster to gateway {}", self.domain);
        Ok(())
    }
}

/// Applies a gateway's roster push to the owner's roster.
pub struct ReceiveChangesProcessor {
    domain: Jid,
    store: Arc<dyn RosterStore>,
}

impl ReceiveChangesProcessor {
    /// Create a processor bound to a gateway domain.
    pub fn new(domain: Jid, store: Arc<dyn RosterStore>) -> Self {
        Self { domain, store }
    }

    /// Parse every item of a push, in order.
    ///
    /// One malformed item rejects the whole push before anything is written.
    pub fn parse_items(push: &Stanza) -> Result<Vec<RosterItem>> {
        ROSTER_ITEM
            .select(push.element())
            .into_iter()
            .map(|e| RosterItem::from_element(e).map_err(RosterError::InvalidItem))
            .collect()
    }

    /// Upsert or remove each pushed item.
    ///
    /// Items are applied one at a time in stanza order. A store failure
    /// stops the push; items already applied stay committed, which relies on
    /// the store making each write durable on its own.
    pub async fn process(&self, push: &Stanza) -> Result<()> {
        let owner = roster_owner(push)?;
        let items = Self::parse_items(push)?;

        let mut removed = 0usize;
        for item in &items {
            if item.is_removal() {
                self.store.remove_item(&owner, &item.jid).await?;
                removed += 1;
            } else {
                self.store.upsert_item(&owner, item.clone()).await?;
            }
        }

        info!(
            "Applied roster push from {} to {}: {} updated, {} removed",
            self.domain,
            owner,
            items.len() - removed,
            removed
        );
        Ok(())
    }
}

/// A translation processor resolved at interceptor construction.
pub enum RosterProcessor {
    SendRoster(SendRosterProcessor),
    ReceiveChanges(ReceiveChangesProcessor),
}

impl RosterProcessor {
    /// The variant's kind.
    pub fn kind(&self) -> ProcessorKind {
        match self {
            Self::SendRoster(_) => ProcessorKind::SendRoster,
            Self::ReceiveChanges(_) => ProcessorKind::ReceiveChanges,
        }
    }

    /// Process a stanza of the shape this processor handles.
    pub async fn process(&self, stanza: &Stanza) -> Result<()> {
        match self {
            Self::SendRoster(p) => p.process(stanza).await,
            Self::ReceiveChanges(p) => p.process(stanza).await,
        }
    }
}

/// The processors owned by one interceptor.
pub struct ProcessorSet {
    send_roster: RosterProcessor,
    receive_changes: RosterProcessor,
}

impl ProcessorSet {
    /// Build both processors for a gateway domain.
    pub fn new(domain: &Jid, store: Arc<dyn RosterStore>, router: Arc<dyn PacketRouter>) -> Self {
        Self {
            send_roster: RosterProcessor::SendRoster(SendRosterProcessor::new(
                domain.clone(),
                store.clone(),
                router,
            )),
            receive_changes: RosterProcessor::ReceiveChanges(ReceiveChangesProcessor::new(
                domain.clone(),
                store,
            )),
        }
    }

    /// The processor for a kind.
    pub fn get(&self, kind: ProcessorKind) -> &RosterProcessor {
        match kind {
            ProcessorKind::SendRoster => &self.send_roster,
            ProcessorKind::ReceiveChanges => &self.receive_changes,
        }
    }
}
