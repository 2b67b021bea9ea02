//! Per-gateway stanza interceptor.
//!
//! Each inbound, unprocessed info/query stanza with both addresses present
//! is classified independently, in this order:
//!
//! 1. `get` from the gateway with exactly one roster-namespace element:
//!    roster request, answered by the send-roster processor.
//! 2. `set` from the gateway with at least one roster item: roster push,
//!    applied by the receive-changes processor.
//! 3. `set` to the gateway: a gateway-registration marker records the sender
//!    as registered; otherwise a single registration `remove` records it as
//!    unregistered.
//! 4. `result` from the gateway to a registered requester: a
//!    `jabber:iq:registered` feature is appended to the payload in place.
//!
//! Anything else passes through untouched.

use crate::error::RosterError;
use crate::processor::{ProcessorKind, ProcessorSet, ROSTER_ITEM};
use crate::registration::RegistrationTracker;
use crate::traits::{PacketContext, PacketInterceptor, PacketRouter, RosterStore};
use crate::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use remoteroster_core::xml::{Query, ROSTER_NAMESPACES};
use remoteroster_core::{ns, Element, IqType, Jid, Stanza};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

static ROSTER_ANY: Lazy<Query> = Lazy::new(|| {
    Query::compile(&ROSTER_NAMESPACES, "//roster:*").expect("invalid roster query")
});

static REGISTER_REMOVE: Lazy<Query> = Lazy::new(|| {
    Query::compile(&ROSTER_NAMESPACES, "//register:remove").expect("invalid register query")
});

/// What the interceptor decided for one stanza.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Not eligible: already processed, outbound, not an info/query, or
    /// missing an address.
    Ignored,
    /// Eligible but matched no rule.
    PassThrough,
    /// Hand to a translation processor.
    Dispatch(ProcessorKind),
    /// Requester registered with the gateway.
    Register(Jid),
    /// Requester removed its gateway registration.
    Unregister(Jid),
    /// Result to a registered requester; advertise the registration.
    AnnotateRegistered(Jid),
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignored => write!(f, "ignored"),
            Self::PassThrough => write!(f, "pass-through"),
            Self::Dispatch(kind) => write!(f, "dispatch to {}", kind),
            Self::Register(jid) => write!(f, "register {}", jid),
            Self::Unregister(jid) => write!(f, "unregister {}", jid),
            Self::AnnotateRegistered(jid) => write!(f, "annotate result for {}", jid),
        }
    }
}

/// Interceptor bound to one gateway domain.
pub struct RemotePacketInterceptor {
    name: String,
    domain: Jid,
    processors: ProcessorSet,
    registrations: RegistrationTracker,
}

impl RemotePacketInterceptor {
    /// Create an interceptor and its processors for a gateway domain.
    pub fn new(domain: Jid, store: Arc<dyn RosterStore>, router: Arc<dyn PacketRouter>) -> Self {
        let processors = ProcessorSet::new(&domain, store, router);
        Self {
            name: interceptor_name(&domain),
            domain,
            processors,
            registrations: RegistrationTracker::new(),
        }
    }

    /// The bound gateway domain.
    pub fn domain(&self) -> &Jid {
        &self.domain
    }

    /// Registration state observed by this interceptor.
    pub fn registrations(&self) -> &RegistrationTracker {
        &self.registrations
    }

    /// Classify a stanza without acting on it.
    pub fn classify(&self, stanza: &Stanza, ctx: PacketContext) -> Classification {
        if !ctx.is_interceptable() {
            return Classification::Ignored;
        }
        let Some(iq_type) = stanza.iq_type() else {
            return Classification::Ignored;
        };
        let (Some(from), Some(to)) = (stanza.sender(), stanza.recipient()) else {
            trace!("Ignoring unaddressed stanza");
            return Classification::Ignored;
        };

        let root = stanza.element();
        let from_gateway = from == self.domain;

        match iq_type {
            IqType::Get if from_gateway => {
                if ROSTER_ANY.count(root) == 1 {
                    Classification::Dispatch(ProcessorKind::SendRoster)
                } else {
                    Classification::PassThrough
                }
            }
            IqType::Set if from_gateway => {
                if ROSTER_ITEM.exists(root) {
                    Classification::Dispatch(ProcessorKind::ReceiveChanges)
                } else {
                    Classification::PassThrough
                }
            }
            IqType::Set if to == self.domain => {
                if has_registration_marker(root) {
                    Classification::Register(from)
                } else if REGISTER_REMOVE.count(root) == 1 {
                    Classification::Unregister(from)
                } else {
                    Classification::PassThrough
                }
            }
            IqType::Result
                if from_gateway && self.registrations.is_registered(&self.domain, &to) =>
            {
                Classification::AnnotateRegistered(to)
            }
            _ => Classification::PassThrough,
        }
    }

    /// Classify a stanza and act on the decision.
    ///
    /// A processor failure rejects the stanza; registration bookkeeping and
    /// annotation cannot fail.
    pub async fn handle(&self, stanza: &mut Stanza, ctx: PacketContext) -> Result<Classification> {
        let classification = self.classify(stanza, ctx);

        match &classification {
            Classification::Ignored | Classification::PassThrough => {
                trace!("{}: no rule matched", self.name);
            }
            Classification::Dispatch(kind) => {
                debug!("{}: dispatching to {}", self.name, kind);
                if let Err(e) = self.processors.get(*kind).process(stanza).await {
                    warn!("{}: {} failed: {}", self.name, kind, e);
                    return Err(RosterError::rejected(self.domain.to_string(), e));
                }
            }
            Classification::Register(requester) => {
                info!("{} registered with gateway {}", requester.bare(), self.domain);
                self.registrations.mark_registered(&self.domain, requester);
            }
            Classification::Unregister(requester) => {
                info!("{} unregistered from gateway {}", requester.bare(), self.domain);
                self.registrations.mark_unregistered(&self.domain, requester);
            }
            Classification::AnnotateRegistered(requester) => {
                if annotate_registered(stanza) {
                    debug!("{}: advertised registration to {}", self.name, requester);
                }
            }
        }

        Ok(classification)
    }
}

#[async_trait]
impl PacketInterceptor for RemotePacketInterceptor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn intercept(&self, stanza: &mut Stanza, ctx: PacketContext) -> Result<()> {
        self.handle(stanza, ctx).await.map(|_| ())
    }
}

/// Pipeline name of the interceptor for a domain.
pub fn interceptor_name(domain: &Jid) -> String {
    format!("remoteroster:{}", domain)
}

/// Any element in the gateway-registration namespace.
fn has_registration_marker(root: &Element) -> bool {
    root.descendants().any(|e| e.ns() == ns::GATEWAY_REGISTER)
}

/// Append the registered feature to the payload. Returns whether the stanza
/// changed; a payload already carrying the feature, or no payload, is left
/// alone.
fn annotate_registered(stanza: &mut Stanza) -> bool {
    let Some(payload) = stanza.payload_mut() else {
        return false;
    };
    let payload_ns = payload.ns().to_string();
    let already = payload.children().any(|c| {
        c.is("feature", &payload_ns) && c.attr("var") == Some(ns::FEATURE_REGISTERED)
    });
    if already {
        return false;
    }
    payload.append_child(
        Element::new("feature", payload_ns).with_attr("var", ns::FEATURE_REGISTERED),
    );
    true
}
