//! Shared host harness for integration tests.
//!
//! Wires a [`GatewayManager`] to an [`InterceptorChain`], an in-memory roster
//! and router, and a property store, the way a host server would.

use remoteroster_core::config::gateway_flag_key;
use remoteroster_core::{Jid, PropertyStore, Stanza};
use remoteroster_plugin::{
    GatewayManager, InterceptorChain, MemoryRosterStore, MemoryRouter, PacketContext,
};
use std::sync::Arc;
use std::time::Duration;

/// A simulated host server.
pub struct TestHost {
    pub manager: Arc<GatewayManager>,
    pub chain: Arc<InterceptorChain>,
    pub store: Arc<MemoryRosterStore>,
    pub router: Arc<MemoryRouter>,
    pub properties: Arc<PropertyStore>,
}

impl TestHost {
    /// Host backed by an unpersisted property store.
    pub fn new() -> Self {
        Self::with_properties(PropertyStore::new())
    }

    /// Host backed by the given property store.
    pub fn with_properties(properties: PropertyStore) -> Self {
        let chain = Arc::new(InterceptorChain::new());
        let store = Arc::new(MemoryRosterStore::new());
        let router = Arc::new(MemoryRouter::new());
        let properties = Arc::new(properties);

        let manager = GatewayManager::builder()
            .pipeline(chain.clone())
            .roster_store(store.clone())
            .router(router.clone())
            .flags(properties.clone())
            .build()
            .expect("all collaborators provided");

        Self {
            manager: Arc::new(manager),
            chain,
            store,
            router,
            properties,
        }
    }

    /// Set a gateway's enable flag.
    pub fn set_flag(&self, domain: &str, enabled: bool) {
        self.properties
            .set(&gateway_flag_key(domain), enabled.to_string())
            .expect("valid flag key");
    }

    /// Deliver an inbound, unprocessed stanza through the pipeline.
    pub async fn deliver(&self, xml: &str) -> remoteroster_plugin::Result<Stanza> {
        let mut stanza = Stanza::parse(xml).expect("well-formed stanza");
        self.chain
            .dispatch(&mut stanza, PacketContext::inbound())
            .await?;
        Ok(stanza)
    }

    /// Connect a component and answer its discovery probe.
    pub async fn connect_component(&self, domain: &str, category: &str) {
        let jid = Jid::domain_only(domain);
        self.manager.on_component_connected(&jid);
        self.manager
            .on_discovery_info_received(&jid, &disco_info(domain, category))
            .await
            .expect("discovery handled");
    }

    /// Wait until the manager's enabled state for `domain` matches.
    pub async fn wait_for_enabled(&self, domain: &str, expected: bool) {
        let jid = Jid::domain_only(domain);
        for _ in 0..200 {
            if self.manager.is_enabled(&jid).await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{} enabled state never became {}", domain, expected);
    }
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}

/// A discovery-info answer with one identity.
pub fn disco_info(domain: &str, category: &str) -> Stanza {
    Stanza::parse(&format!(
        r#"<iq xmlns="jabber:component:accept" type="result" id="disco1" from="{}" to="example.com"><query xmlns="http://jabber.org/protocol/disco#info"><identity category="{}" type="xmpp"/><feature var="jabber:iq:register"/></query></iq>"#,
        domain, category
    ))
    .expect("well-formed discovery info")
}
