//! Gateway lifecycle manager.
//!
//! The GatewayManager tracks which external components are roster gateways
//! and keeps exactly one interceptor registered per enabled gateway domain:
//! - Probing newly connected components once through discovery-info
//! - Enabling and disabling interceptors from the per-domain flag
//! - Watching configuration changes while running
//!
//! Registry mutations are serialized by one lock that is held across the
//! pipeline call, so a domain is never half-registered. Stanza traffic does
//! not take this lock; the pipeline holds its own references to the
//! interceptors.

use crate::interceptor::RemotePacketInterceptor;
use crate::traits::{
    ComponentSessions, DirectSessions, InterceptorPipeline, PacketInterceptor, PacketRouter,
    RosterStore,
};
use crate::{Result, RosterError};
use once_cell::sync::Lazy;
use parking_lot::Mutex as SyncMutex;
use remoteroster_core::config::{gateway_domain_from_key, gateway_flag_key};
use remoteroster_core::xml::{Query, DISCO_NAMESPACES};
use remoteroster_core::{ns, FlagSource, Jid, PropertyEvent, Stanza};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

static GATEWAY_IDENTITY: Lazy<Query> = Lazy::new(|| {
    let expr = format!("//disco:identity[@category='{}']", ns::GATEWAY_CATEGORY);
    Query::compile(&DISCO_NAMESPACES, &expr).expect("invalid identity query")
});

/// Whether a discovery-info response advertises a gateway identity.
pub fn is_gateway_info(stanza: &Stanza) -> bool {
    GATEWAY_IDENTITY.exists(stanza.element())
}

/// Events from the host's component subsystem.
#[derive(Debug, Clone)]
pub enum ComponentEvent {
    /// A component connected under this address.
    Registered(Jid),
    /// A component disconnected.
    Unregistered(Jid),
    /// A component answered the discovery-info probe.
    InfoReceived(Stanza),
}

/// Snapshot of manager state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerStatus {
    /// Whether the configuration watcher is running.
    pub running: bool,
    /// Domains with a registered interceptor, sorted.
    pub enabled: Vec<Jid>,
    /// Domains waiting for a discovery-info answer, sorted.
    pub pending: Vec<Jid>,
}

/// Keeps interceptors registered for enabled gateway domains.
pub struct GatewayManager {
    /// Live interceptors by domain.
    interceptors: Mutex<HashMap<Jid, Arc<RemotePacketInterceptor>>>,

    /// Domains probed but not yet answered.
    pending: SyncMutex<HashSet<Jid>>,

    pipeline: Arc<dyn InterceptorPipeline>,
    store: Arc<dyn RosterStore>,
    router: Arc<dyn PacketRouter>,
    flags: Arc<dyn FlagSource>,
    sessions: Arc<dyn ComponentSessions>,

    /// Running state.
    running: RwLock<bool>,

    /// Shutdown signal for the configuration watcher.
    shutdown: RwLock<Option<mpsc::Sender<()>>>,

    watcher: SyncMutex<Option<JoinHandle<()>>>,
}

impl GatewayManager {
    /// Start building a manager.
    pub fn builder() -> GatewayManagerBuilder {
        GatewayManagerBuilder::new()
    }

    // --- Component events ---

    /// A component connected; wait for its discovery-info answer.
    pub fn on_component_connected(&self, domain: &Jid) {
        let domain = domain.bare();
        debug!("Component connected, awaiting discovery info: {}", domain);
        self.pending.lock().insert(domain);
    }

    /// A component answered the discovery-info probe.
    ///
    /// Only the first answer per connection is considered. A gateway answer
    /// enables the domain if its flag allows it.
    pub async fn on_discovery_info_received(&self, domain: &Jid, stanza: &Stanza) -> Result<()> {
        let domain = domain.bare();
        if !self.pending.lock().remove(&domain) {
            debug!("Ignoring unsolicited discovery info from {}", domain);
            return Ok(());
        }

        if !is_gateway_info(stanza) {
            debug!("Component {} is not a gateway", domain);
            return Ok(());
        }

        if self.is_enabled(&domain).await {
            return Ok(());
        }

        info!("Discovered gateway: {}", domain);
        self.on_configuration_changed(&domain).await
    }

    /// A component disconnected; drop its interceptor if one exists.
    pub async fn on_component_disconnected(&self, address: &Jid) -> Result<()> {
        let Some(domain) = self.sessions.component_domain(address) else {
            debug!("No component session for {}", address);
            return Ok(());
        };
        self.pending.lock().remove(&domain);
        self.disable(&domain).await.map(|_| ())
    }

    /// Dispatch a component event.
    pub async fn handle_event(&self, event: ComponentEvent) -> Result<()> {
        match event {
            ComponentEvent::Registered(address) => {
                self.on_component_connected(&Jid::domain_only(address.domain()));
                Ok(())
            }
            ComponentEvent::Unregistered(address) => self.on_component_disconnected(&address).await,
            ComponentEvent::InfoReceived(stanza) => match stanza.sender() {
                Some(from) => {
                    let domain = Jid::domain_only(from.domain());
                    self.on_discovery_info_received(&domain, &stanza).await
                }
                None => Ok(()),
            },
        }
    }

    // --- Configuration ---

    /// Re-read a domain's flag and enable or disable it to match.
    pub async fn on_configuration_changed(&self, domain: &Jid) -> Result<()> {
        let allowed = self
            .flags
            .get_boolean_flag(&gateway_flag_key(domain.domain()), false)?;

        if allowed {
            self.enable(domain).await?;
        } else {
            self.disable(domain).await?;
        }
        Ok(())
    }

    /// React to a property change. Keys outside the gateway flag prefix are
    /// ignored.
    pub async fn on_property_event(&self, event: &PropertyEvent) -> Result<()> {
        match gateway_domain_from_key(&event.key) {
            Some(domain) => {
                debug!("Gateway flag changed: {}", event.key);
                self.on_configuration_changed(&Jid::domain_only(domain)).await
            }
            None => Ok(()),
        }
    }

    // --- Interceptor registry ---

    /// Register an interceptor for `domain`. Returns `false` if one already
    /// exists. On pipeline failure the registry is left unchanged.
    pub async fn enable(&self, domain: &Jid) -> Result<bool> {
        let domain = domain.bare();
        let mut interceptors = self.interceptors.lock().await;
        if interceptors.contains_key(&domain) {
            return Ok(false);
        }

        let interceptor = Arc::new(RemotePacketInterceptor::new(
            domain.clone(),
            self.store.clone(),
            self.router.clone(),
        ));
        self.pipeline.add_interceptor(interceptor.clone()).await?;
        interceptors.insert(domain.clone(), interceptor);

        info!("Enabled remote roster for gateway: {}", domain);
        Ok(true)
    }

    /// Unregister the interceptor for `domain`. Returns `false` if none
    /// exists. On pipeline failure the registry is left unchanged.
    pub async fn disable(&self, domain: &Jid) -> Result<bool> {
        let domain = domain.bare();
        let mut interceptors = self.interceptors.lock().await;
        let Some(interceptor) = interceptors.get(&domain) else {
            return Ok(false);
        };

        self.pipeline.remove_interceptor(interceptor.name()).await?;
        interceptors.remove(&domain);

        info!("Disabled remote roster for gateway: {}", domain);
        Ok(true)
    }

    /// Whether `domain` has a registered interceptor.
    pub async fn is_enabled(&self, domain: &Jid) -> bool {
        self.interceptors.lock().await.contains_key(&domain.bare())
    }

    /// Whether `domain` is waiting for its discovery-info answer.
    pub fn is_pending(&self, domain: &Jid) -> bool {
        self.pending.lock().contains(&domain.bare())
    }

    /// The interceptor for `domain`, if enabled.
    pub async fn interceptor(&self, domain: &Jid) -> Option<Arc<RemotePacketInterceptor>> {
        self.interceptors.lock().await.get(&domain.bare()).cloned()
    }

    /// Enabled domains, sorted.
    pub async fn enabled_domains(&self) -> Vec<Jid> {
        let mut domains: Vec<Jid> = self.interceptors.lock().await.keys().cloned().collect();
        domains.sort();
        domains
    }

    /// Current state.
    pub async fn status(&self) -> ManagerStatus {
        let mut pending: Vec<Jid> = self.pending.lock().iter().cloned().collect();
        pending.sort();
        ManagerStatus {
            running: self.is_running().await,
            enabled: self.enabled_domains().await,
            pending,
        }
    }

    // --- Lifecycle ---

    /// Start watching configuration changes.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        let mut running = self.running.write().await;
        if *running {
            return Ok(());
        }

        info!("Starting gateway manager");

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        {
            let mut shutdown = self.shutdown.write().await;
            *shutdown = Some(shutdown_tx);
        }

        let events = self.flags.subscribe();
        let handle = tokio::spawn(watch_configuration(
            Arc::downgrade(self),
            events,
            shutdown_rx,
        ));
        *self.watcher.lock() = Some(handle);

        *running = true;
        info!("Gateway manager started");
        Ok(())
    }

    /// Stop watching configuration and disable every domain.
    pub async fn shutdown(&self) -> Result<()> {
        {
            let mut running = self.running.write().await;
            if *running {
                info!("Stopping gateway manager");
                let mut shutdown = self.shutdown.write().await;
                if let Some(tx) = shutdown.take() {
                    let _ = tx.send(()).await;
                }
                *running = false;
            }
        }

        let watcher = self.watcher.lock().take();
        if let Some(handle) = watcher {
            if let Err(e) = handle.await {
                warn!("Configuration watcher ended abnormally: {}", e);
            }
        }

        for domain in self.enabled_domains().await {
            if let Err(e) = self.disable(&domain).await {
                error!("Failed to disable gateway {}: {}", domain, e);
            }
        }
        self.pending.lock().clear();

        info!("Gateway manager stopped");
        Ok(())
    }

    /// Whether the configuration watcher is running.
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Re-read the flag of every enabled or pending domain.
    async fn resync(&self) {
        let mut domains: HashSet<Jid> = self.enabled_domains().await.into_iter().collect();
        domains.extend(self.pending.lock().iter().cloned());

        for domain in domains {
            if let Err(e) = self.on_configuration_changed(&domain).await {
                warn!("Failed to resync gateway {}: {}", domain, e);
            }
        }
    }
}

async fn watch_configuration(
    manager: Weak<GatewayManager>,
    mut events: broadcast::Receiver<PropertyEvent>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    info!("Starting configuration watcher");

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("Configuration watcher shutting down");
                break;
            }
            event = events.recv() => {
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                match event {
                    Ok(event) => {
                        if let Err(e) = manager.on_property_event(&event).await {
                            warn!("Failed to apply property change {}: {}", event.key, e);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Configuration watcher lagged by {} events, resyncing", skipped);
                        manager.resync().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Configuration source closed");
                        break;
                    }
                }
            }
        }
    }
}

/// Builder for [`GatewayManager`].
#[derive(Default)]
pub struct GatewayManagerBuilder {
    pipeline: Option<Arc<dyn InterceptorPipeline>>,
    store: Option<Arc<dyn RosterStore>>,
    router: Option<Arc<dyn PacketRouter>>,
    flags: Option<Arc<dyn FlagSource>>,
    sessions: Option<Arc<dyn ComponentSessions>>,
}

impl GatewayManagerBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interception pipeline.
    pub fn pipeline(mut self, pipeline: Arc<dyn InterceptorPipeline>) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Set the roster store.
    pub fn roster_store(mut self, store: Arc<dyn RosterStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the packet router.
    pub fn router(mut self, router: Arc<dyn PacketRouter>) -> Self {
        self.router = Some(router);
        self
    }

    /// Set the flag source.
    pub fn flags(mut self, flags: Arc<dyn FlagSource>) -> Self {
        self.flags = Some(flags);
        self
    }

    /// Set the component session lookup. Defaults to [`DirectSessions`].
    pub fn sessions(mut self, sessions: Arc<dyn ComponentSessions>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Build the manager.
    pub fn build(self) -> Result<GatewayManager> {
        let missing = |what: &str| RosterError::Other(anyhow::anyhow!("{} is required", what));

        Ok(GatewayManager {
            interceptors: Mutex::new(HashMap::new()),
            pending: SyncMutex::new(HashSet::new()),
            pipeline: self.pipeline.ok_or_else(|| missing("pipeline"))?,
            store: self.store.ok_or_else(|| missing("roster store"))?,
            router: self.router.ok_or_else(|| missing("router"))?,
            flags: self.flags.ok_or_else(|| missing("flag source"))?,
            sessions: self.sessions.unwrap_or_else(|| Arc::new(DirectSessions)),
            running: RwLock::new(false),
            shutdown: RwLock::new(None),
            watcher: SyncMutex::new(None),
        })
    }
}
