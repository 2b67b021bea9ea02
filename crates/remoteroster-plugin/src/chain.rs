//! Ordered interceptor pipeline.

use crate::error::RosterError;
use crate::traits::{InterceptorPipeline, PacketContext, PacketInterceptor};
use crate::Result;
use async_trait::async_trait;
use remoteroster_core::Stanza;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Interceptors run in registration order; the first rejection stops the
/// stanza.
#[derive(Default)]
pub struct InterceptorChain {
    interceptors: RwLock<Vec<Arc<dyn PacketInterceptor>>>,
}

impl InterceptorChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a stanza through every interceptor.
    ///
    /// Interceptors added or removed while a stanza is in flight take effect
    /// for the next stanza.
    pub async fn dispatch(&self, stanza: &mut Stanza, ctx: PacketContext) -> Result<()> {
        let interceptors = self.interceptors.read().await.clone();

        for interceptor in interceptors {
            if let Err(e) = interceptor.intercept(stanza, ctx).await {
                debug!("Interceptor {} rejected stanza: {}", interceptor.name(), e);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Names of registered interceptors, in order.
    pub async fn names(&self) -> Vec<String> {
        self.interceptors
            .read()
            .await
            .iter()
            .map(|i| i.name().to_string())
            .collect()
    }

    /// Whether an interceptor with this name is registered.
    pub async fn contains(&self, name: &str) -> bool {
        self.interceptors.read().await.iter().any(|i| i.name() == name)
    }

    /// Number of registered interceptors.
    pub async fn len(&self) -> usize {
        self.interceptors.read().await.len()
    }

    /// Whether the chain is empty.
    pub async fn is_empty(&self) -> bool {
        self.interceptors.read().await.is_empty()
    }
}

#[async_trait]
impl InterceptorPipeline for InterceptorChain {
    async fn add_interceptor(&self, interceptor: Arc<dyn PacketInterceptor>) -> Result<()> {
        let mut interceptors = self.interceptors.write().await;
        let name = interceptor.name().to_string();

        if interceptors.iter().any(|i| i.name() == name) {
            return Err(RosterError::AlreadyRegistered(name));
        }

        interceptors.push(interceptor);
        info!("Registered interceptor: {}", name);
        Ok(())
    }

    async fn remove_interceptor(&self, name: &str) -> Result<()> {
        let mut interceptors = self.interceptors.write().await;
        let before = interceptors.len();
        interceptors.retain(|i| i.name() != name);

        if interceptors.len() == before {
            return Err(RosterError::NotFound(name.to_string()));
        }
        info!("Removed interceptor: {}", name);
        Ok(())
    }
}
