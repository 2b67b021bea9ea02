//! # remoteroster-plugin
//!
//! Stanza interception for external roster gateways.
//!
//! For each gateway domain enabled in configuration, a
//! [`RemotePacketInterceptor`] sits in the host's stanza pipeline and
//! translates between the server roster and the gateway's roster stanzas.
//! The [`GatewayManager`] decides which domains have an interceptor.
//!
//! ## Architecture
//!
//! ```text
//! component events ─► GatewayManager ─► InterceptorPipeline
//!                          ▲                    │
//!          FlagSource ─────┘                    ▼
//!                                  RemotePacketInterceptor
//!                                   ├─ SendRosterProcessor ─► RosterStore, PacketRouter
//!                                   ├─ ReceiveChangesProcessor ─► RosterStore
//!                                   └─ RegistrationTracker
//! ```

pub mod chain;
pub mod error;
pub mod interceptor;
pub mod manager;
pub mod memory;
pub mod processor;
pub mod registration;
pub mod traits;

pub use chain::InterceptorChain;
pub use error::{Result, RosterError};
pub use interceptor::{Classification, RemotePacketInterceptor};
pub use manager::{ComponentEvent, GatewayManager, GatewayManagerBuilder, ManagerStatus};
pub use memory::{MemoryRosterStore, MemoryRouter, StoreOperation};
pub use processor::{
    ProcessorKind, ProcessorSet, ReceiveChangesProcessor, RosterProcessor, SendRosterProcessor,
};
pub use registration::RegistrationTracker;
pub use traits::{
    ComponentSessions, DirectSessions, InterceptorPipeline, PacketContext, PacketInterceptor,
    PacketRouter, RosterStore,
};
