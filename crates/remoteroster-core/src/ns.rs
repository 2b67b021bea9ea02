//! Namespace URIs and wire literals.

/// Client stream namespace stanzas default to.
pub const JABBER_CLIENT: &str = "jabber:client";

/// Roster query namespace.
pub const ROSTER: &str = "jabber:iq:roster";

/// In-band registration namespace.
pub const REGISTER: &str = "jabber:iq:register";

/// Marker namespace a gateway registration request carries.
pub const GATEWAY_REGISTER: &str = "jabber:iq:gateway:register";

/// Service discovery info namespace.
pub const DISCO_INFO: &str = "http://jabber.org/protocol/disco#info";

/// Feature advertised to users registered with a gateway.
pub const FEATURE_REGISTERED: &str = "jabber:iq:registered";

/// Discovery identity category identifying a gateway.
pub const GATEWAY_CATEGORY: &str = "gateway";
