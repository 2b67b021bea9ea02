//! Property key layout.

use std::borrow::Cow;

/// Prefix of the per-gateway enable flags.
pub const GATEWAY_FLAG_PREFIX: &str = "plugin.remoteroster.jids.";

/// Key of the enable flag for a gateway domain.
pub fn gateway_flag_key(domain: &str) -> String {
    format!("{}{}", GATEWAY_FLAG_PREFIX, domain.to_lowercase())
}

/// Canonical form of a key. Gateway flag keys carry a lowercase domain, the
/// same as addresses; other keys are returned unchanged.
pub fn normalize_key(key: &str) -> Cow<'_, str> {
    match gateway_domain_from_key(key) {
        Some(domain) if domain.chars().any(char::is_uppercase) => {
            Cow::Owned(gateway_flag_key(domain))
        }
        _ => Cow::Borrowed(key),
    }
}

/// Gateway domain named by an enable-flag key, if `key` is one.
pub fn gateway_domain_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(GATEWAY_FLAG_PREFIX)
        .filter(|domain| !domain.is_empty())
}
