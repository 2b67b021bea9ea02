//! Gateway registration tracking.
//!
//! Membership is rebuilt from observed registration stanzas only and is lost
//! on restart.

use dashmap::DashMap;
use remoteroster_core::Jid;
use std::collections::HashSet;
use tracing::debug;

/// Requesters believed to be registered with each gateway domain.
#[derive(Debug, Default)]
pub struct RegistrationTracker {
    registered: DashMap<Jid, HashSet<Jid>>,
}

impl RegistrationTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `requester` registered with `domain`. Idempotent.
    pub fn mark_registered(&self, domain: &Jid, requester: &Jid) {
        let inserted = self
            .registered
            .entry(domain.clone())
            .or_default()
            .insert(requester.bare());
        if inserted {
            debug!("Marked {} registered with {}", requester.bare(), domain);
        }
    }

    /// Record that `requester` removed its registration. Idempotent.
    pub fn mark_unregistered(&self, domain: &Jid, requester: &Jid) {
        let removed = self
            .registered
            .get_mut(domain)
            .map(|mut set| set.remove(&requester.bare()))
            .unwrap_or(false);
        if removed {
            debug!("Marked {} unregistered from {}", requester.bare(), domain);
        }
        self.registered.remove_if(domain, |_, set| set.is_empty());
    }

    /// Whether `requester` is registered with `domain`.
    pub fn is_registered(&self, domain: &Jid, requester: &Jid) -> bool {
        self.registered
            .get(domain)
            .map(|set| set.contains(&requester.bare()))
            .unwrap_or(false)
    }

    /// Number of requesters registered with `domain`.
    pub fn count(&self, domain: &Jid) -> usize {
        self.registered.get(domain).map(|set| set.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jid(s: &str) -> Jid {
        Jid::parse(s).unwrap()
    }

    #[test]
    fn test_register_then_unregister() {
        let tracker = RegistrationTracker::new();
        let domain = jid("gw.example.com");
        let alice = jid("alice@example.com");

        tracker.mark_registered(&domain, &alice);
        tracker.mark_registered(&domain, &alice);
        assert!(tracker.is_registered(&domain, &alice));
        assert_eq!(tracker.count(&domain), 1);

        tracker.mark_unregistered(&domain, &alice);
        assert!(!tracker.is_registered(&domain, &alice));
        assert_eq!(tracker.count(&domain), 0);
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let tracker = RegistrationTracker::new();
        let domain = jid("gw.example.com");
        let bob = jid("bob@example.com");

        tracker.mark_unregistered(&domain, &bob);
        assert!(!tracker.is_registered(&domain, &bob));
    }

    #[test]
    fn test_domain_scoped_and_bare() {
        let tracker = RegistrationTracker::new();
        let gw = jid("gw.example.com");
        let icq = jid("icq.example.com");

        tracker.mark_registered(&gw, &jid("alice@example.com/laptop"));
        assert!(tracker.is_registered(&gw, &jid("alice@example.com")));
        assert!(tracker.is_registered(&gw, &jid("alice@example.com/phone")));
        assert!(!tracker.is_registered(&icq, &jid("alice@example.com")));
    }
}
