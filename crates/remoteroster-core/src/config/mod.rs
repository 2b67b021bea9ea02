//! Property-store configuration.
//!
//! Settings are flat `key → value` string properties. Per-gateway enable
//! flags live under `plugin.remoteroster.jids.<domain>`; they are the only
//! state that survives a restart. Every change is broadcast to subscribers
//! so running components can react without polling.

mod keys;
mod loader;

pub use keys::*;

use crate::error::ConfigError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::debug;

/// Capacity of the change-notification channel.
const EVENT_CAPACITY: usize = 256;

/// What happened to a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyEventKind {
    Set,
    Deleted,
}

/// Change notification for one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEvent {
    /// The changed key.
    pub key: String,
    /// Kind of change.
    pub kind: PropertyEventKind,
}

/// Source of boolean feature flags with change notifications.
pub trait FlagSource: Send + Sync {
    /// Read a boolean flag, falling back to `default` when unset.
    fn get_boolean_flag(&self, key: &str, default: bool) -> Result<bool, ConfigError>;

    /// Subscribe to property change notifications.
    fn subscribe(&self) -> broadcast::Receiver<PropertyEvent>;
}

/// In-memory property map, optionally persisted to a JSON5 file.
pub struct PropertyStore {
    properties: RwLock<BTreeMap<String, String>>,
    path: Option<PathBuf>,
    events: broadcast::Sender<PropertyEvent>,
}

impl Default for PropertyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PropertyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyStore")
            .field("properties", &self.properties.read().len())
            .field("path", &self.path)
            .finish()
    }
}

impl PropertyStore {
    /// Create an empty, unpersisted store.
    pub fn new() -> Self {
        Self::with_properties(BTreeMap::new(), None)
    }

    fn with_properties(properties: BTreeMap<String, String>, path: Option<PathBuf>) -> Self {
        let properties = properties
            .into_iter()
            .map(|(key, value)| (normalize_key(&key).into_owned(), value))
            .collect();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            properties: RwLock::new(properties),
            path,
            events,
        }
    }

    /// File this store persists to, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }

    /// Get a property value.
    pub fn get(&self, key: &str) -> Option<String> {
        let key = normalize_key(key);
        self.properties.read().get(&*key).cloned()
    }

    /// Get a boolean property; unset or non-boolean values yield `default`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .and_then(|v| parse_bool(&v))
            .unwrap_or(default)
    }

    /// Set a property, persisting and notifying subscribers when it changes.
    ///
    /// If persisting fails the store keeps its previous contents.
    pub fn set(&self, key: &str, value: impl Into<String>) -> Result<(), ConfigError> {
        validate_key(key)?;
        let key = normalize_key(key);
        let value = value.into();

        {
            let mut properties = self.properties.write();
            if properties.get(&*key) == Some(&value) {
                return Ok(());
            }
            let mut updated = properties.clone();
            updated.insert(key.to_string(), value);
            self.persist(&updated)?;
            *properties = updated;
        }

        debug!("Property set: {}", key);
        self.notify(&key, PropertyEventKind::Set);
        Ok(())
    }

    /// Remove a property. Returns whether it existed.
    ///
    /// If persisting fails the property stays in place.
    pub fn remove(&self, key: &str) -> Result<bool, ConfigError> {
        let key = normalize_key(key);

        {
            let mut properties = self.properties.write();
            if !properties.contains_key(&*key) {
                return Ok(false);
            }
            let mut updated = properties.clone();
            updated.remove(&*key);
            self.persist(&updated)?;
            *properties = updated;
        }

        debug!("Property deleted: {}", key);
        self.notify(&key, PropertyEventKind::Deleted);
        Ok(true)
    }

    /// Keys starting with `prefix`, sorted.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.properties
            .read()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Copy of all properties.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.properties.read().clone()
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<PropertyEvent> {
        self.events.subscribe()
    }

    /// Validate all properties, collecting every error before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        for (key, value) in self.properties.read().iter() {
            if let Err(e) = validate_key(key) {
                errors.push(e.to_string());
            }
            if gateway_domain_from_key(key).is_some() && parse_bool(value).is_none() {
                errors.push(format!(
                    "Gateway flag '{}' must be true or false, got '{}'",
                    key, value
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    fn persist(&self, properties: &BTreeMap<String, String>) -> Result<(), ConfigError> {
        match &self.path {
            Some(path) => loader::write_properties(path, properties),
            None => Ok(()),
        }
    }

    fn notify(&self, key: &str, kind: PropertyEventKind) {
        // No subscribers is fine.
        let _ = self.events.send(PropertyEvent {
            key: key.to_string(),
            kind,
        });
    }
}

impl FlagSource for PropertyStore {
    fn get_boolean_flag(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        Ok(self.get_bool(key, default))
    }

    fn subscribe(&self) -> broadcast::Receiver<PropertyEvent> {
        PropertyStore::subscribe(self)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn validate_key(key: &str) -> Result<(), ConfigError> {
    if key.is_empty() {
        return Err(ConfigError::Validation("Property key cannot be empty".to_string()));
    }
    if key.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "Property key '{}' contains whitespace",
            key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_bool() {
        let store = PropertyStore::new();
        assert!(!store.get_bool("missing", false));
        assert!(store.get_bool("missing", true));

        store.set("a", "TRUE").unwrap();
        store.set("b", "false").unwrap();
        store.set("c", "yes").unwrap();
        assert!(store.get_bool("a", false));
        assert!(!store.get_bool("b", true));
        assert!(store.get_bool("c", true));
        assert!(!store.get_bool("c", false));
    }

    #[test]
    fn test_set_rejects_bad_keys() {
        let store = PropertyStore::new();
        assert!(store.set("", "x").is_err());
        assert!(store.set("has space", "x").is_err());
    }

    #[tokio::test]
    async fn test_change_notifications() {
        let store = PropertyStore::new();
        let mut rx = store.subscribe();

        store.set("plugin.remoteroster.jids.gw.example.com", "true").unwrap();
        // Unchanged value does not notify.
        store.set("plugin.remoteroster.jids.gw.example.com", "true").unwrap();
        assert!(store.remove("plugin.remoteroster.jids.gw.example.com").unwrap());
        assert!(!store.remove("plugin.remoteroster.jids.gw.example.com").unwrap());

        let first = rx.recv().await.unwrap();
        assert_eq!(first.kind, PropertyEventKind::Set);
        assert_eq!(first.key, "plugin.remoteroster.jids.gw.example.com");
        let second = rx.recv().await.unwrap();
        assert_eq!(second.kind, PropertyEventKind::Deleted);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_keys_with_prefix() {
        let store = PropertyStore::new();
        store.set(&gateway_flag_key("b.example.com"), "true").unwrap();
        store.set(&gateway_flag_key("a.example.com"), "false").unwrap();
        store.set("other.key", "1").unwrap();

        let keys = store.keys_with_prefix(GATEWAY_FLAG_PREFIX);
        assert_eq!(
            keys,
            vec![
                "plugin.remoteroster.jids.a.example.com".to_string(),
                "plugin.remoteroster.jids.b.example.com".to_string(),
            ]
        );
    }

    #[test]
    fn test_gateway_keys_normalized() {
        let store = PropertyStore::new();
        let mut rx = store.subscribe();

        store.set("plugin.remoteroster.jids.GW.Example.com", "true").unwrap();
        assert_eq!(
            store.keys_with_prefix(GATEWAY_FLAG_PREFIX),
            vec!["plugin.remoteroster.jids.gw.example.com".to_string()]
        );
        assert!(store.get_bool(&gateway_flag_key("gw.example.com"), false));
        assert!(store.get_bool("plugin.remoteroster.jids.GW.EXAMPLE.COM", false));
        assert_eq!(
            rx.try_recv().unwrap().key,
            "plugin.remoteroster.jids.gw.example.com"
        );

        assert!(store.remove("plugin.remoteroster.jids.Gw.Example.Com").unwrap());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_failed_write_keeps_previous_state() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = PropertyStore::open(&blocker.join("properties.json5")).unwrap();
        let mut rx = store.subscribe();
        let key = gateway_flag_key("gw.example.com");

        assert!(store.set(&key, "true").is_err());
        assert_eq!(store.get(&key), None);
        assert!(rx.try_recv().is_err());

        let seeded = BTreeMap::from([(key.clone(), "true".to_string())]);
        let bound = PropertyStore::with_properties(seeded, Some(blocker.join("properties.json5")));
        let mut rx = bound.subscribe();
        assert!(bound.remove(&key).is_err());
        assert_eq!(bound.get(&key).as_deref(), Some("true"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_validate_collects_errors() {
        let store = PropertyStore::new();
        store.set(&gateway_flag_key("gw1"), "maybe").unwrap();
        store.set(&gateway_flag_key("gw2"), "sometimes").unwrap();
        store.set(&gateway_flag_key("gw3"), "true").unwrap();

        let err = store.validate().unwrap_err().to_string();
        assert!(err.contains("gw1"));
        assert!(err.contains("gw2"));
        assert!(!err.contains("gw3"));
    }
}
