//! Property file integration tests.
//!
//! Gateway flags written by the CLI are honored by a manager reading the
//! same file.

use remoteroster_cli::commands::flags::{list_flags, set_flag};
use remoteroster_core::{Jid, PropertyStore};
use remoteroster_integration_tests::TestHost;
use std::fs;
use tempfile::TempDir;

#[tokio::test]
async fn test_flags_from_json5_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("properties.json5");
    fs::write(
        &path,
        r#"{
            // gateways allowed to manage rosters
            "plugin.remoteroster.jids.gw.example.com": true,
            "plugin.remoteroster.jids.icq.example.com": false,
        }"#,
    )
    .unwrap();

    let host = TestHost::with_properties(PropertyStore::open(&path).unwrap());
    host.connect_component("gw.example.com", "gateway").await;
    host.connect_component("icq.example.com", "gateway").await;

    assert_eq!(
        host.manager.enabled_domains().await,
        vec![Jid::domain_only("gw.example.com")]
    );
}

#[tokio::test]
async fn test_cli_flags_persist_for_next_start() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("properties.json5");

    let admin = PropertyStore::open(&path).unwrap();
    set_flag(&admin, "gw.example.com", true).unwrap();
    set_flag(&admin, "icq.example.com", false).unwrap();
    drop(admin);

    let reopened = PropertyStore::open(&path).unwrap();
    let flags = list_flags(&reopened);
    assert_eq!(flags.len(), 2);
    reopened.validate().unwrap();

    let host = TestHost::with_properties(reopened);
    host.connect_component("gw.example.com", "gateway").await;
    assert!(host.manager.is_enabled(&Jid::domain_only("gw.example.com")).await);

    let json = serde_json::to_value(&flags).unwrap();
    assert_eq!(json[0]["domain"], "gw.example.com");
    assert_eq!(json[0]["enabled"], true);
}
