//! Gateway lifecycle integration tests.
//!
//! Component connect, discovery, configuration changes and disconnect,
//! observed through the host's interceptor pipeline.

use remoteroster_core::Jid;
use remoteroster_integration_tests::{disco_info, TestHost};
use remoteroster_plugin::ComponentEvent;

#[tokio::test]
async fn test_gateway_connect_and_disconnect() {
    let host = TestHost::new();
    host.set_flag("gw.example.com", true);

    host.connect_component("gw.example.com", "gateway").await;
    assert_eq!(host.chain.names().await, vec!["remoteroster:gw.example.com"]);

    let gw = Jid::domain_only("gw.example.com");
    host.manager.on_component_disconnected(&gw).await.unwrap();
    assert!(host.chain.is_empty().await);

    // A second disconnect is a no-op.
    host.manager.on_component_disconnected(&gw).await.unwrap();
    assert!(host.chain.is_empty().await);
    assert!(host.manager.enabled_domains().await.is_empty());
}

#[tokio::test]
async fn test_non_gateway_component_is_not_intercepted() {
    let host = TestHost::new();
    host.set_flag("muc.example.com", true);

    host.connect_component("muc.example.com", "conference").await;
    assert!(host.chain.is_empty().await);
    assert!(!host.manager.is_pending(&Jid::domain_only("muc.example.com")));
}

#[tokio::test]
async fn test_disabled_gateway_enabled_later_by_configuration() {
    let host = TestHost::new();
    host.manager.start().await.unwrap();

    host.connect_component("gw.example.com", "gateway").await;
    assert!(host.chain.is_empty().await);

    host.set_flag("gw.example.com", true);
    host.wait_for_enabled("gw.example.com", true).await;
    assert_eq!(host.chain.len().await, 1);

    host.set_flag("gw.example.com", false);
    host.wait_for_enabled("gw.example.com", false).await;
    assert!(host.chain.is_empty().await);

    host.manager.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_events_for_several_gateways() {
    let host = TestHost::new();
    host.set_flag("gw.example.com", true);
    host.set_flag("icq.example.com", true);

    for domain in ["gw.example.com", "icq.example.com"] {
        host.manager
            .handle_event(ComponentEvent::Registered(Jid::domain_only(domain)))
            .await
            .unwrap();
    }
    for domain in ["icq.example.com", "gw.example.com"] {
        host.manager
            .handle_event(ComponentEvent::InfoReceived(disco_info(domain, "gateway")))
            .await
            .unwrap();
    }

    let status = host.manager.status().await;
    assert_eq!(
        status.enabled,
        vec![
            Jid::domain_only("gw.example.com"),
            Jid::domain_only("icq.example.com")
        ]
    );
    assert!(status.pending.is_empty());

    host.manager
        .handle_event(ComponentEvent::Unregistered(Jid::domain_only(
            "icq.example.com",
        )))
        .await
        .unwrap();
    assert_eq!(host.chain.names().await, vec!["remoteroster:gw.example.com"]);
}

#[tokio::test]
async fn test_shutdown_removes_all_interceptors() {
    let host = TestHost::new();
    host.set_flag("gw.example.com", true);
    host.set_flag("icq.example.com", true);
    host.manager.start().await.unwrap();

    host.connect_component("gw.example.com", "gateway").await;
    host.connect_component("icq.example.com", "gateway").await;
    assert_eq!(host.chain.len().await, 2);

    host.manager.shutdown().await.unwrap();
    assert!(host.chain.is_empty().await);
    assert!(!host.manager.is_running().await);

    // After shutdown, configuration changes are no longer followed.
    host.set_flag("gw.example.com", false);
    host.set_flag("gw.example.com", true);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(host.chain.is_empty().await);
}
