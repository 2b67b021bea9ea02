//! Roster translation through the host pipeline.

use remoteroster_core::{ns, IqType, Jid, RosterItem, Stanza, Subscription};
use remoteroster_integration_tests::TestHost;
use remoteroster_plugin::{RosterStore, StoreOperation};

const ROSTER_GET: &str = r#"<iq type="get" from="gw.example.com" to="alice@example.com"><query xmlns="jabber:iq:roster"/></iq>"#;

async fn enabled_host() -> TestHost {
    let host = TestHost::new();
    host.set_flag("gw.example.com", true);
    host.connect_component("gw.example.com", "gateway").await;
    host
}

fn jid(s: &str) -> Jid {
    Jid::parse(s).unwrap()
}

#[tokio::test]
async fn test_roster_request_answered_with_gateway_contacts() {
    let host = enabled_host().await;
    let alice = jid("alice@example.com");
    host.store
        .upsert_item(
            &alice,
            RosterItem::new(jid("bob@gw.example.com"))
                .with_name("Bob")
                .with_group("Buddies")
                .with_subscription(Subscription::Both),
        )
        .await
        .unwrap();
    host.store
        .upsert_item(&alice, RosterItem::new(jid("carol@example.com")))
        .await
        .unwrap();

    let request = r#"<iq xmlns="jabber:component:accept" type="get" id="roster1" from="gw.example.com" to="alice@example.com"><query xmlns="jabber:iq:roster"/></iq>"#;
    let stanza = host.deliver(request).await.unwrap();

    // The request itself continues unchanged.
    assert_eq!(stanza.iq_type(), Some(IqType::Get));

    let routed = host.router.routed();
    assert_eq!(routed.len(), 1);
    let response = &routed[0];
    assert_eq!(response.id(), Some("roster1"));
    assert_eq!(response.recipient(), Some(jid("gw.example.com")));

    let xml = response.to_xml().unwrap();
    assert!(xml.contains(r#"jid="bob@gw.example.com""#));
    assert!(xml.contains("<group>Buddies</group>"));
    assert!(!xml.contains("carol@example.com"));
}

#[tokio::test]
async fn test_roster_push_applied_in_order() {
    let host = enabled_host().await;
    let alice = jid("alice@example.com");
    host.store
        .upsert_item(&alice, RosterItem::new(jid("old@gw.example.com")))
        .await
        .unwrap();
    host.store.clear_operations();

    let push = r#"<iq type="set" id="push1" from="gw.example.com" to="alice@example.com"><query xmlns="jabber:iq:roster"><item jid="new@gw.example.com" name="New" subscription="both"><group>Buddies</group></item><item jid="old@gw.example.com" subscription="remove"/></query></iq>"#;
    host.deliver(push).await.unwrap();

    assert_eq!(
        host.store.operations(),
        vec![
            StoreOperation::Upsert {
                owner: alice.clone(),
                jid: jid("new@gw.example.com"),
            },
            StoreOperation::Remove {
                owner: alice.clone(),
                jid: jid("old@gw.example.com"),
            },
        ]
    );
    let items = host.store.get_roster_items(&alice).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name.as_deref(), Some("New"));
}

#[tokio::test]
async fn test_store_failure_rejects_only_that_stanza() {
    let host = enabled_host().await;
    host.store.set_failing(true);

    let err = host.deliver(ROSTER_GET).await.unwrap_err();
    assert!(err.is_rejection());

    host.store.set_failing(false);
    host.deliver(ROSTER_GET).await.unwrap();
    assert_eq!(host.router.routed().len(), 1);
    assert!(host.manager.is_enabled(&Jid::domain_only("gw.example.com")).await);
}

#[tokio::test]
async fn test_partial_push_keeps_committed_items() {
    let host = enabled_host().await;
    let alice = jid("alice@example.com");
    host.store.fail_writes_after(Some(1));

    let push = r#"<iq type="set" from="gw.example.com" to="alice@example.com"><query xmlns="jabber:iq:roster"><item jid="a@gw.example.com"/><item jid="b@gw.example.com"/></query></iq>"#;
    let err = host.deliver(push).await.unwrap_err();
    assert!(err.is_rejection());

    host.store.fail_writes_after(None);
    let items = host.store.get_roster_items(&alice).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].jid, jid("a@gw.example.com"));

    let retry = r#"<iq type="set" from="gw.example.com" to="alice@example.com"><query xmlns="jabber:iq:roster"><item jid="b@gw.example.com"/></query></iq>"#;
    host.deliver(retry).await.unwrap();
    assert_eq!(host.store.get_roster_items(&alice).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_registration_advertised_in_discovery_results() {
    let host = enabled_host().await;
    let disco_result = r#"<iq type="result" id="info1" from="gw.example.com" to="alice@example.com/home"><query xmlns="http://jabber.org/protocol/disco#info"><identity category="gateway" type="xmpp"/></query></iq>"#;
    let register = r#"<iq type="set" id="reg1" from="alice@example.com/home" to="gw.example.com"><query xmlns="jabber:iq:register"><username>alice</username><password>secret</password><x xmlns="jabber:iq:gateway:register"/></query></iq>"#;
    let unregister = r#"<iq type="set" id="reg2" from="alice@example.com/home" to="gw.example.com"><query xmlns="jabber:iq:register"><remove/></query></iq>"#;

    let before = host.deliver(disco_result).await.unwrap();
    assert!(!before.to_xml().unwrap().contains(ns::FEATURE_REGISTERED));

    host.deliver(register).await.unwrap();

    let after = host.deliver(disco_result).await.unwrap();
    let features = after
        .payload()
        .unwrap()
        .children()
        .filter(|e| e.name() == "feature" && e.attr("var") == Some(ns::FEATURE_REGISTERED))
        .count();
    assert_eq!(features, 1);

    host.deliver(unregister).await.unwrap();
    let removed = host.deliver(disco_result).await.unwrap();
    assert!(!removed.to_xml().unwrap().contains(ns::FEATURE_REGISTERED));
}

#[tokio::test]
async fn test_other_components_pass_through() {
    let host = enabled_host().await;
    let xml = r#"<iq type="get" id="x" from="icq.example.com" to="alice@example.com"><query xmlns="jabber:iq:roster"/></iq>"#;

    let stanza = host.deliver(xml).await.unwrap();
    let expected = Stanza::parse(xml).unwrap().to_xml().unwrap();
    assert_eq!(stanza.to_xml().unwrap(), expected);
    assert!(host.store.operations().is_empty());
    assert!(host.router.routed().is_empty());
}
