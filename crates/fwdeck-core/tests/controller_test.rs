#![allow(clippy::unwrap_used)]
// End-to-end controller behaviour against a mocked control plane.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use fwdeck_api::{ApiClient, TransportConfig};
use fwdeck_core::{
    Controller, ControllerConfig, CreateInterfaceRequest, CreateNatRuleRequest,
    CreateRuleRequest, CreateZoneRequest, EntityId, Notification, Policy, ReorderPersistence,
    UpdateInterfaceRequest, UpdateRuleRequest, UpdateZoneRequest, WorkflowState,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn rule_json(id: &str, position: i64) -> Value {
    json!({
        "id": id,
        "chain": "INPUT",
        "protocol": "tcp",
        "src": "",
        "dst": "",
        "srcPort": "",
        "dstPort": "",
        "action": "ACCEPT",
        "enabled": true,
        "comment": id,
        "position": position
    })
}

fn nat_json(id: &str, position: i64) -> Value {
    json!({
        "id": id,
        "name": id,
        "type": "SNAT",
        "protocol": "all",
        "nattoIP": "203.0.113.1",
        "enabled": true,
        "position": position
    })
}

/// Answers `PUT /api/rules/{id}` with the submitted body under that id.
struct EchoRule;

impl Respond for EchoRule {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut body: Value = request.body_json().unwrap();
        let id = request.url.path().rsplit('/').next().unwrap().to_owned();
        body["id"] = Value::String(id);
        ResponseTemplate::new(200).set_body_json(json!({ "rule": body }))
    }
}

async fn mount_snapshot(server: &MockServer, rules: Vec<Value>, nat: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "ok", "service": "firewall-manager" })),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rules": rules })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/nat-rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "natRules": nat })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "zones": null })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/interfaces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "interfaces": [] })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "config": { "id": "cfg", "ipForwarding": true, "natEnabled": false }
        })))
        .mount(server)
        .await;
}

async fn connected(server: &MockServer, persistence: ReorderPersistence) -> Controller {
    let key = SecretString::from("dev-key".to_string());
    let mut config = ControllerConfig::new(
        server.uri().parse().unwrap(),
        SecretString::from("dev-key".to_string()),
    );
    config.counters_poll_interval = Duration::ZERO;
    config.refresh_interval = Duration::ZERO;
    config.reorder_persistence = persistence;

    let client =
        ApiClient::from_api_key(&server.uri(), &key, &TransportConfig::default()).unwrap();
    let controller = Controller::with_client(config, client);
    controller.connect().await.unwrap();
    controller
}

fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}

fn rule_order(controller: &Controller) -> Vec<(String, i64)> {
    controller
        .rules_snapshot()
        .iter()
        .map(|r| (r.id.to_string(), r.position))
        .collect()
}

// ── Loading ─────────────────────────────────────────────────────────

#[tokio::test]
async fn connect_loads_every_collection_in_server_order() {
    let server = MockServer::start().await;
    mount_snapshot(
        &server,
        vec![rule_json("b", 1), rule_json("a", 0)],
        vec![nat_json("n1", 0)],
    )
    .await;

    let controller = connected(&server, ReorderPersistence::Manual).await;

    assert_eq!(
        rule_order(&controller),
        vec![("a".to_owned(), 0), ("b".to_owned(), 1)]
    );
    assert_eq!(controller.nat_rules_snapshot().len(), 1);
    assert!(controller.zones_snapshot().is_empty());
    assert!(controller.firewall_config().unwrap().ip_forwarding);
    assert!(!controller.draft_dirty());
}

#[tokio::test]
async fn failed_rule_load_is_notified_with_prefix() {
    let server = MockServer::start().await;
    mount_snapshot(&server, vec![], vec![]).await;
    let controller = connected(&server, ReorderPersistence::Manual).await;

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/api/rules"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "db locked" })))
        .mount(&server)
        .await;

    let mut rx = controller.notifications();
    assert!(!controller.load_rules().await);

    let notes = drain(&mut rx);
    assert_eq!(notes.len(), 1);
    assert!(notes[0].is_error());
    assert_eq!(notes[0].message, "Failed to fetch rules: db locked");
}

// ── Reorder ─────────────────────────────────────────────────────────

#[tokio::test]
async fn moving_last_rule_to_front_then_persisting() {
    let server = MockServer::start().await;
    mount_snapshot(
        &server,
        vec![rule_json("A", 0), rule_json("B", 1), rule_json("C", 2)],
        vec![],
    )
    .await;
    let controller = connected(&server, ReorderPersistence::Manual).await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/api/rules/[ABC]$"))
        .respond_with(EchoRule)
        .expect(3)
        .mount(&server)
        .await;

    assert!(controller.reorder_rules(2, 0).await);
    assert_eq!(
        rule_order(&controller),
        vec![
            ("C".to_owned(), 0),
            ("A".to_owned(), 1),
            ("B".to_owned(), 2)
        ]
    );
    assert!(controller.draft_dirty());

    assert!(controller.persist_rule_order().await);
    assert_eq!(
        rule_order(&controller),
        vec![
            ("C".to_owned(), 0),
            ("A".to_owned(), 1),
            ("B".to_owned(), 2)
        ]
    );

    // Everything confirmed: a second persist has nothing to send.
    assert!(controller.persist_rule_order().await);
}

#[tokio::test]
async fn immediate_persistence_writes_after_move() {
    let server = MockServer::start().await;
    mount_snapshot(&server, vec![rule_json("A", 0), rule_json("B", 1)], vec![]).await;
    let controller = connected(&server, ReorderPersistence::Immediate).await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/api/rules/[AB]$"))
        .respond_with(EchoRule)
        .expect(2)
        .mount(&server)
        .await;

    let a = EntityId::from("A");
    let b = EntityId::from("B");
    assert!(controller.move_rule(&a, &b).await);
    assert_eq!(
        rule_order(&controller),
        vec![("B".to_owned(), 0), ("A".to_owned(), 1)]
    );
}

#[tokio::test]
async fn out_of_range_reorder_is_rejected_locally() {
    let server = MockServer::start().await;
    mount_snapshot(&server, vec![rule_json("A", 0), rule_json("B", 1)], vec![]).await;
    let controller = connected(&server, ReorderPersistence::Immediate).await;

    let mut rx = controller.notifications();
    assert!(!controller.reorder_rules(0, 7).await);
    assert_eq!(
        rule_order(&controller),
        vec![("A".to_owned(), 0), ("B".to_owned(), 1)]
    );
    assert!(drain(&mut rx)[0].is_error());
    assert!(!controller.draft_dirty());
}

// ── CRUD ────────────────────────────────────────────────────────────

#[tokio::test]
async fn created_rule_matches_a_fresh_load() {
    let server = MockServer::start().await;
    mount_snapshot(&server, vec![rule_json("A", 0)], vec![]).await;
    let controller = connected(&server, ReorderPersistence::Manual).await;

    Mock::given(method("POST"))
        .and(path("/api/rules"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "rule": rule_json("B", 1) })))
        .expect(1)
        .mount(&server)
        .await;

    let mut rx = controller.notifications();
    let created = controller
        .create_rule(CreateRuleRequest {
            comment: "B".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.position, 1);
    assert_eq!(drain(&mut rx)[0].message, "Rule created");
    let after_create = rule_order(&controller);

    server.reset().await;
    mount_snapshot(&server, vec![rule_json("A", 0), rule_json("B", 1)], vec![]).await;
    assert!(controller.load_rules().await);
    assert_eq!(rule_order(&controller), after_create);
}

#[tokio::test]
async fn deleting_a_rule_closes_the_gap() {
    let server = MockServer::start().await;
    mount_snapshot(
        &server,
        vec![rule_json("A", 0), rule_json("B", 1), rule_json("C", 2)],
        vec![],
    )
    .await;
    let controller = connected(&server, ReorderPersistence::Manual).await;

    Mock::given(method("DELETE"))
        .and(path("/api/rules/B"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    assert!(controller.delete_rule(&EntityId::from("B")).await);
    assert_eq!(
        rule_order(&controller),
        vec![("A".to_owned(), 0), ("C".to_owned(), 1)]
    );
}

#[tokio::test]
async fn failed_update_leaves_rule_untouched() {
    let server = MockServer::start().await;
    mount_snapshot(&server, vec![rule_json("A", 0)], vec![]).await;
    let controller = connected(&server, ReorderPersistence::Manual).await;

    Mock::given(method("PUT"))
        .and(path("/api/rules/A"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "bad port" })))
        .mount(&server)
        .await;

    let mut rx = controller.notifications();
    let result = controller
        .update_rule(
            &EntityId::from("A"),
            UpdateRuleRequest {
                dst_port: Some("99999".into()),
                ..Default::default()
            },
        )
        .await;

    assert!(result.is_none());
    assert_eq!(drain(&mut rx)[0].message, "Save failed: bad port");
    assert_eq!(controller.rules_snapshot()[0].dst_port, "");
}

#[tokio::test]
async fn nat_rule_without_target_never_leaves_the_process() {
    let server = MockServer::start().await;
    mount_snapshot(&server, vec![], vec![]).await;
    let controller = connected(&server, ReorderPersistence::Manual).await;

    Mock::given(method("POST"))
        .and(path("/api/nat-rules"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let mut rx = controller.notifications();
    let created = controller
        .create_nat_rule(CreateNatRuleRequest {
            name: "masq".into(),
            ..Default::default()
        })
        .await;

    assert!(created.is_none());
    let notes = drain(&mut rx);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].message, "NAT IP is required");
    assert!(controller.nat_rules_snapshot().is_empty());
}

// ── Zones / interfaces ──────────────────────────────────────────────

fn zone_json(id: &str, name: &str, target: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "",
        "target": target,
        "inPolicy": "ACCEPT",
        "outPolicy": "ACCEPT"
    })
}

#[tokio::test]
async fn zone_create_update_delete() {
    let server = MockServer::start().await;
    mount_snapshot(&server, vec![], vec![]).await;
    let controller = connected(&server, ReorderPersistence::Manual).await;

    Mock::given(method("POST"))
        .and(path("/api/zones"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "zone": zone_json("z1", "dmz", "DROP") })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/zones/z1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "zone": zone_json("z1", "dmz", "REJECT") })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/zones/z1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut rx = controller.notifications();
    let zone = controller
        .create_zone(CreateZoneRequest {
            name: "dmz".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(zone.id, EntityId::from("z1"));
    assert_eq!(controller.zones_snapshot().len(), 1);

    let updated = controller
        .update_zone(&zone.id, UpdateZoneRequest {
            target: Some(Policy::Reject),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.target, Policy::Reject);
    assert_eq!(controller.zones_snapshot()[0].target, Policy::Reject);

    assert!(controller.delete_zone(&zone.id).await);
    assert!(controller.zones_snapshot().is_empty());

    let messages: Vec<_> = drain(&mut rx).into_iter().map(|n| n.message).collect();
    assert_eq!(messages, vec!["Zone created", "Zone updated", "Zone deleted"]);
}

#[tokio::test]
async fn interface_create_update_delete() {
    let server = MockServer::start().await;
    mount_snapshot(&server, vec![], vec![]).await;
    let controller = connected(&server, ReorderPersistence::Manual).await;

    let iface = |enabled: bool| {
        json!({ "interface": {
            "id": "i1", "name": "eth0", "zone": "dmz", "enabled": enabled, "notes": ""
        }})
    };
    Mock::given(method("POST"))
        .and(path("/api/interfaces"))
        .respond_with(ResponseTemplate::new(201).set_body_json(iface(true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/interfaces/i1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(iface(false)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/interfaces/i1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut rx = controller.notifications();
    let created = controller
        .create_interface(CreateInterfaceRequest {
            name: "eth0".into(),
            zone: "dmz".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.zone, "dmz");

    let updated = controller
        .update_interface(&created.id, UpdateInterfaceRequest {
            enabled: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(!updated.enabled);
    assert!(!controller.interfaces_snapshot()[0].enabled);

    assert!(controller.delete_interface(&created.id).await);
    assert!(controller.interfaces_snapshot().is_empty());

    let messages: Vec<_> = drain(&mut rx).into_iter().map(|n| n.message).collect();
    assert_eq!(
        messages,
        vec!["Interface created", "Interface updated", "Interface deleted"]
    );
}

#[tokio::test]
async fn nameless_zone_and_interface_never_leave_the_process() {
    let server = MockServer::start().await;
    mount_snapshot(&server, vec![], vec![]).await;
    let controller = connected(&server, ReorderPersistence::Manual).await;

    for p in ["/api/zones", "/api/interfaces"] {
        Mock::given(method("POST"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;
    }

    let mut rx = controller.notifications();
    assert!(
        controller
            .create_zone(CreateZoneRequest::default())
            .await
            .is_none()
    );
    assert!(
        controller
            .create_interface(CreateInterfaceRequest::default())
            .await
            .is_none()
    );

    let messages: Vec<_> = drain(&mut rx).into_iter().map(|n| n.message).collect();
    assert_eq!(
        messages,
        vec!["Zone name is required", "Interface name is required"]
    );
    assert!(controller.zones_snapshot().is_empty());
    assert!(controller.interfaces_snapshot().is_empty());
}

// ── Apply / rollback ────────────────────────────────────────────────

#[tokio::test]
async fn failed_apply_notifies_once_and_keeps_draft() {
    let server = MockServer::start().await;
    mount_snapshot(&server, vec![rule_json("A", 0), rule_json("B", 1)], vec![]).await;
    let controller = connected(&server, ReorderPersistence::Manual).await;

    Mock::given(method("POST"))
        .and(path("/api/apply"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "error": "iptables-restore: line 3 failed" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    controller.reorder_rules(1, 0).await;
    let before = rule_order(&controller);

    let mut rx = controller.notifications();
    let err = controller.apply_rules().await.unwrap_err();
    assert_eq!(err.to_string(), "iptables-restore: line 3 failed");

    let notes = drain(&mut rx);
    assert_eq!(notes.len(), 1);
    assert_eq!(
        notes[0].message,
        "Apply failed: iptables-restore: line 3 failed"
    );
    assert_eq!(rule_order(&controller), before);
    assert!(controller.draft_dirty());
    assert_eq!(controller.workflow_state(), WorkflowState::Idle);
}

#[tokio::test]
async fn successful_apply_clears_draft_flag() {
    let server = MockServer::start().await;
    mount_snapshot(&server, vec![rule_json("A", 0), rule_json("B", 1)], vec![]).await;
    let controller = connected(&server, ReorderPersistence::Manual).await;

    Mock::given(method("POST"))
        .and(path("/api/apply"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "applied" })))
        .mount(&server)
        .await;

    controller.reorder_rules(1, 0).await;
    assert!(controller.draft_dirty());

    let mut rx = controller.notifications();
    controller.apply_rules().await.unwrap();
    assert_eq!(drain(&mut rx)[0].message, "Ruleset applied to kernel");
    assert!(!controller.draft_dirty());
    assert!(!controller.applying());
}

#[tokio::test]
async fn rollback_refetches_both_ordered_collections() {
    let server = MockServer::start().await;
    mount_snapshot(&server, vec![rule_json("A", 0)], vec![nat_json("n1", 0)]).await;
    let controller = connected(&server, ReorderPersistence::Manual).await;

    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/api/rollback"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "rolled back" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rules": [rule_json("old", 0)]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/nat-rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "natRules": null })))
        .expect(1)
        .mount(&server)
        .await;

    let mut rx = controller.notifications();
    controller.rollback().await.unwrap();

    assert_eq!(rule_order(&controller), vec![("old".to_owned(), 0)]);
    assert!(controller.nat_rules_snapshot().is_empty());
    assert_eq!(drain(&mut rx)[0].message, "Rolled back to previous snapshot");
}

#[tokio::test]
async fn failed_rollback_notifies_once_and_returns_to_idle() {
    let server = MockServer::start().await;
    mount_snapshot(&server, vec![rule_json("A", 0)], vec![]).await;
    let controller = connected(&server, ReorderPersistence::Manual).await;

    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/api/rollback"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "no snapshot to restore" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/api/(rules|nat-rules)$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rules": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let mut rx = controller.notifications();
    let err = controller.rollback().await.unwrap_err();
    assert_eq!(err.to_string(), "no snapshot to restore");

    let notes = drain(&mut rx);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].message, "Rollback failed: no snapshot to restore");
    assert_eq!(controller.workflow_state(), WorkflowState::Idle);
    assert!(!controller.applying());
    assert_eq!(rule_order(&controller), vec![("A".to_owned(), 0)]);
}
