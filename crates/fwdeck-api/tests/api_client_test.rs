#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fwdeck_api::types::{Action, Chain, NatType, Protocol, RuleBody};
use fwdeck_api::{ApiClient, Error, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let key = SecretString::from("dev-key".to_string());
    let client =
        ApiClient::from_api_key(&server.uri(), &key, &TransportConfig::default()).unwrap();
    (server, client)
}

fn rule_json(id: &str, position: i64) -> serde_json::Value {
    json!({
        "id": id,
        "chain": "INPUT",
        "protocol": "tcp",
        "src": "",
        "dst": "",
        "srcPort": "",
        "dstPort": "22",
        "action": "ACCEPT",
        "enabled": true,
        "comment": "ssh",
        "position": position,
        "createdAt": "2025-03-01T12:00:00Z",
        "updatedAt": "2025-03-01T12:00:00Z"
    })
}

fn ssh_body(position: i64) -> RuleBody {
    RuleBody {
        chain: Chain::Input,
        protocol: Protocol::Tcp,
        src: String::new(),
        dst: String::new(),
        src_port: String::new(),
        dst_port: "22".into(),
        action: Action::Accept,
        enabled: true,
        comment: "ssh".into(),
        position,
    }
}

// ── Auth ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_bearer_header_is_sent() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/rules"))
        .and(header("authorization", "Bearer dev-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rules": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let rules = client.list_rules().await.unwrap();
    assert!(rules.is_empty());
}

#[tokio::test]
async fn test_invalid_key_surfaces_server_message() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/zones"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "error": "invalid api key" })),
        )
        .mount(&server)
        .await;

    let err = client.list_zones().await.unwrap_err();
    assert!(err.is_auth(), "expected auth error, got: {err:?}");
    assert_eq!(err.message(), "invalid api key");
}

// ── Rules ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_rules_unwraps_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/rules"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "rules": [rule_json("r1", 0), rule_json("r2", 1)] })),
        )
        .mount(&server)
        .await;

    let rules = client.list_rules().await.unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].id, "r1");
    assert_eq!(rules[1].position, 1);
    assert_eq!(rules[0].dst_port, "22");
    assert!(rules[0].created_at.is_some());
}

#[tokio::test]
async fn test_null_list_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/nat-rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "natRules": null })))
        .mount(&server)
        .await;

    assert!(client.list_nat_rules().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_rule_posts_body() {
    let (server, client) = setup().await;

    let body = ssh_body(3);
    Mock::given(method("POST"))
        .and(path("/api/rules"))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "rule": rule_json("new", 3) })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client.create_rule(&body).await.unwrap();
    assert_eq!(created.id, "new");
    assert_eq!(created.position, 3);
}

#[tokio::test]
async fn test_update_rule_targets_id() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/rules/r7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rule": rule_json("r7", 0) })))
        .expect(1)
        .mount(&server)
        .await;

    let updated = client.update_rule("r7", &ssh_body(0)).await.unwrap();
    assert_eq!(updated.id, "r7");
}

#[tokio::test]
async fn test_delete_rule_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/rules/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "rule not found" })))
        .mount(&server)
        .await;

    let err = client.delete_rule("gone").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "rule not found");
}

// ── NAT ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_nat_rule_field_spelling() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/nat-rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "natRules": [{
                "id": "n1",
                "name": "web",
                "type": "DNAT",
                "protocol": "tcp",
                "inInterface": "eth0",
                "outInterface": "",
                "sourceIP": "",
                "sourcePort": "",
                "destIP": "",
                "destPort": "443",
                "nattoIP": "10.0.0.5",
                "nattoPort": "8443",
                "comment": "",
                "enabled": true,
                "position": 0
            }]
        })))
        .mount(&server)
        .await;

    let nat = client.list_nat_rules().await.unwrap();
    assert_eq!(nat[0].nat_type, NatType::Dnat);
    assert_eq!(nat[0].natto_ip, "10.0.0.5");
    assert_eq!(nat[0].in_interface, "eth0");
}

// ── Config / control ────────────────────────────────────────────────

#[tokio::test]
async fn test_update_config_posts_flags() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/config"))
        .and(body_json(json!({ "ipForwarding": true, "natEnabled": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "config": { "id": "c1", "ipForwarding": true, "natEnabled": false }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = client
        .update_config(&fwdeck_api::types::ConfigUpdateBody {
            ip_forwarding: true,
            nat_enabled: false,
        })
        .await
        .unwrap();
    assert!(cfg.ip_forwarding);
    assert!(!cfg.nat_enabled);
}

#[tokio::test]
async fn test_apply_failure_message() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/apply"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "iptables-restore: line 4 failed" })),
        )
        .mount(&server)
        .await;

    let err = client.apply().await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 500, .. }));
    assert_eq!(err.message(), "iptables-restore: line 4 failed");
}

#[tokio::test]
async fn test_error_without_json_falls_back_to_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/rollback"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client.rollback().await.unwrap_err();
    assert_eq!(err.message(), "bad gateway");
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_empty_error_body_uses_status_reason() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/apply"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client.apply().await.unwrap_err();
    assert_eq!(err.message(), "503 Service Unavailable");
}

#[tokio::test]
async fn test_counters_and_health() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/counters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "counters": [{ "chain": "INPUT", "rule": "r1", "packets": 12, "bytes": 4096 }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "ok", "service": "fwd" })),
        )
        .mount(&server)
        .await;

    let counters = client.list_counters().await.unwrap();
    assert_eq!(counters[0].bytes, 4096);
    assert_eq!(counters[0].chain, Chain::Input);

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.service.as_deref(), Some("fwd"));
}

#[tokio::test]
async fn test_malformed_success_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/interfaces"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.list_interfaces().await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }));
}
