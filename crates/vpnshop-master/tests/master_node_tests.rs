// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire-level tests for the master node adapter against a wiremock server.

use serde_json::json;
use vpnshop_config::model::MasterConfig;
use vpnshop_core::types::{CreateConfigRequest, RenewConfigRequest, TaskPhase};
use vpnshop_core::{Orchestrator, VpnshopError};
use vpnshop_master::MasterNode;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn master_for(server: &MockServer) -> MasterNode {
    MasterNode::new(&MasterConfig {
        base_url: format!("{}/", server.uri()),
        ..MasterConfig::default()
    })
    .unwrap()
}

fn create_request() -> CreateConfigRequest {
    CreateConfigRequest {
        order_id: 42,
        connection_id: 7,
        tg_id: 1001,
        plan: "ready:standard:1".into(),
        server_id: "auto".into(),
        protocol: "wireguard".into(),
    }
}

#[tokio::test]
async fn create_config_posts_payload_and_returns_task_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/configs/create"))
        .and(body_json(json!({
            "order_id": 42,
            "connection_id": 7,
            "tg_id": 1001,
            "plan": "ready:standard:1",
            "server_id": "auto",
            "protocol": "wireguard"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {"task_id": "abc123"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let task_id = master_for(&server).create_config(&create_request()).await.unwrap();
    assert_eq!(task_id, "abc123");
}

#[tokio::test]
async fn renew_config_hits_renew_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/configs/renew"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {"id": "r-9"}})))
        .mount(&server)
        .await;

    let task_id = master_for(&server)
        .renew_config(&RenewConfigRequest {
            tg_id: 1001,
            renew_of: 7,
            connection_id: 8,
            server_id: "DE-1".into(),
            protocol: "vless".into(),
        })
        .await
        .unwrap();
    assert_eq!(task_id, "r-9");
}

#[tokio::test]
async fn http_500_is_orchestrator_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/configs/create"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = master_for(&server).create_config(&create_request()).await.unwrap_err();
    assert!(matches!(err, VpnshopError::Orchestrator { .. }));
    assert!(err.to_string().contains("Master node HTTP 500: boom"));
}

#[tokio::test]
async fn ok_false_invalid_json_and_missing_task_id_are_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/configs/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": false, "error": "no capacity"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/configs/renew"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let master = master_for(&server);
    let err = master.create_config(&create_request()).await.unwrap_err();
    assert!(err.to_string().contains("no capacity"));

    let renew = RenewConfigRequest {
        tg_id: 1,
        renew_of: 1,
        connection_id: 2,
        server_id: "x".into(),
        protocol: "wireguard".into(),
    };
    assert!(matches!(
        master.renew_config(&renew).await,
        Err(VpnshopError::Orchestrator { .. })
    ));
    assert!(master.get_task_status("broken").await.is_err());
}

#[tokio::test]
async fn missing_task_id_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/configs/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {"status": "queued"}})))
        .mount(&server)
        .await;

    let err = master_for(&server).create_config(&create_request()).await.unwrap_err();
    assert!(err.to_string().contains("no task_id"));
}

#[tokio::test]
async fn list_nodes_parses_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {"servers": [
                {"server_id": "DE-1", "country": "de", "ping_ms": 35, "status": "up", "white_ip": "1.2.3.4", "stats": ""},
                {"id": "FI-2", "ping": 12.7, "status": "Online"}
            ]}
        })))
        .mount(&server)
        .await;

    let nodes = master_for(&server).list_nodes().await.unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[1].server_id, "FI-2");
    assert_eq!(nodes[1].country, "fi");
    assert_eq!(nodes[1].ping_ms, 12);
    assert!(nodes[1].is_operational());
}

#[tokio::test]
async fn task_status_reads_config_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {"task_id": "abc123", "status": "done", "message": "ok", "config": "CFG-DATA"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks/bare"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "RUNNING"})))
        .mount(&server)
        .await;

    let master = master_for(&server);
    let task = master.get_task_status("abc123").await.unwrap();
    assert_eq!(task.phase(), TaskPhase::Ready("CFG-DATA".into()));

    let task = master.get_task_status("bare").await.unwrap();
    assert_eq!(task.task_id, "bare");
    assert_eq!(task.status, "running");
    assert_eq!(task.phase(), TaskPhase::Pending);
}

#[tokio::test]
async fn task_id_with_reserved_characters_stays_one_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks/job%2F7%20b%3Fx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"status": "pending", "message": "queued"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let master = master_for(&server);
    let task = master.get_task_status("job/7 b?x").await.unwrap();
    assert_eq!(task.task_id, "job/7 b?x");
    assert_eq!(task.phase(), TaskPhase::Pending);
}
