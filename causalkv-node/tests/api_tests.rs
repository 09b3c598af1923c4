use std::sync::Arc;
use causalkv_clock::VectorClock;
use causalkv_node::build_router;
use causalkv_replication::transport::mock::MockTransport;
use causalkv_replication::{
    ErrorMessage, Peer, ReadResponse, ReplicaMessage, ReplicaStatus, ReplicateAck,
    ReplicationConfig, ReplicationEngine, StatusResponse, WriteResponse,
};
use causalkv_types::NodeId;
use pretty_assertions::assert_eq;
use serde_json::json;

fn n(id: &str) -> NodeId {
    NodeId::new(id)
}

fn engine() -> Arc<ReplicationEngine> {
    let members = ["http://n0", "http://n1", "http://n2"]
        .iter()
        .map(|e| Peer::from_endpoint(e).unwrap())
        .collect();
    Arc::new(ReplicationEngine::new(
        n("n0"),
        members,
        ReplicationConfig::default(),
        Arc::new(MockTransport::new()),
    ))
}

/// Spin up the HTTP server on an OS-assigned port, returning the base URL.
async fn spawn_test_server(engine: Arc<ReplicationEngine>) -> String {
    let app = build_router(engine);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

async fn post_write(base: &str, body: serde_json::Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/write", base))
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn post_replica(base: &str, message: &ReplicaMessage) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/replicate", base))
        .json(message)
        .send()
        .await
        .unwrap()
}

// ── /write and /read ─────────────────────────────────────────────

#[tokio::test]
async fn write_returns_success_and_clock() {
    let base = spawn_test_server(engine()).await;
    let resp = post_write(&base, json!({"key": "x", "value": 1})).await;
    assert_eq!(resp.status(), 200);

    let body: WriteResponse = resp.json().await.unwrap();
    assert_eq!(body.status, "success");
    assert_eq!(
        body.clock,
        VectorClock::from([(n("n0"), 1), (n("n1"), 0), (n("n2"), 0)])
    );
}

#[tokio::test]
async fn read_after_write_returns_value_and_clock() {
    let base = spawn_test_server(engine()).await;
    post_write(&base, json!({"key": "x", "value": {"a": [1, 2]}})).await;

    let resp = reqwest::get(format!("{}/read/x", base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: ReadResponse = resp.json().await.unwrap();
    assert_eq!(body.value, json!({"a": [1, 2]}));
    assert_eq!(body.clock.get(&n("n0")), 1);
}

#[tokio::test]
async fn read_missing_key_returns_404() {
    let base = spawn_test_server(engine()).await;
    let resp = reqwest::get(format!("{}/read/nope", base)).await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: ErrorMessage = resp.json().await.unwrap();
    assert_eq!(body.error, "key not found");
}

#[tokio::test]
async fn write_without_key_is_rejected() {
    let engine = engine();
    let base = spawn_test_server(engine.clone()).await;

    let resp = post_write(&base, json!({"value": 1})).await;
    assert_eq!(resp.status(), 400);
    let resp = post_write(&base, json!({"key": "", "value": 1})).await;
    assert_eq!(resp.status(), 400);
    let resp = post_write(&base, json!({"key": "x", "value": null})).await;
    assert_eq!(resp.status(), 400);

    assert_eq!(engine.clock().await.get(&n("n0")), 0);
}

#[tokio::test]
async fn write_response_content_type_is_json() {
    let base = spawn_test_server(engine()).await;
    let resp = post_write(&base, json!({"key": "x", "value": 1})).await;
    let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.contains("application/json"));
}

// ── /replicate ───────────────────────────────────────────────────

#[tokio::test]
async fn replicate_applies_ready_and_buffers_early_replicas() {
    let engine = engine();
    let base = spawn_test_server(engine.clone()).await;

    let first = ReplicaMessage::new("a", json!(1), VectorClock::from([(n("n1"), 1)]), n("n1"));
    let second = ReplicaMessage::new("b", json!(2), VectorClock::from([(n("n1"), 2)]), n("n1"));

    let resp = post_replica(&base, &second).await;
    assert_eq!(resp.status(), 200);
    let ack: ReplicateAck = resp.json().await.unwrap();
    assert_eq!(ack.status, ReplicaStatus::Buffered);

    let status: StatusResponse = reqwest::get(format!("{}/status", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status.buffer_depth, 1);

    let ack: ReplicateAck = post_replica(&base, &first).await.json().await.unwrap();
    assert_eq!(ack.status, ReplicaStatus::Applied);

    assert_eq!(engine.drain_once().await, 1);
    let resp = reqwest::get(format!("{}/read/b", base)).await.unwrap();
    assert_eq!(resp.status(), 200);

    let ack: ReplicateAck = post_replica(&base, &first).await.json().await.unwrap();
    assert_eq!(ack.status, ReplicaStatus::Buffered);
}

#[tokio::test]
async fn replicate_buffers_replica_without_sender_entry() {
    let base = spawn_test_server(engine()).await;
    let orphan = ReplicaMessage::new("a", json!(1), VectorClock::from([(n("n2"), 1)]), n("n1"));
    let resp = post_replica(&base, &orphan).await;
    assert_eq!(resp.status(), 200);
    let ack: ReplicateAck = resp.json().await.unwrap();
    assert_eq!(ack.status, ReplicaStatus::Buffered);
}

#[tokio::test]
async fn replicate_rejects_replica_sent_from_this_node() {
    let base = spawn_test_server(engine()).await;
    let echo = ReplicaMessage::new("a", json!(1), VectorClock::from([(n("n0"), 1)]), n("n0"));
    let resp = post_replica(&base, &echo).await;
    assert_eq!(resp.status(), 400);
    let body: ErrorMessage = resp.json().await.unwrap();
    assert!(body.error.contains("this node"));
}

#[tokio::test]
async fn replicate_rejects_malformed_body() {
    let base = spawn_test_server(engine()).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/replicate", base))
        .json(&json!({"key": "a"}))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}

// ── /status ──────────────────────────────────────────────────────

#[tokio::test]
async fn status_reports_node_data_and_clock() {
    let base = spawn_test_server(engine()).await;
    post_write(&base, json!({"key": "x", "value": "hello"})).await;

    let resp = reqwest::get(format!("{}/status", base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "node": "n0",
            "data": {"x": "hello"},
            "clock": {"n0": 1, "n1": 0, "n2": 0},
            "buffer_depth": 0
        })
    );
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let base = spawn_test_server(engine()).await;
    let resp = reqwest::get(format!("{}/nonexistent", base)).await.unwrap();
    assert_eq!(resp.status(), 404);
}
