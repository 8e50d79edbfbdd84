//! Integration tests for the todo-assist-web server.
//!
//! These tests start a real axum server on a random port and exercise the
//! REST endpoints with the provider disabled, so every assistance answer
//! comes from the fallback catalog.

use std::sync::Arc;

use serde_json::{Value, json};
use todo_assist::api::{DisabledProvider, RetryConfig};
use todo_assist::config::{Assistant, GatewayConfig};
use todo_assist::domain::{InMemoryTodoStore, TodoService};
use todo_assist_web::{AppState, WebConfig, spawn_web};

/// Helper: spawn a test server on port 0 (random available port).
async fn spawn_test_server() -> String {
    let todos: Arc<dyn TodoService> = Arc::new(InMemoryTodoStore::new());
    let gateway = GatewayConfig::default()
        .with_retry(RetryConfig::immediate())
        .build_gateway_with(Arc::new(DisabledProvider::default()));
    let assistant = Assistant::new(gateway, todos).unwrap();

    let config = WebConfig {
        bind_addr: ([127, 0, 0, 1], 0).into(),
    };
    let addr = spawn_web(AppState::from(&assistant), config).await.unwrap();
    format!("http://{addr}")
}

async fn post(url: String, body: Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap()
}

// ── Assistance ───────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_provider() {
    let base = spawn_test_server().await;

    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["provider"], "disabled");
}

#[tokio::test]
async fn suggest_serves_fallback() {
    let base = spawn_test_server().await;

    let resp = post(
        format!("{base}/api/v1/ai/suggest"),
        json!({"description": "fix the login bug"}),
    )
    .await;
    assert_eq!(resp.status(), 200);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["source"], "fallback");
    assert_eq!(json["result"]["kind"], "suggestions");
}

#[tokio::test]
async fn prioritize_ranks_supplied_todos() {
    let base = spawn_test_server().await;

    let resp = post(
        format!("{base}/api/v1/ai/prioritize"),
        json!({"todos": [
            {"id": 1, "title": "water plants", "priority": "low"},
            {"id": 2, "title": "pay rent", "priority": "urgent"}
        ]}),
    )
    .await;
    assert_eq!(resp.status(), 200);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["result"]["ranked_todos"][0]["todo_id"], 2);
}

#[tokio::test]
async fn invalid_input_is_422() {
    let base = spawn_test_server().await;

    let resp = post(format!("{base}/api/v1/ai/breakdown"), json!({"task": "  "})).await;
    assert_eq!(resp.status(), 422);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"]["message"], "task must not be empty");
}

#[tokio::test]
async fn malformed_bodies_use_the_error_envelope() {
    let base = spawn_test_server().await;

    let resp = post(format!("{base}/api/v1/ai/suggest"), json!({})).await;
    assert_eq!(resp.status(), 422);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    let message = json["error"]["message"].as_str().unwrap();
    assert!(message.contains("description"), "{message}");

    let resp = post(format!("{base}/api/v1/tools/call"), json!({"arguments": {}})).await;
    assert_eq!(resp.status(), 422);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn cache_stats_count_hits() {
    let base = spawn_test_server().await;

    for _ in 0..2 {
        let resp = post(
            format!("{base}/api/v1/ai/breakdown"),
            json!({"task": "launch the website"}),
        )
        .await;
        assert_eq!(resp.status(), 200);
    }

    let json: Value = reqwest::get(format!("{base}/api/v1/ai/cache"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["entries"], 1);
    assert_eq!(json["hits"], 1);
}

// ── Tools ────────────────────────────────────────────────────────────

#[tokio::test]
async fn lists_tools_with_schemas() {
    let base = spawn_test_server().await;

    let json: Value = reqwest::get(format!("{base}/api/v1/tools"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let tools = json.as_array().unwrap();
    assert_eq!(tools.len(), 7);
    assert_eq!(tools[0]["name"], "create_todo");
    assert_eq!(tools[0]["inputSchema"]["type"], "object");
}

#[tokio::test]
async fn tool_calls_always_answer_200() {
    let base = spawn_test_server().await;

    let resp = post(
        format!("{base}/api/v1/tools/call"),
        json!({"name": "create_todo", "arguments": {"title": "Sort photos"}}),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["result"]["title"], "Sort photos");

    let resp = post(
        format!("{base}/api/v1/tools/call"),
        json!({"name": "nonexistent_tool", "arguments": {}}),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["code"], "UNKNOWN_TOOL");
}
