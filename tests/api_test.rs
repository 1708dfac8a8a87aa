//! Integration tests for the task REST API.
//! Binds the real router on a random port and drives it over HTTP.

use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

use taskd::{
    config::ServerConfig,
    rest,
    storage::Storage,
    tasks::{TaskService, TaskStore},
    AppContext,
};

/// Find a free local port by binding to port 0.
fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Start a server over a scratch database; returns its base URL.
async fn spawn_server(dir: &TempDir) -> String {
    let port = find_free_port();
    let mut config = ServerConfig::default();
    config.port = port;
    config.data_dir = dir.path().to_path_buf();

    let storage = Arc::new(Storage::new(&config.data_dir).await.unwrap());
    let tasks = TaskService::new(TaskStore::new(storage.pool()));
    let ctx = Arc::new(AppContext {
        config: Arc::new(config),
        storage,
        tasks,
        started_at: std::time::Instant::now(),
    });

    let router = rest::build_router(ctx);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://127.0.0.1:{port}")
}

async fn create_task(client: &reqwest::Client, base: &str, body: Value) -> reqwest::Response {
    client
        .post(format!("{base}/tasks"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn create_returns_201_with_defaulted_status() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    let res = create_task(&client, &base, json!({ "title": "Buy milk" })).await;
    assert_eq!(res.status(), 201);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Task created successfully");
    assert_eq!(body["data"]["title"], "Buy milk");
    assert_eq!(body["data"]["status"], "pending");

    let id = body["data"]["id"].as_str().unwrap();
    assert_eq!(id.len(), 24);
    assert!(id.bytes().all(|b| b.is_ascii_hexdigit()));
    assert!(body["data"]["createdAt"].is_string());
    assert!(body["data"]["updatedAt"].is_string());
}

#[tokio::test]
async fn create_rejects_blank_title() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    let res = create_task(&client, &base, json!({ "title": "   " })).await;
    assert_eq!(res.status(), 400);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Task title is required");
}

#[tokio::test]
async fn list_paginates_newest_first() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    for i in 0..3 {
        let res = create_task(&client, &base, json!({ "title": format!("task {i}") })).await;
        assert_eq!(res.status(), 201);
    }

    let res = client
        .get(format!("{base}/tasks?page=1&limit=2"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["title"], "task 2");
    assert_eq!(body["data"][1]["title"], "task 1");

    let p = &body["pagination"];
    assert_eq!(p["currentPage"], 1);
    assert_eq!(p["totalPages"], 2);
    assert_eq!(p["totalTasks"], 3);
    assert_eq!(p["limit"], 2);
    assert_eq!(p["hasNextPage"], true);
    assert_eq!(p["hasPrevPage"], false);

    let res = client
        .get(format!("{base}/tasks?page=2&limit=2"))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["title"], "task 0");
    assert_eq!(body["pagination"]["hasNextPage"], false);
    assert_eq!(body["pagination"]["hasPrevPage"], true);
}

#[tokio::test]
async fn list_rejects_limit_zero() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{base}/tasks?limit=0"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "Invalid pagination parameters. Page must be >= 1 and limit must be between 1 and 100"
    );
}

#[tokio::test]
async fn list_ignores_unknown_status_filter() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    create_task(&client, &base, json!({ "title": "a" })).await;
    create_task(&client, &base, json!({ "title": "b", "status": "completed" })).await;

    let res = client
        .get(format!("{base}/tasks?status=archived"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["count"], 2);

    let res = client
        .get(format!("{base}/tasks?status=completed"))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["title"], "b");
}

#[tokio::test]
async fn patch_updates_status_and_rejects_bad_input() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    let res = create_task(&client, &base, json!({ "title": "a" })).await;
    let created: Value = res.json().await.unwrap();
    let id = created["data"]["id"].as_str().unwrap().to_string();

    // Invalid status value.
    let res = client
        .patch(format!("{base}/tasks/{id}"))
        .json(&json!({ "status": "archived" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Status must be either 'pending' or 'completed'");

    // Malformed id.
    let res = client
        .patch(format!("{base}/tasks/not-hex"))
        .json(&json!({ "status": "completed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid task ID format");

    // Well-formed but absent id.
    let res = client
        .patch(format!("{base}/tasks/ffffffffffffffffffffffff"))
        .json(&json!({ "status": "completed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Task not found");

    // Success path.
    let res = client
        .patch(format!("{base}/tasks/{id}"))
        .json(&json!({ "status": "completed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Task status updated successfully");
    assert_eq!(body["data"]["status"], "completed");
}

#[tokio::test]
async fn delete_is_permanent_and_reports_missing_rows() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    let res = create_task(&client, &base, json!({ "title": "a" })).await;
    let created: Value = res.json().await.unwrap();
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let res = client
        .delete(format!("{base}/tasks/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Task deleted successfully");
    assert_eq!(body["data"]["id"], id.as_str());

    // Gone now.
    let res = client
        .delete(format!("{base}/tasks/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Task not found");
}

#[tokio::test]
async fn malformed_request_input_keeps_the_error_envelope() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    // Non-numeric pagination parameter.
    let res = client
        .get(format!("{base}/tasks?page=abc"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("page"));

    // Body that is not JSON at all.
    let res = client
        .post(format!("{base}/tasks"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn astronomically_large_page_is_an_empty_page() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    create_task(&client, &base, json!({ "title": "a" })).await;

    let res = client
        .get(format!("{base}/tasks?page=9223372036854775807&limit=100"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["count"], 0);
    assert_eq!(body["pagination"]["totalTasks"], 1);
    assert_eq!(body["pagination"]["hasNextPage"], false);
    assert_eq!(body["pagination"]["hasPrevPage"], true);
}

#[tokio::test]
async fn unmatched_routes_get_the_404_envelope() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{base}/nope/nothing"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route not found - /nope/nothing");
}

#[tokio::test]
async fn health_reports_running() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    let res = client.get(&base).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Task Manager API is running");
    assert!(body["version"].is_string());
}
