//! Integration tests for the HTTP API against a real listener.
//!
//! A throwaway search endpoint stands in for the remote documentation
//! service so the primary and fallback paths can both be exercised.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{routing::post, Json, Router};
use escape_room_engine::{create_router, AppState, Config, HintProviderKind};
use serde_json::{json, Value};

/// Serves `router` on an ephemeral port and returns its base URL.
async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });
    format!("http://{addr}")
}

/// Search endpoint that counts requests and returns one result.
async fn spawn_search(calls: Arc<AtomicUsize>) -> String {
    let app = Router::new().route(
        "/search",
        post(move |Json(body): Json<Value>| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let query = body["query"].as_str().unwrap_or_default().to_string();
                Json(json!({
                    "results": [{
                        "title": "Overview",
                        "snippet": format!("<em>Docs</em> for {query}"),
                        "url": "https://learn.example/overview"
                    }]
                }))
            }
        }),
    );
    format!("{}/search", spawn(app).await)
}

fn remote_config(endpoint: String) -> Config {
    let mut config = Config::default();
    config.hints.provider = HintProviderKind::Remote;
    config.hints.endpoint = endpoint;
    config.hints.timeout_ms = 1000;
    config
}

async fn spawn_api(config: Config) -> String {
    let state = AppState::new(config).expect("app state");
    spawn(create_router(state)).await
}

#[tokio::test]
async fn test_remote_hint_is_primary() {
    let calls = Arc::new(AtomicUsize::new(0));
    let endpoint = spawn_search(Arc::clone(&calls)).await;
    let base = spawn_api(remote_config(endpoint)).await;

    let body: Value = reqwest::Client::new()
        .post(format!("{base}/api/hints"))
        .json(&json!({
            "scenarioId": "scenario-4-prompt-injection",
            "category": "agent-safety",
            "selectedControlIds": ["prompt-hardening"],
            "hintsUsed": 1
        }))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");

    assert_eq!(body["source"], "primary");
    assert_eq!(body["learnMoreUrl"], "https://learn.example/overview");
    assert_eq!(body["category"], "agent-safety");
    let hint = body["hint"].as_str().expect("hint text");
    assert!(hint.starts_with("Docs for prompt injection"));
    assert!(!hint.contains('<'));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unreachable_remote_falls_back() {
    // Port 9 (discard) is not listening on test machines.
    let base = spawn_api(remote_config("http://127.0.0.1:9/search".to_string())).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/hints"))
        .json(&json!({"scenarioId": "scenario-1-leaky-sharepoint"}))
        .send()
        .await
        .expect("request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["source"], "fallback");
    assert!(!body["hint"].as_str().expect("hint text").is_empty());
}

#[tokio::test]
async fn test_quota_refused_before_remote_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let endpoint = spawn_search(Arc::clone(&calls)).await;
    let base = spawn_api(remote_config(endpoint)).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/hints"))
        .json(&json!({"scenarioId": "scenario-1-leaky-sharepoint", "hintsUsed": 3}))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["error"], "Maximum hints reached for this game");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_hint_info_and_catalog() {
    let base = spawn_api(Config::default()).await;
    let client = reqwest::Client::new();

    let info: Value = client
        .get(format!("{base}/api/hints"))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(info, json!({"maxHintsPerSession": 3, "provider": "remote"}));

    let scenarios: Value = client
        .get(format!("{base}/api/scenarios"))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(scenarios.as_array().map(Vec::len), Some(5));
}

#[tokio::test]
async fn test_grade_round_trip() {
    let base = spawn_api(Config::default()).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/grade"))
        .json(&json!({
            "scenarioId": "scenario-5-shadow-connector",
            "selectedControlIds": ["connector-allowlist", "mfa-enforcement"]
        }))
        .send()
        .await
        .expect("request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("json");
    // 1/3 required = 23.33, one anti-pattern = -4
    assert_eq!(body["score"], 19);
    assert_eq!(body["grade"], "F");
    assert_eq!(body["unnecessaryPicks"][0]["controlId"], "mfa-enforcement");
}
