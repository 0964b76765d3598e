use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use std::{
    fs,
    path::PathBuf,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tower::ServiceExt;

use modelgate::config::Config;
use modelgate::db::EvalStorage;
use modelgate::router::{GateState, gate_router};
use modelgate::strategy::SelectionStrategy;

const GATE_KEY: &str = "pwd";

fn temp_db_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut path = std::env::temp_dir();
    path.push(format!(
        "modelgate-{}-{}-{}.sqlite",
        tag,
        std::process::id(),
        nanos
    ));
    path
}

async fn build_app(tag: &str) -> (Router, PathBuf) {
    let db_path = temp_db_path(tag);
    let database_url = format!("sqlite:{}", db_path.display());
    let storage = EvalStorage::connect(&database_url)
        .await
        .expect("storage init failed");
    let handle = modelgate::service::spawn(storage).await;

    let cfg = Config::default();
    let inference =
        modelgate::api::InferenceClient::from_config(reqwest::Client::new(), &cfg)
            .expect("inference client");

    let state = GateState::new(handle, inference, Arc::from(GATE_KEY));
    (gate_router(state), db_path)
}

fn strategy_document() -> SelectionStrategy {
    serde_json::from_value(serde_json::json!({
        "primary_model": "eu.amazon.nova-lite-v1:0",
        "fallback_models": ["eu.amazon.nova-micro-v1:0", "eu.amazon.nova-pro-v1:0"],
        "use_case_models": {
            "performance_optimized": "eu.amazon.nova-micro-v1:0",
            "accuracy_optimized": "eu.amazon.nova-pro-v1:0",
            "balanced": "eu.amazon.nova-lite-v1:0",
            "cost_optimized": "eu.amazon.nova-micro-v1:0"
        },
        "model_scores": []
    }))
    .expect("valid strategy document")
}

#[tokio::test]
async fn invoke_without_key_returns_401() {
    let (app, db_path) = build_app("auth").await;

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/invoke")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"prompt":"What is an IRA?"}"#))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let _ = fs::remove_file(&db_path);
}

#[tokio::test]
async fn invoke_route_returns_413_for_oversized_body() {
    let (app, db_path) = build_app("body-limit").await;

    let oversized_prompt = "a".repeat(2 * 1024 * 1024 + 1024);
    let oversized_payload = format!(r#"{{"prompt":"{oversized_prompt}"}}"#);

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/invoke")
                .header("content-type", "application/json")
                .header("x-api-key", GATE_KEY)
                .body(Body::from(oversized_payload))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let body_str = std::str::from_utf8(&body).expect("response body was not utf-8");
    assert!(body_str.contains(r#""code":"PAYLOAD_TOO_LARGE""#));
    assert!(body_str.contains(r#""message":"request body too large""#));

    let _ = fs::remove_file(&db_path);
}

#[tokio::test]
async fn invoke_before_any_publish_returns_503() {
    let (app, db_path) = build_app("no-strategy").await;

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/invoke")
                .header("content-type", "application/json")
                .header("x-api-key", GATE_KEY)
                .body(Body::from(r#"{"prompt":"What is an IRA?"}"#))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let body_str = std::str::from_utf8(&body).expect("response body was not utf-8");
    assert!(body_str.contains(r#""code":"NO_STRATEGY""#));

    let _ = fs::remove_file(&db_path);
}

#[tokio::test]
async fn empty_prompt_returns_400() {
    let (app, db_path) = build_app("empty-prompt").await;

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/invoke")
                .header("content-type", "application/json")
                .header("x-api-key", GATE_KEY)
                .body(Body::from(r#"{"prompt":"   "}"#))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let body_str = std::str::from_utf8(&body).expect("response body was not utf-8");
    assert!(body_str.contains(r#""code":"INVALID_REQUEST""#));

    let _ = fs::remove_file(&db_path);
}

#[tokio::test]
async fn published_strategy_is_served_and_survives_reload() {
    let (app, db_path) = build_app("publish").await;
    let document = strategy_document();

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/strategy")
                .header("content-type", "application/json")
                .header("x-api-key", GATE_KEY)
                .body(Body::from(
                    serde_json::to_string(&document).expect("serialize strategy"),
                ))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/v1/strategy")
                .header("x-api-key", GATE_KEY)
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let served: SelectionStrategy = serde_json::from_slice(&body).expect("strategy body");
    assert_eq!(served, document);

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/strategy/reload")
                .header("x-api-key", GATE_KEY)
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let reloaded: SelectionStrategy = serde_json::from_slice(&body).expect("strategy body");
    assert_eq!(reloaded.primary_model, "eu.amazon.nova-lite-v1:0");

    let _ = fs::remove_file(&db_path);
}

#[tokio::test]
async fn health_needs_no_key() {
    let (app, db_path) = build_app("health").await;

    let resp = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let _ = fs::remove_file(&db_path);
}

#[tokio::test]
async fn models_route_lists_configured_variants() {
    let (app, db_path) = build_app("models").await;

    let resp = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/v1/models")
                .header("x-api-key", GATE_KEY)
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);

    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let listed: serde_json::Value = serde_json::from_slice(&body).expect("model list body");
    let data = listed["data"].as_array().expect("data array");
    assert_eq!(data.len(), Config::default().variants.len());

    let _ = fs::remove_file(&db_path);
}
