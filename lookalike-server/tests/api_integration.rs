//! API integration tests for lookalike-server.
//!
//! These tests drive the full router with JSON requests against an
//! in-memory record store, covering every status the detector can report.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use lookalike_core::{DuplicateDetector, MemoryRecordStore, Signature};
use lookalike_server::{create_router_with_config, AppState, Config};
use serde_json::{json, Value};
use tower::ServiceExt;

const N: u64 = 16;

fn test_config() -> Config {
    Config {
        signature_len: N as usize,
        ..Default::default()
    }
}

/// Build the test router over a fresh in-memory store
async fn create_test_app() -> Router {
    let config = test_config();
    let store = Arc::new(MemoryRecordStore::new());
    let (detector, _) = DuplicateDetector::bootstrap(store, config.detector_config())
        .await
        .unwrap();
    create_router_with_config(AppState::new(detector), &config)
}

fn signature_b64(values: impl IntoIterator<Item = u64>) -> String {
    BASE64.encode(Signature::new(values.into_iter().collect()).encode())
}

fn submit_body(content: &str, structural: &str, signature: &str, group: &str, user: &str) -> Value {
    json!({
        "content_hash": content,
        "structural_hash": structural,
        "signature": signature,
        "group_id": group,
        "user_id": user,
        "timestamp": 1_700_000_000,
    })
}

async fn post_submit(app: &Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/submit")
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

// ============================================================================
// Health & Readiness Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let app = create_test_app().await;

    let (status, json) = get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
    assert_eq!(json["indexed"], 0);
    assert_eq!(json["store"], "memory");
}

#[tokio::test]
async fn test_ready_endpoint_returns_ok() {
    let app = create_test_app().await;

    let (status, json) = get_json(&app, "/ready").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ready"], true);
}

// ============================================================================
// Submit Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_first_submission_is_new() {
    let app = create_test_app().await;

    let (status, json) = post_submit(
        &app,
        submit_body("c1", "00000000000000ff", &signature_b64(0..N), "room", "alice"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "status": "new" }));

    let (_, health) = get_json(&app, "/health").await;
    assert_eq!(health["indexed"], 1);
}

#[tokio::test]
async fn test_same_and_duplicate_statuses() {
    let app = create_test_app().await;
    let sig = signature_b64(0..N);

    post_submit(&app, submit_body("c1", "ff", &sig, "room", "alice")).await;

    let (_, same) = post_submit(&app, submit_body("c1", "ff", &sig, "room", "alice")).await;
    assert_eq!(same["status"], "same");
    assert_eq!(same["user_id"], "alice");

    let (_, duplicate) = post_submit(&app, submit_body("c1", "ff", &sig, "other", "bob")).await;
    assert_eq!(duplicate["status"], "duplicate");
    assert_eq!(duplicate["group_id"], "room");
    assert_eq!(duplicate["user_id"], "alice");
    assert_eq!(duplicate["timestamp"], 1_700_000_000);
}

#[tokio::test]
async fn test_similar_status_reports_distance() {
    let app = create_test_app().await;

    post_submit(
        &app,
        submit_body("c1", "8f371c0ea5d26b49", &signature_b64(0..N), "room", "alice"),
    )
    .await;

    // Three bits flipped, unrelated signature
    let (status, json) = post_submit(
        &app,
        submit_body("c2", "8f371c0ea5d26b4e", &signature_b64(1000..1000 + N), "room", "bob"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "similar");
    assert_eq!(json["hamming_distance"], 3);
    assert_eq!(json["user_id"], "alice");
    assert!(json.get("similarity").is_none());
}

#[tokio::test]
async fn test_decimal_structural_hash_matches_hex() {
    let app = create_test_app().await;

    post_submit(&app, submit_body("c1", "ff", &signature_b64(0..N), "room", "alice")).await;

    // 254 is one bit away from 0xff
    let mut body = submit_body("c2", "", &signature_b64(1000..1000 + N), "room", "bob");
    body["structural_hash"] = json!(254);
    let (status, json) = post_submit(&app, body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "similar");
    assert_eq!(json["hamming_distance"], 1);
}

#[tokio::test]
async fn test_non_hex_content_hash_is_rejected() {
    let app = create_test_app().await;

    let (status, json) = post_submit(
        &app,
        submit_body("not a digest", "ff", &signature_b64(0..N), "room", "alice"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_like_status_reports_similarity() {
    let app = create_test_app().await;

    post_submit(
        &app,
        submit_body("c1", "0", &signature_b64(0..N), "room", "alice"),
    )
    .await;

    // Half the components shared, structural hash 64 bits away
    let overlapping = (0..N).map(|i| if i < N / 2 { i } else { 5000 + i });
    let (_, json) = post_submit(
        &app,
        submit_body("c2", "ffffffffffffffff", &signature_b64(overlapping), "room", "bob"),
    )
    .await;

    assert_eq!(json["status"], "like");
    assert_eq!(json["similarity"], 0.5);
    assert_eq!(json["structural_hash"], "0000000000000000");
    assert_eq!(json["user_id"], "alice");
}

#[tokio::test]
async fn test_like_is_scoped_to_group() {
    let app = create_test_app().await;

    post_submit(
        &app,
        submit_body("c1", "0", &signature_b64(0..N), "room", "alice"),
    )
    .await;

    let overlapping = (0..N).map(|i| if i < N / 2 { i } else { 5000 + i });
    let (_, json) = post_submit(
        &app,
        submit_body("c2", "ffffffffffffffff", &signature_b64(overlapping), "elsewhere", "bob"),
    )
    .await;

    assert_eq!(json["status"], "new");
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[tokio::test]
async fn test_wrong_signature_length_is_bad_request() {
    let app = create_test_app().await;

    let (status, json) = post_submit(
        &app,
        submit_body("c1", "ff", &signature_b64(0..N / 2), "room", "alice"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INCOMPATIBLE_SIGNATURE");
}

#[tokio::test]
async fn test_delimiter_in_group_is_bad_request() {
    let app = create_test_app().await;

    let (status, json) = post_submit(
        &app,
        submit_body("c1", "ff", &signature_b64(0..N), "room:1", "alice"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_INPUT");

    // Nothing was recorded
    let (_, health) = get_json(&app, "/health").await;
    assert_eq!(health["indexed"], 0);
}

#[tokio::test]
async fn test_invalid_base64_signature() {
    let app = create_test_app().await;

    let (status, json) = post_submit(
        &app,
        submit_body("c1", "ff", "%%%not-base64%%%", "room", "alice"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("base64"));
}

#[tokio::test]
async fn test_invalid_structural_hash() {
    let app = create_test_app().await;

    let (status, _) = post_submit(
        &app,
        submit_body("c1", "not-hex", &signature_b64(0..N), "room", "alice"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_fields_are_rejected() {
    let app = create_test_app().await;

    let (status, _) = post_submit(&app, json!({ "content_hash": "c1" })).await;

    assert!(status.is_client_error());
}

// ============================================================================
// OpenAPI Documentation Tests
// ============================================================================

#[tokio::test]
async fn test_openapi_spec_endpoint() {
    let app = create_test_app().await;

    let (status, json) = get_json(&app, "/api-docs/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["openapi"].as_str().unwrap().starts_with("3."));
    assert!(json["info"]["title"].is_string());
    assert!(
        json["paths"]["/submit"].is_object(),
        "Submit endpoint should be documented"
    );
    assert!(json["paths"]["/health"].is_object());
    assert!(json["paths"]["/ready"].is_object());
}

#[tokio::test]
async fn test_swagger_ui_endpoint() {
    let app = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8_lossy(&body);
    assert!(html.contains("swagger") || html.contains("Swagger"));
}
