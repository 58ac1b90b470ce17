//! Health, readiness and liveness endpoint tests.

use axum::http::StatusCode;
use remitdesk_testing::TestEnv;
use serde_json::Value;
use tower::ServiceExt;

async fn get(env: &TestEnv, uri: &str) -> (StatusCode, Value) {
    let request = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();

    let response = env.router().oneshot(request).await.expect("failed to make request");
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let body = serde_json::from_slice(&body_bytes).expect("response should be valid JSON");

    (status, body)
}

#[tokio::test]
async fn health_check_returns_success_when_healthy() {
    let env = TestEnv::new().await.expect("failed to create test environment");

    let (status, body) = get(&env, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["database"]["status"], "up");
    assert!(body["checks"]["database"].get("message").is_none());
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn health_check_reports_unavailable_store() {
    let env = TestEnv::new().await.expect("failed to create test environment");
    env.store.inject_failure("connection to 10.0.0.5:5432 refused").await;

    let (status, body) = get(&env, "/health").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["checks"]["database"]["status"], "down");
    assert_eq!(body["checks"]["database"]["message"], "Database unavailable");
    assert!(!body.to_string().contains("10.0.0.5"), "driver detail must not leak");
}

#[tokio::test]
async fn readiness_follows_store_health() {
    let env = TestEnv::new().await.expect("failed to create test environment");

    let (status, _) = get(&env, "/ready").await;
    assert_eq!(status, StatusCode::OK);

    env.store.inject_failure("connection refused").await;
    let (status, _) = get(&env, "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn liveness_ignores_store_failures() {
    let env = TestEnv::new().await.expect("failed to create test environment");
    env.store.inject_failure("connection refused").await;

    let (status, body) = get(&env, "/live").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");
    assert_eq!(body["service"], "remitdesk-api");
}
