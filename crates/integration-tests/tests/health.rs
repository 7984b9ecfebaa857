//! Health, request id, and static hosting tests.

#![allow(clippy::unwrap_used)]

use agentbridge_auth::RouterOptions;
use agentbridge_integration_tests::TestContext;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use tower::ServiceExt;

#[tokio::test]
async fn test_health_reports_tables() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tables"]["admin"], "available");
    assert_eq!(body["tables"]["users"], "available");
    assert_eq!(body["admin_store_reachable"], true);
    assert_eq!(body["user_store_reachable"], true);
}

#[tokio::test]
async fn test_health_with_unreachable_table() {
    let ctx = TestContext::new();
    ctx.admins.set_unavailable(true);

    let (status, body) = ctx.send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tables"]["admin"], "unavailable");
    assert_eq!(body["admin_store_reachable"], false);
    assert_eq!(body["user_store_reachable"], true);

    let (status, _) = ctx.send(Method::GET, "/health/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_readiness() {
    let ctx = TestContext::new();
    let (status, _) = ctx.send(Method::GET, "/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_echoed() {
    let ctx = TestContext::new();

    let response = ctx.router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "trace-me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-me");
}

#[tokio::test]
async fn test_unknown_route_without_static_dir() {
    let ctx = TestContext::new();
    let (status, _) = ctx.send(Method::GET, "/dashboard", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_static_dir_serves_spa() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>app</html>").unwrap();
    std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();

    let ctx = TestContext::with_options(&RouterOptions {
        static_dir: Some(dir.path().to_path_buf()),
        cors_allowed_origins: Vec::new(),
    });

    let get = |uri: &str| Request::builder().uri(uri).body(Body::empty()).unwrap();

    let (status, body) = ctx.send_raw(get("/app.js")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"console.log(1)");

    // Client-side routes fall back to index.html.
    let (status, body) = ctx.send_raw(get("/dashboard/users")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"<html>app</html>");

    // API routes still win.
    let (status, _) = ctx.send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cors_allowlist() {
    let ctx = TestContext::with_options(&RouterOptions {
        static_dir: None,
        cors_allowed_origins: vec!["https://app.example".to_string()],
    });

    let preflight = |origin: &str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/login")
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap()
    };

    let response = ctx.router
        .clone()
        .oneshot(preflight("https://app.example"))
        .await
        .unwrap();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "https://app.example"
    );

    let response = ctx.router
        .clone()
        .oneshot(preflight("https://evil.example"))
        .await
        .unwrap();
    assert!(
        response
            .headers()
            .get("access-control-allow-origin")
            .is_none()
    );
}
