//! User management endpoint tests.

#![allow(clippy::unwrap_used)]

use agentbridge_integration_tests::TestContext;
use axum::http::{Method, StatusCode};
use serde_json::json;

async fn login_status(ctx: &TestContext, email: &str, password: &str) -> StatusCode {
    ctx.send(
        Method::POST,
        "/api/login",
        Some(json!({ "email": email, "password": password })),
    )
    .await
    .0
}

#[tokio::test]
async fn test_add_then_list() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/admin/users/add",
            Some(json!({ "email": "a@x.com", "password": "p1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User created successfully");

    let (status, body) = ctx.send(Method::GET, "/api/admin/users", None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "a@x.com");
    assert!(
        users[0]["hashed_password"]
            .as_str()
            .unwrap()
            .starts_with("$argon2id$")
    );
}

#[tokio::test]
async fn test_duplicate_add_conflicts_and_keeps_password() {
    let ctx = TestContext::new();
    ctx.seed_user("a@x.com", "p1").await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/admin/users/add",
            Some(json!({ "email": "a@x.com", "password": "p2" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "User already exists");

    assert_eq!(login_status(&ctx, "a@x.com", "p1").await, StatusCode::OK);
    assert_eq!(
        login_status(&ctx, "a@x.com", "p2").await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_update_password() {
    let ctx = TestContext::new();
    ctx.seed_user("a@x.com", "p1").await;

    let (status, body) = ctx
        .send(
            Method::PUT,
            "/api/admin/users/update-password",
            Some(json!({ "email": "a@x.com", "new_password": "p2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password updated for a@x.com");

    assert_eq!(login_status(&ctx, "a@x.com", "p2").await, StatusCode::OK);
    assert_eq!(
        login_status(&ctx, "a@x.com", "p1").await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_update_password_for_missing_user() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(
            Method::PUT,
            "/api/admin/users/update-password",
            Some(json!({ "email": "ghost@x.com", "new_password": "p2" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "User not found");
    assert!(ctx.users.is_empty().await);
}

#[tokio::test]
async fn test_delete() {
    let ctx = TestContext::new();
    ctx.seed_user("a@x.com", "p1").await;

    let (status, body) = ctx
        .send(Method::DELETE, "/api/admin/users/delete/a@x.com", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User a@x.com deleted successfully");
    assert!(ctx.users.is_empty().await);

    let (status, body) = ctx
        .send(Method::DELETE, "/api/admin/users/delete/a@x.com", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "User not found");
}

#[tokio::test]
async fn test_delete_percent_encoded_email() {
    let ctx = TestContext::new();
    ctx.seed_user("o'neil+1@x.com", "p1").await;

    let (status, _) = ctx
        .send(
            Method::DELETE,
            "/api/admin/users/delete/o%27neil%2B1%40x.com",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(ctx.users.is_empty().await);
}

#[tokio::test]
async fn test_management_never_touches_admins() {
    let ctx = TestContext::new();
    ctx.seed_admin("root@x.com", "admin-pw").await;

    let (_, body) = ctx.send(Method::GET, "/api/admin/users", None).await;
    assert_eq!(body["users"].as_array().unwrap().len(), 0);

    let (status, _) = ctx
        .send(Method::DELETE, "/api/admin/users/delete/root@x.com", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(ctx.admins.len().await, 1);
}

#[tokio::test]
async fn test_validation_errors() {
    let ctx = TestContext::new();

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/admin/users/add",
            Some(json!({ "email": "not-an-email", "password": "p1" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/admin/users/add",
            Some(json!({ "email": "a@x.com", "password": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Password must not be empty");
    assert!(ctx.users.is_empty().await);
}

#[tokio::test]
async fn test_store_outage_is_server_error() {
    let ctx = TestContext::new();
    ctx.users.set_unavailable(true);

    let (status, body) = ctx.send(Method::GET, "/api/admin/users", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Failed to fetch users");
}

#[tokio::test]
async fn test_stalled_store_times_out() {
    let ctx = TestContext::new();
    ctx.users
        .set_stall(Some(std::time::Duration::from_secs(5)))
        .await;

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/admin/users/add",
            Some(json!({ "email": "a@x.com", "password": "p1" })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
