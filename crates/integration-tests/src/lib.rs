//! Integration tests for the AgentBridge auth service.
//!
//! Tests drive the full router (middleware included) with
//! `tower::ServiceExt::oneshot` over in-memory tables, so no storage account
//! or running server is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p agentbridge-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;
use std::time::Duration;

use agentbridge_auth::{
    RouterOptions, app,
    services::UserService,
    state::AppState,
    store::{CredentialStore, InMemoryTable},
};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

/// Per-call timeout used by test stores.
pub const TEST_TIMEOUT: Duration = Duration::from_millis(300);

/// A router over two fresh in-memory tables.
pub struct TestContext {
    pub admins: Arc<InMemoryTable>,
    pub users: Arc<InMemoryTable>,
    pub state: AppState,
    pub router: Router,
}

impl TestContext {
    /// Build a context with default router options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(&RouterOptions::default())
    }

    /// Build a context with custom router options.
    #[must_use]
    pub fn with_options(options: &RouterOptions) -> Self {
        let admins = Arc::new(InMemoryTable::new("Admins"));
        let users = Arc::new(InMemoryTable::new("Users"));
        let store = CredentialStore::new(admins.clone(), users.clone(), TEST_TIMEOUT);
        let state = AppState::new(store, "Admins", "Users");
        let router = app(state.clone(), options);

        Self {
            admins,
            users,
            state,
            router,
        }
    }

    /// Create an admin directly in the admin table.
    ///
    /// # Panics
    ///
    /// Panics if the admin cannot be created.
    pub async fn seed_admin(&self, email: &str, password: &str) {
        UserService::new(self.state.store())
            .add_admin(email, password)
            .await
            .expect("Failed to seed admin");
    }

    /// Create a user directly in the users table.
    ///
    /// # Panics
    ///
    /// Panics if the user cannot be created.
    pub async fn seed_user(&self, email: &str, password: &str) {
        UserService::new(self.state.store())
            .add_user(email, password)
            .await
            .expect("Failed to seed user");
    }

    /// Send a request and decode the JSON response body.
    ///
    /// Non-JSON bodies decode to `Value::Null`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    /// Send a raw request and return the response status and body bytes.
    ///
    /// # Panics
    ///
    /// Panics if the body cannot be read.
    pub async fn send_raw(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        (status, bytes.to_vec())
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
