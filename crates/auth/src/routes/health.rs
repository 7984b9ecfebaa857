//! Health check handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub tables: TableStatus,
    pub admin_store_reachable: bool,
    pub user_store_reachable: bool,
}

#[derive(Debug, Serialize)]
pub struct TableStatus {
    pub admin: &'static str,
    pub users: &'static str,
}

const fn availability(reachable: bool) -> &'static str {
    if reachable { "available" } else { "unavailable" }
}

/// Liveness check with table reachability.
///
/// Always 200 while the process is up; the body reports each table.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let health = state.store().health().await;

    Json(HealthResponse {
        status: "ok",
        tables: TableStatus {
            admin: availability(health.admin_reachable),
            users: availability(health.users_reachable),
        },
        admin_store_reachable: health.admin_reachable,
        user_store_reachable: health.users_reachable,
    })
}

/// Readiness check.
///
/// Returns 503 Service Unavailable unless both tables answer.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.store().health().await.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
