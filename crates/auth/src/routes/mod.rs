//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Login
//! POST   /api/admin/login                   - Admin login (admin table only)
//! POST   /api/login                         - Regular login (users, then admin)
//!
//! # User management
//! GET    /api/admin/users                   - List users
//! PUT    /api/admin/users/update-password   - Change a user's password
//! POST   /api/admin/users/add               - Create a user
//! DELETE /api/admin/users/delete/{email}    - Delete a user
//!
//! # Health
//! GET    /health                            - Liveness plus table reachability
//! GET    /health/ready                      - 503 unless both tables answer
//! ```

pub mod auth;
pub mod health;
pub mod users;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Create the user management routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list))
        .route("/update-password", put(users::update_password))
        .route("/add", post(users::add))
        .route("/delete/{email}", delete(users::remove))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/api/admin/login", post(auth::admin_login))
        .route("/api/login", post(auth::login))
        .nest("/api/admin/users", user_routes())
}
