//! Login route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, Result};
use crate::services::{Authenticated, Authenticator};
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Sent by the admin login form; the entry point alone decides the table.
    #[serde(default)]
    pub is_admin: Option<bool>,
}

/// Login response body.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub user: LoginUser,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl LoginResponse {
    fn new(message: &'static str, email: String, account: &Authenticated) -> Self {
        Self {
            message,
            user: LoginUser {
                name: account.name().to_string(),
                email,
                is_admin: account.is_admin(),
            },
        }
    }
}

/// Handle admin login.
pub async fn admin_login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(form) = payload?;

    let account = Authenticator::new(state.store())
        .admin_login(&form.email, &form.password)
        .await
        .map_err(|_| AppError::Unauthorized { admin: true })?;

    info!("admin logged in");
    Ok(Json(LoginResponse::new(
        "Admin login successful",
        form.email,
        &account,
    )))
}

/// Handle regular login.
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(form) = payload?;

    let account = Authenticator::new(state.store())
        .login(&form.email, &form.password)
        .await
        .map_err(|_| AppError::Unauthorized { admin: false })?;

    info!(is_admin = account.is_admin(), "user logged in");
    Ok(Json(LoginResponse::new("Login successful", form.email, &account)))
}
