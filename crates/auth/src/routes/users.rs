//! User management route handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::services::{UserService, UserSummary};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub email: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// List all users.
pub async fn list(State(state): State<AppState>) -> Result<Json<UserListResponse>> {
    let users = UserService::new(state.store())
        .list_users()
        .await
        .map_err(|e| AppError::user("fetch users", e))?;

    Ok(Json(UserListResponse { users }))
}

/// Create a user.
pub async fn add(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(form) = payload?;

    UserService::new(state.store())
        .add_user(&form.email, &form.password)
        .await
        .map_err(|e| AppError::user("add user", e))?;

    Ok(MessageResponse::new("User created successfully"))
}

/// Change a user's password.
pub async fn update_password(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UpdatePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(form) = payload?;

    let email = UserService::new(state.store())
        .update_user_password(&form.email, &form.new_password)
        .await
        .map_err(|e| AppError::user("update password", e))?;

    Ok(MessageResponse::new(format!("Password updated for {email}")))
}

/// Delete a user.
pub async fn remove(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<MessageResponse>> {
    let email = UserService::new(state.store())
        .delete_user(&email)
        .await
        .map_err(|e| AppError::user("delete user", e))?;

    Ok(MessageResponse::new(format!("User {email} deleted successfully")))
}
