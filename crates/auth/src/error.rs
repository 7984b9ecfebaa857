//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as
//! `{"detail": "..."}` with a matching status code; server errors are
//! captured to Sentry before responding.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::users::UserError;

/// Application-level error type for the auth service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Login failed. `admin` selects the admin wording.
    #[error("Invalid credentials")]
    Unauthorized { admin: bool },

    /// Account management failed.
    #[error("{action}: {source}")]
    User {
        /// What was being attempted, echoed to the client on store failures.
        action: &'static str,
        #[source]
        source: UserError,
    },

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Wrap a management error with the operation that produced it.
    #[must_use]
    pub const fn user(action: &'static str, source: UserError) -> Self {
        Self::User { action, source }
    }

    /// The HTTP status this error renders as.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::User { source, .. } => match source {
                UserError::InvalidEmail(_) | UserError::EmptyPassword => StatusCode::BAD_REQUEST,
                UserError::NotFound => StatusCode::NOT_FOUND,
                UserError::AlreadyExists => StatusCode::CONFLICT,
                UserError::PasswordHash | UserError::StoreUnavailable(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Client-facing detail. Store internals are never echoed.
    fn detail(&self) -> String {
        match self {
            Self::Unauthorized { admin: true } => "Invalid admin credentials".to_string(),
            Self::Unauthorized { admin: false } => "Invalid credentials".to_string(),
            Self::BadRequest(msg) => msg.clone(),
            Self::User { action, source } => match source {
                UserError::InvalidEmail(err) => format!("Invalid email address: {err}"),
                UserError::EmptyPassword => "Password must not be empty".to_string(),
                UserError::NotFound => "User not found".to_string(),
                UserError::AlreadyExists => "User already exists".to_string(),
                UserError::PasswordHash | UserError::StoreUnavailable(_) => {
                    format!("Failed to {action}")
                }
            },
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
