//! AgentBridge authentication backend.
//!
//! Admin and user accounts live in two Azure Table Storage tables. The
//! service verifies logins against them (regular logins fall back to the
//! admin table when no user record exists), manages user accounts, and
//! reports table reachability.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use std::path::PathBuf;

use axum::{Router, http::HeaderValue};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use config::AuthConfig;
use state::AppState;

/// HTTP surface options that do not live in [`AppState`].
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// Frontend assets served for unmatched paths, with `index.html` fallback.
    pub static_dir: Option<PathBuf>,
    /// Allowed CORS origins; empty allows any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl From<&AuthConfig> for RouterOptions {
    fn from(config: &AuthConfig) -> Self {
        Self {
            static_dir: config.static_dir.clone(),
            cors_allowed_origins: config.cors_allowed_origins.clone(),
        }
    }
}

/// Build the application router.
pub fn app(state: AppState, options: &RouterOptions) -> Router {
    let mut router = routes::routes();

    if let Some(dir) = &options.static_dir {
        let spa = ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")));
        router = router.fallback_service(spa);
    }

    router
        .layer(cors_layer(&options.cors_allowed_origins))
        .layer(TraceLayer::new_for_http().make_span_with(middleware::make_request_span))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
