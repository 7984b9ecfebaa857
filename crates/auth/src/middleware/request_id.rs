//! Request ID propagation.
//!
//! Every request carries an `x-request-id`. An upstream value is kept if it
//! is short printable ASCII; otherwise a UUID v4 is generated. The id is
//! written back onto the request so the trace span can pick it up, tagged on
//! the Sentry scope, and echoed in the response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

fn upstream_id(request: &Request) -> Option<HeaderValue> {
    let value = request.headers().get(REQUEST_ID_HEADER)?;
    let text = value.to_str().ok()?;
    (!text.is_empty() && text.len() <= MAX_REQUEST_ID_LEN).then(|| value.clone())
}

/// Middleware that ensures every request has a request ID.
///
/// Must sit outside the trace layer so [`make_request_span`] sees the id.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let value = match upstream_id(&request) {
        Some(value) => value,
        None => {
            // A hyphenated UUID is always a valid header value.
            let generated = Uuid::new_v4().to_string();
            match HeaderValue::from_str(&generated) {
                Ok(value) => value,
                Err(_) => return next.run(request).await,
            }
        }
    };

    request
        .headers_mut()
        .insert(REQUEST_ID_HEADER, value.clone());

    if let Ok(id) = value.to_str() {
        sentry::configure_scope(|scope| scope.set_tag("request_id", id));
    }

    let mut response = next.run(request).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, value);
    response
}

/// Span constructor for `TraceLayer` that records the request ID.
pub fn make_request_span(request: &Request) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, middleware, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new()
            .route(
                "/",
                get(|request: Request| async move {
                    request
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string()
                }),
            )
            .layer(middleware::from_fn(request_id_middleware))
    }

    #[tokio::test]
    async fn test_generates_id() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let id = response.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap().to_string();
        assert!(Uuid::parse_str(&id).is_ok());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, id.as_bytes());
    }

    #[tokio::test]
    async fn test_keeps_upstream_id() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("x-request-id", "edge-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "edge-42");
    }

    #[tokio::test]
    async fn test_replaces_oversized_id() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("x-request-id", "x".repeat(200))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let id = response.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }
}
