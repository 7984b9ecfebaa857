//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. Request ID (assign `x-request-id`)
//! 3. `TraceLayer` (request span carrying the id)
//! 4. CORS

pub mod request_id;

pub use request_id::{REQUEST_ID_HEADER, make_request_span, request_id_middleware};
