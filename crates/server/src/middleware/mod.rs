//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. CORS (browser origin allow-list)
//! 3. `TraceLayer` (request span, with a `request_id` field)
//! 4. Request ID (fills the span field, echoes the header)

pub mod request_id;

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};

/// Build the CORS layer for the configured browser origin.
///
/// An origin that is not a valid header value falls back to rejecting all
/// cross-origin requests.
#[must_use]
pub fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let origin = HeaderValue::from_str(allowed_origin).map_or_else(
        |_| {
            tracing::warn!(allowed_origin, "Invalid CORS origin; cross-origin requests disabled");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        },
        AllowOrigin::exact,
    );

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}
