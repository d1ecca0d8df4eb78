//! Correlation IDs for requests.
//!
//! A caller (the web frontend or a proxy in front of the API) may send its
//! own `x-request-id`; otherwise one is minted here. Either way the same
//! value ends up on the request span, on the Sentry scope, and on the
//! response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// Header carrying the correlation ID in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Attach a correlation ID to the request and echo it back.
///
/// An empty or non-ASCII incoming header is treated as absent. The span
/// field `request_id` must already be declared by the enclosing
/// `TraceLayer` span for the value to be recorded.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| scope.set_tag("request_id", &request_id));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
