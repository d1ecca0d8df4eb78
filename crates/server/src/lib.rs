//! ParcelPath server library.
//!
//! HTTP API for creating, listing, fetching and deleting parcels, plus the
//! Stripe payment-intent and payment-record flow. The binary in `main.rs`
//! only loads configuration, initializes tracing/Sentry, and serves
//! [`app`] on a listener; everything else lives here so it can be tested
//! in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::extract::Request;
use tower_http::trace::TraceLayer;

use config::ServerConfig;
use services::{GatewayError, ParcelStore, StripeClient};
use state::AppState;

/// Errors that abort startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("payment gateway setup failed: {0}")]
    Gateway(#[from] GatewayError),
}

/// Connect storage and the payment gateway and build the shared state.
///
/// # Errors
///
/// Returns `StartupError` if the database pool or HTTP client cannot be
/// created.
pub async fn build_state(config: ServerConfig) -> Result<AppState, StartupError> {
    let repository = db::connect(&config.storage, config.payment_writes_atomic).await?;
    let gateway = StripeClient::new(&config.stripe)?;
    let store = ParcelStore::new(repository, Arc::new(gateway));
    Ok(AppState::new(config, store))
}

/// Build the full application router with its middleware stack.
pub fn app(state: AppState) -> Router {
    let cors = middleware::cors_layer(&state.config().cors_allowed_origin);

    Router::new()
        .merge(routes::routes())
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{self, Method, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::db::MemoryParcelRepository;
    use crate::services::{PaymentGateway, PaymentIntent};

    struct NoopGateway;

    #[async_trait]
    impl PaymentGateway for NoopGateway {
        async fn create_payment_intent(&self, amount: i64) -> Result<PaymentIntent, GatewayError> {
            Ok(PaymentIntent {
                id: format!("pi_{amount}"),
                client_secret: format!("pi_{amount}_secret"),
            })
        }
    }

    fn test_app() -> Router {
        let vars: HashMap<String, String> = [
            ("STORAGE_BACKEND", "memory"),
            ("STRIPE_SECRET_KEY", "sk_test_51HqK2aB3xY9mK2nL5pQ7rT0uW4zC6dF8"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let config = ServerConfig::from_map(&vars).unwrap();
        let store = ParcelStore::new(
            Arc::new(MemoryParcelRepository::new()),
            Arc::new(NoopGateway),
        );
        app(AppState::new(config, store))
    }

    #[tokio::test]
    async fn test_root_liveness_text() {
        let response = test_app()
            .oneshot(http::Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"ParcelPath Server is Running");
    }

    #[tokio::test]
    async fn test_request_id_is_echoed_or_generated() {
        let response = test_app()
            .oneshot(
                http::Request::builder()
                    .uri("/health")
                    .header(middleware::REQUEST_ID_HEADER, "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()[middleware::REQUEST_ID_HEADER],
            "req-42"
        );

        let response = test_app()
            .oneshot(http::Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key(middleware::REQUEST_ID_HEADER));

        let response = test_app()
            .oneshot(
                http::Request::builder()
                    .uri("/health")
                    .header(middleware::REQUEST_ID_HEADER, "")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let generated = response.headers()[middleware::REQUEST_ID_HEADER]
            .to_str()
            .unwrap();
        assert!(uuid::Uuid::parse_str(generated).is_ok());
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_frontend_origin() {
        let response = test_app()
            .oneshot(
                http::Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/parcels")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn test_invalid_json_body_is_bad_request() {
        let response = test_app()
            .oneshot(
                http::Request::builder()
                    .method(Method::POST)
                    .uri("/parcels")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("[1, 2, 3]"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
