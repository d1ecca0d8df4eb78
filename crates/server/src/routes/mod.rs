//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                        - Liveness text
//! GET    /health                  - Liveness check
//! GET    /health/ready            - Readiness check (storage ping)
//!
//! # Parcels
//! POST   /parcels                 - Create parcel from any JSON object
//! GET    /parcels?email=          - List parcels, newest first
//! GET    /parcels/{id}            - Parcel detail
//! DELETE /parcels/{id}            - Delete parcel
//!
//! # Payments
//! POST   /create-payment-intent   - Create Stripe payment intent
//! POST   /payments                - Record a completed payment
//! ```

pub mod health;
pub mod parcels;
pub mod payments;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the parcel routes router.
pub fn parcel_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(parcels::index).post(parcels::create))
        .route("/{id}", get(parcels::show).delete(parcels::destroy))
}

/// Create all routes for the server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/parcels", parcel_routes())
        .route("/create-payment-intent", post(payments::create_intent))
        .route("/payments", post(payments::record))
}
