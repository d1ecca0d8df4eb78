//! Payment route handlers.
//!
//! Checkout runs in two calls: the browser asks for a payment intent,
//! confirms the charge directly with Stripe, then reports the result here
//! so it can be recorded against the parcel.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use parcelpath_core::{NewPayment, PaymentId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Request body for creating a payment intent.
#[derive(Debug, Deserialize)]
pub struct IntentRequest {
    /// Amount in the currency's minor unit (e.g. cents).
    pub amount: i64,
}

/// Response body carrying the intent's client secret.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResponse {
    pub client_secret: String,
}

/// Response body for a recorded payment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    pub success: bool,
    pub payment_id: PaymentId,
    pub parcel_updated: bool,
}

/// Create a payment intent.
#[instrument(skip(state, payload))]
pub async fn create_intent(
    State(state): State<AppState>,
    payload: std::result::Result<Json<IntentRequest>, JsonRejection>,
) -> Result<Json<IntentResponse>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let client_secret = state.store().create_payment_intent(request.amount).await?;

    Ok(Json(IntentResponse { client_secret }))
}

/// Record a completed payment.
///
/// Succeeds even when no parcel was marked paid; `parcelUpdated` reports
/// which case occurred.
#[instrument(skip(state, payload))]
pub async fn record(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewPayment>, JsonRejection>,
) -> Result<Json<RecordResponse>> {
    let Json(details) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let receipt = state.store().record_payment(details).await?;

    Ok(Json(RecordResponse {
        success: true,
        payment_id: receipt.payment_id,
        parcel_updated: receipt.parcel_updated,
    }))
}
