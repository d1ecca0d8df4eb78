//! Parcel route handlers.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use parcelpath_core::{Document, Parcel, ParcelId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Query parameters for listing parcels.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Only parcels whose `created_by` equals this email.
    pub email: Option<String>,
}

/// Response body for a created parcel.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub success: bool,
    pub inserted_id: ParcelId,
}

/// Response body for a delete.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted_count: u64,
}

/// Create a parcel from any JSON object.
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Document>, JsonRejection>,
) -> Result<Json<CreatedResponse>> {
    let Json(doc) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let id = state.store().create_parcel(doc).await?;

    Ok(Json(CreatedResponse {
        success: true,
        inserted_id: id,
    }))
}

/// List parcels, optionally for one owner, newest first.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Parcel>>> {
    let parcels = state.store().list_parcels(query.email.as_deref()).await?;
    Ok(Json(parcels))
}

/// Parcel detail.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Parcel>> {
    let parcel = state.store().get_parcel(&id).await?;
    Ok(Json(parcel))
}

/// Delete a parcel.
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let outcome = state.store().delete_parcel(&id).await?;

    Ok(Json(DeleteResponse {
        success: outcome.deleted,
        deleted_count: outcome.deleted_count,
    }))
}
