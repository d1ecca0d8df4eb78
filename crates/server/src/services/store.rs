//! The parcel/payment store.
//!
//! Each HTTP route maps to exactly one operation here. The store validates
//! what it must (parcel IDs on lookup), delegates persistence to a
//! [`ParcelRepository`] and intent creation to a [`PaymentGateway`], and
//! reports failures as [`StoreError`].
//!
//! # Payment consistency
//!
//! [`ParcelStore::record_payment`] writes the payment first and marks the
//! parcel paid second. The two writes are independent: a payment for a
//! parcel that does not exist is kept and reported as
//! `parcel_updated: false` rather than rolled back.

use std::sync::Arc;

use parcelpath_core::{Document, NewPayment, Parcel, ParcelId, PaymentId};
use thiserror::Error;
use tracing::instrument;

use crate::db::{ParcelRepository, RepositoryError};
use crate::services::stripe::{GatewayError, PaymentGateway};

/// Errors surfaced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Caller supplied a malformed identifier.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No record matched.
    #[error("not found: {0}")]
    NotFound(String),

    /// The storage backend failed.
    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),

    /// The payment processor call failed.
    #[error("payment gateway error: {0}")]
    PaymentGateway(#[from] GatewayError),
}

/// Result of deleting a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Exactly one record was removed.
    pub deleted: bool,
    /// Rows removed by the backend.
    pub deleted_count: u64,
}

/// Result of recording a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentReceipt {
    /// The new payment record.
    pub payment_id: PaymentId,
    /// Whether a parcel was marked paid.
    pub parcel_updated: bool,
}

/// Parcel and payment operations.
///
/// Cheaply cloneable; clones share the repository and gateway.
#[derive(Clone)]
pub struct ParcelStore {
    repository: Arc<dyn ParcelRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl ParcelStore {
    /// Create a store over a repository and payment gateway.
    #[must_use]
    pub fn new(repository: Arc<dyn ParcelRepository>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            repository,
            gateway,
        }
    }

    /// Get a reference to the repository.
    #[must_use]
    pub fn repository(&self) -> &dyn ParcelRepository {
        self.repository.as_ref()
    }

    /// Insert a parcel document as submitted and return its new ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if the insert fails.
    #[instrument(skip(self, doc), fields(field_count = doc.len()))]
    pub async fn create_parcel(&self, doc: Document) -> Result<ParcelId, StoreError> {
        let id = self.repository.insert_parcel(doc).await?;
        tracing::info!(parcel_id = %id, "Parcel created");
        Ok(id)
    }

    /// List parcels, newest `creation_date` first.
    ///
    /// An empty `owner` is treated the same as no filter.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_parcels(&self, owner: Option<&str>) -> Result<Vec<Parcel>, StoreError> {
        let owner = owner.filter(|email| !email.is_empty());
        Ok(self.repository.list_parcels(owner).await?)
    }

    /// Fetch one parcel.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidArgument` for a malformed ID (without
    /// touching storage), `StoreError::NotFound` if no parcel matches, and
    /// `StoreError::Storage` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_parcel(&self, raw_id: &str) -> Result<Parcel, StoreError> {
        let id = ParcelId::parse(raw_id)
            .map_err(|_| StoreError::InvalidArgument(format!("invalid parcel id: {raw_id}")))?;

        self.repository
            .find_parcel(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("parcel {id}")))
    }

    /// Delete one parcel.
    ///
    /// The ID is passed to storage without a format check; zero matches is
    /// reported as `deleted: false`, not an error.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if the backend rejects the ID or the
    /// delete fails.
    #[instrument(skip(self))]
    pub async fn delete_parcel(&self, raw_id: &str) -> Result<DeleteOutcome, StoreError> {
        let deleted_count = self.repository.delete_parcel(raw_id).await?;
        if deleted_count == 1 {
            tracing::info!(parcel_id = raw_id, "Parcel deleted");
        }
        Ok(DeleteOutcome {
            deleted: deleted_count == 1,
            deleted_count,
        })
    }

    /// Create a payment intent and return its client secret.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::PaymentGateway` if the processor call fails.
    #[instrument(skip(self))]
    pub async fn create_payment_intent(&self, amount: i64) -> Result<String, StoreError> {
        let intent = self.gateway.create_payment_intent(amount).await?;
        Ok(intent.client_secret)
    }

    /// Record a completed payment and mark its parcel paid.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if either write fails. A parcel that
    /// does not exist is not an error.
    #[instrument(skip(self, details), fields(parcel_id = %details.parcel_id))]
    pub async fn record_payment(&self, details: NewPayment) -> Result<PaymentReceipt, StoreError> {
        let parcel_id = details.parcel_id.clone();
        let write = self.repository.record_payment(details).await?;

        if write.parcel_updated {
            tracing::info!(payment_id = %write.payment_id, "Payment recorded");
        } else {
            tracing::warn!(
                payment_id = %write.payment_id,
                parcel_id = %parcel_id,
                "Payment recorded but no parcel was marked paid"
            );
        }

        Ok(PaymentReceipt {
            payment_id: write.payment_id,
            parcel_updated: write.parcel_updated,
        })
    }
}
