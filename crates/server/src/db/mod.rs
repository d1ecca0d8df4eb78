//! Persistence for parcels and payments.
//!
//! # Tables
//!
//! - `parcels` - Schemaless parcel documents (`JSONB`) keyed by UUID
//! - `payments` - Immutable payment records (write-only from the API)
//!
//! # Backends
//!
//! - [`PgParcelRepository`] - `PostgreSQL`, the production backend
//! - [`MemoryParcelRepository`] - Process-local, for development and tests
//!
//! Both implement [`ParcelRepository`] with the same observable semantics,
//! including the null ordering of `list_parcels`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p parcelpath-cli -- migrate
//! ```

pub mod memory;
pub mod parcels;
pub mod payments;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parcelpath_core::{Document, NewPayment, Parcel, ParcelId, PaymentId};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::config::{DatabaseConfig, StorageConfig};

pub use memory::MemoryParcelRepository;
pub use parcels::PgParcelRepository;

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The backend rejected a key it could not interpret.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

/// Outcome of the two-step payment write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentWrite {
    /// ID of the inserted payment record.
    pub payment_id: PaymentId,
    /// Whether the parcel update modified a document.
    pub parcel_updated: bool,
}

/// Storage operations behind the parcel/payment store.
#[async_trait]
pub trait ParcelRepository: Send + Sync {
    /// Insert a parcel document and return its generated ID.
    async fn insert_parcel(&self, doc: Document) -> Result<ParcelId, RepositoryError>;

    /// List parcels, optionally filtered by `created_by`, newest
    /// `creation_date` first. Parcels without a `creation_date` sort last.
    async fn list_parcels(&self, owner: Option<&str>) -> Result<Vec<Parcel>, RepositoryError>;

    /// Fetch a parcel by ID.
    async fn find_parcel(&self, id: ParcelId) -> Result<Option<Parcel>, RepositoryError>;

    /// Delete a parcel by its raw ID string and return the number of rows
    /// removed. The string is handed to the backend unchecked; a malformed
    /// ID is rejected by the backend as an error.
    async fn delete_parcel(&self, raw_id: &str) -> Result<u64, RepositoryError>;

    /// Insert a payment record, then set `paid`/`transactionId` on the
    /// referenced parcel. A parcel ID that matches nothing (or is not a
    /// valid ID at all) leaves the payment in place and reports
    /// `parcel_updated: false`.
    async fn record_payment(&self, details: NewPayment) -> Result<PaymentWrite, RepositoryError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let options = match database {
        DatabaseConfig::Url(url) => url.expose_secret().parse::<PgConnectOptions>()?,
        DatabaseConfig::Parts {
            host,
            port,
            user,
            password,
            name,
        } => PgConnectOptions::new()
            .host(host)
            .port(*port)
            .username(user)
            .password(password.expose_secret())
            .database(name),
    };

    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Build the configured repository, connecting to the database if needed.
///
/// # Errors
///
/// Returns `sqlx::Error` if the `PostgreSQL` pool cannot be created.
pub async fn connect(
    storage: &StorageConfig,
    payment_writes_atomic: bool,
) -> Result<Arc<dyn ParcelRepository>, sqlx::Error> {
    match storage {
        StorageConfig::Postgres(database) => {
            let pool = create_pool(database).await?;
            tracing::info!(payment_writes_atomic, "Database pool created");
            Ok(Arc::new(
                PgParcelRepository::new(pool).with_atomic_payments(payment_writes_atomic),
            ))
        }
        StorageConfig::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(MemoryParcelRepository::new()))
        }
    }
}
