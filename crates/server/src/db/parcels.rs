//! `PostgreSQL` repository for parcels.
//!
//! Parcel documents live in a single `JSONB` column, so any shape the client
//! submits round-trips untouched. Queries are built at runtime; no database
//! is needed at compile time.

use async_trait::async_trait;
use parcelpath_core::{Document, NewPayment, Parcel, ParcelId, Payment, PaymentId};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};

use super::payments;
use super::{ParcelRepository, PaymentWrite, RepositoryError};

/// Repository for parcel and payment rows in `PostgreSQL`.
#[derive(Clone)]
pub struct PgParcelRepository {
    pool: PgPool,
    atomic_payments: bool,
}

impl PgParcelRepository {
    /// Create a new repository over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self {
            pool,
            atomic_payments: false,
        }
    }

    /// Run both payment writes inside one transaction.
    ///
    /// A failure while updating the parcel then rolls back the payment
    /// insert. A parcel that simply does not exist still commits the payment
    /// and reports `parcel_updated: false`.
    #[must_use]
    pub const fn with_atomic_payments(mut self, atomic: bool) -> Self {
        self.atomic_payments = atomic;
        self
    }
}

/// Set the payment markers on a parcel. Returns whether a row changed.
async fn mark_parcel_paid<'e>(
    executor: impl PgExecutor<'e>,
    id: ParcelId,
    transaction_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r"
        UPDATE parcels
        SET doc = doc || jsonb_build_object('paid', true, 'transactionId', $2::text)
        WHERE id = $1
        ",
    )
    .bind(id)
    .bind(transaction_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

#[async_trait]
impl ParcelRepository for PgParcelRepository {
    async fn insert_parcel(&self, doc: Document) -> Result<ParcelId, RepositoryError> {
        let parcel = Parcel::new(ParcelId::new_random(), doc);

        sqlx::query("INSERT INTO parcels (id, doc) VALUES ($1, $2)")
            .bind(parcel.id)
            .bind(Json(&parcel.fields))
            .execute(&self.pool)
            .await?;

        Ok(parcel.id)
    }

    async fn list_parcels(&self, owner: Option<&str>) -> Result<Vec<Parcel>, RepositoryError> {
        // The owner is matched as a JSON string, never a coerced number.
        // JSON null is grouped with a missing field so both sort last.
        let rows: Vec<(ParcelId, Json<Document>)> = sqlx::query_as(
            r"
            SELECT id, doc
            FROM parcels
            WHERE $1::text IS NULL OR doc->'created_by' = to_jsonb($1::text)
            ORDER BY NULLIF(doc->'creation_date', 'null'::jsonb) DESC NULLS LAST,
                     created_at DESC
            ",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, Json(doc))| Parcel::new(id, doc))
            .collect())
    }

    async fn find_parcel(&self, id: ParcelId) -> Result<Option<Parcel>, RepositoryError> {
        let row: Option<(ParcelId, Json<Document>)> =
            sqlx::query_as("SELECT id, doc FROM parcels WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(id, Json(doc))| Parcel::new(id, doc)))
    }

    async fn delete_parcel(&self, raw_id: &str) -> Result<u64, RepositoryError> {
        // The cast happens server-side, so a malformed ID fails the query.
        let result = sqlx::query("DELETE FROM parcels WHERE id = $1::uuid")
            .bind(raw_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn record_payment(&self, details: NewPayment) -> Result<PaymentWrite, RepositoryError> {
        let parcel_id = ParcelId::parse(&details.parcel_id).ok();
        let transaction_id = details.transaction_id.clone();
        let payment = Payment::succeeded(PaymentId::new_random(), details, chrono::Utc::now());

        let parcel_updated = if self.atomic_payments {
            let mut tx = self.pool.begin().await?;
            payments::insert_payment(&mut *tx, &payment).await?;
            let updated = match parcel_id {
                Some(id) => mark_parcel_paid(&mut *tx, id, &transaction_id).await?,
                None => false,
            };
            tx.commit().await?;
            updated
        } else {
            payments::insert_payment(&self.pool, &payment).await?;
            match parcel_id {
                Some(id) => mark_parcel_paid(&self.pool, id, &transaction_id).await?,
                None => false,
            }
        };

        Ok(PaymentWrite {
            payment_id: payment.id,
            parcel_updated,
        })
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
