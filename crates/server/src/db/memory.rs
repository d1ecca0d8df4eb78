//! In-memory repository for development and tests.
//!
//! Mirrors the `PostgreSQL` backend's observable behavior, including
//! `jsonb`-style ordering of `creation_date` values and rejection of
//! malformed IDs on delete.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use parcelpath_core::{Document, NewPayment, Parcel, ParcelId, Payment, PaymentId};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{ParcelRepository, PaymentWrite, RepositoryError};

#[derive(Default)]
struct Collections {
    /// Insertion order is preserved; it breaks ties when listing.
    parcels: Vec<Parcel>,
    payments: Vec<Payment>,
}

/// A thread-safe in-memory parcel store.
///
/// Cloning shares the underlying collections.
#[derive(Default, Clone)]
pub struct MemoryParcelRepository {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryParcelRepository {
    /// Creates a new, empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stored payment records, oldest first.
    pub async fn payments(&self) -> Vec<Payment> {
        self.inner.read().await.payments.clone()
    }
}

/// Rank of a JSON value's type, following `jsonb` ordering:
/// string < number < boolean < array < object.
const fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::String(_) => 1,
        Value::Number(_) => 2,
        Value::Bool(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Keys in `jsonb` storage order: shorter first, then bytewise.
fn jsonb_key_order(a: &&String, b: &&String) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Compare two sequences element by element; the first difference wins.
fn compare_pairwise<'a>(
    left: impl Iterator<Item = &'a Value>,
    right: impl Iterator<Item = &'a Value>,
) -> Ordering {
    left.zip(right)
        .map(|(l, r)| compare_json(l, r))
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Total order over JSON values following `jsonb` comparison.
///
/// Strings compare bytewise, which matches a database using the `C`
/// collation; under a linguistic collation mixed-case or non-ASCII strings
/// may order differently. Dates stored as ISO-8601 strings sort the same
/// under either.
fn compare_json(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .len()
            .cmp(&y.len())
            .then_with(|| compare_pairwise(x.iter(), y.iter())),
        (Value::Object(x), Value::Object(y)) => x.len().cmp(&y.len()).then_with(|| {
            let mut x_keys: Vec<&String> = x.keys().collect();
            let mut y_keys: Vec<&String> = y.keys().collect();
            x_keys.sort_by(jsonb_key_order);
            y_keys.sort_by(jsonb_key_order);
            x_keys
                .iter()
                .zip(&y_keys)
                .map(|(l, r)| jsonb_key_order(l, r))
                .find(|ord| ord.is_ne())
                .unwrap_or_else(|| {
                    compare_pairwise(
                        x_keys.iter().filter_map(|key| x.get(*key)),
                        y_keys.iter().filter_map(|key| y.get(*key)),
                    )
                })
        }),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Newest `creation_date` first; parcels without one go last.
fn newest_first(a: &Parcel, b: &Parcel) -> Ordering {
    match (a.creation_date(), b.creation_date()) {
        (Some(x), Some(y)) => compare_json(y, x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl ParcelRepository for MemoryParcelRepository {
    async fn insert_parcel(&self, doc: Document) -> Result<ParcelId, RepositoryError> {
        let parcel = Parcel::new(ParcelId::new_random(), doc);
        let id = parcel.id;
        self.inner.write().await.parcels.push(parcel);
        Ok(id)
    }

    async fn list_parcels(&self, owner: Option<&str>) -> Result<Vec<Parcel>, RepositoryError> {
        let collections = self.inner.read().await;
        // Most recently inserted first, so the stable sort keeps that for ties.
        let mut parcels: Vec<Parcel> = collections
            .parcels
            .iter()
            .rev()
            .filter(|parcel| owner.is_none_or(|email| parcel.created_by() == Some(email)))
            .cloned()
            .collect();
        parcels.sort_by(newest_first);
        Ok(parcels)
    }

    async fn find_parcel(&self, id: ParcelId) -> Result<Option<Parcel>, RepositoryError> {
        let collections = self.inner.read().await;
        Ok(collections
            .parcels
            .iter()
            .find(|parcel| parcel.id == id)
            .cloned())
    }

    async fn delete_parcel(&self, raw_id: &str) -> Result<u64, RepositoryError> {
        let id = ParcelId::parse(raw_id).map_err(|e| RepositoryError::InvalidKey(e.to_string()))?;

        let mut collections = self.inner.write().await;
        let before = collections.parcels.len();
        collections.parcels.retain(|parcel| parcel.id != id);
        Ok(u64::try_from(before - collections.parcels.len()).unwrap_or(u64::MAX))
    }

    async fn record_payment(&self, details: NewPayment) -> Result<PaymentWrite, RepositoryError> {
        let parcel_id = ParcelId::parse(&details.parcel_id).ok();
        let transaction_id = details.transaction_id.clone();
        let payment = Payment::succeeded(PaymentId::new_random(), details, chrono::Utc::now());
        let payment_id = payment.id;

        let mut collections = self.inner.write().await;
        collections.payments.push(payment);

        let mut parcel_updated = false;
        if let Some(id) = parcel_id
            && let Some(parcel) = collections.parcels.iter_mut().find(|parcel| parcel.id == id)
        {
            parcel.mark_paid(&transaction_id);
            parcel_updated = true;
        }

        Ok(PaymentWrite {
            payment_id,
            parcel_updated,
        })
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
