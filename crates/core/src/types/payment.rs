//! Payment records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::PaymentId;
use super::status::PaymentStatus;

/// Details of a completed payment, as reported by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    /// Parcel the payment is for. Not checked for existence or format.
    pub parcel_id: String,
    /// Payer email.
    pub email: String,
    /// Amount charged, in major units.
    pub amount: Decimal,
    /// Processor transaction (payment intent) ID.
    pub transaction_id: String,
}

/// An immutable payment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id")]
    pub id: PaymentId,
    pub parcel_id: String,
    pub email: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub transaction_id: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Build a `succeeded` payment record stamped with the given time.
    #[must_use]
    pub fn succeeded(id: PaymentId, details: NewPayment, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            parcel_id: details.parcel_id,
            email: details.email,
            amount: details.amount,
            transaction_id: details.transaction_id,
            status: PaymentStatus::Succeeded,
            created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_new_payment_accepts_camel_case_number_amount() {
        let details: NewPayment = serde_json::from_value(json!({
            "parcelId": "p1",
            "email": "a@x.com",
            "amount": 12.5,
            "transactionId": "pi_1"
        }))
        .unwrap();
        assert_eq!(details.amount, Decimal::new(125, 1));
        assert_eq!(details.transaction_id, "pi_1");
    }

    #[test]
    fn test_payment_serializes_amount_as_number() {
        let payment = Payment::succeeded(
            PaymentId::new_random(),
            NewPayment {
                parcel_id: "p1".to_owned(),
                email: "a@x.com".to_owned(),
                amount: Decimal::new(1999, 2),
                transaction_id: "pi_1".to_owned(),
            },
            Utc::now(),
        );
        let value = serde_json::to_value(&payment).unwrap();
        assert_eq!(value["status"], json!("succeeded"));
        assert_eq!(value["parcelId"], json!("p1"));
        assert!(value["amount"].is_number());
        assert!(value.get("createdAt").is_some());
    }
}
