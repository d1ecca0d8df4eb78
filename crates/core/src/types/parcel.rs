//! Parcel records.
//!
//! Parcels are schemaless: the caller decides the shape of the document and
//! the store persists it untouched. Only the handful of fields the store
//! itself reads get typed accessors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id::ParcelId;

/// A loosely-typed JSON object as submitted by the client.
pub type Document = serde_json::Map<String, Value>;

/// A stored parcel: the generated identifier plus the submitted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    /// Store-generated identifier.
    #[serde(rename = "_id")]
    pub id: ParcelId,
    /// Every other field, exactly as submitted (plus payment markers).
    #[serde(flatten)]
    pub fields: Document,
}

impl Parcel {
    /// Field holding the owner's email.
    pub const CREATED_BY: &'static str = "created_by";
    /// Field used as the listing sort key.
    pub const CREATION_DATE: &'static str = "creation_date";
    /// Field set once a payment is recorded.
    pub const PAID: &'static str = "paid";
    /// Field holding the processor transaction ID once paid.
    pub const TRANSACTION_ID: &'static str = "transactionId";
    /// Reserved key for the identifier in the serialized form.
    pub const ID_KEY: &'static str = "_id";

    /// Build a parcel from a submitted document.
    ///
    /// Any client-supplied `_id` is discarded; the store owns identifiers.
    #[must_use]
    pub fn new(id: ParcelId, mut fields: Document) -> Self {
        fields.remove(Self::ID_KEY);
        Self { id, fields }
    }

    /// Owner email, if present and a string.
    #[must_use]
    pub fn created_by(&self) -> Option<&str> {
        self.fields.get(Self::CREATED_BY).and_then(Value::as_str)
    }

    /// Raw sort key. `None` when the field is absent or `null`.
    #[must_use]
    pub fn creation_date(&self) -> Option<&Value> {
        self.fields
            .get(Self::CREATION_DATE)
            .filter(|value| !value.is_null())
    }

    /// Whether a payment has been recorded against this parcel.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.fields
            .get(Self::PAID)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Processor transaction ID, once paid.
    #[must_use]
    pub fn transaction_id(&self) -> Option<&str> {
        self.fields.get(Self::TRANSACTION_ID).and_then(Value::as_str)
    }

    /// Set the payment markers (`paid = true`, `transactionId`).
    pub fn mark_paid(&mut self, transaction_id: &str) {
        self.fields.insert(Self::PAID.to_owned(), Value::Bool(true));
        self.fields.insert(
            Self::TRANSACTION_ID.to_owned(),
            Value::String(transaction_id.to_owned()),
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    #[test]
    fn test_new_drops_client_id() {
        let id = ParcelId::new_random();
        let parcel = Parcel::new(id, doc(json!({"_id": "mine", "weight": 2})));
        assert_eq!(parcel.id, id);
        assert!(!parcel.fields.contains_key("_id"));
        assert_eq!(parcel.fields["weight"], json!(2));
    }

    #[test]
    fn test_serializes_flat_with_id() {
        let id = ParcelId::new_random();
        let parcel = Parcel::new(id, doc(json!({"created_by": "a@x.com"})));
        let value = serde_json::to_value(&parcel).unwrap();
        assert_eq!(value["_id"], json!(id.to_string()));
        assert_eq!(value["created_by"], json!("a@x.com"));
    }

    #[test]
    fn test_accessors() {
        let mut parcel = Parcel::new(
            ParcelId::new_random(),
            doc(json!({"created_by": "a@x.com", "creation_date": null})),
        );
        assert_eq!(parcel.created_by(), Some("a@x.com"));
        assert!(parcel.creation_date().is_none());
        assert!(!parcel.is_paid());

        parcel.mark_paid("pi_123");
        assert!(parcel.is_paid());
        assert_eq!(parcel.transaction_id(), Some("pi_123"));
    }
}
