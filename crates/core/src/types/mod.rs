//! Core types for ParcelPath.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod parcel;
pub mod payment;
pub mod status;

pub use id::*;
pub use money::{CurrencyCode, CurrencyError};
pub use parcel::{Document, Parcel};
pub use payment::{NewPayment, Payment};
pub use status::PaymentStatus;
