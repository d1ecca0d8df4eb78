//! ParcelPath Core - Shared types library.
//!
//! This crate provides common types used across all ParcelPath components:
//! - `server` - HTTP API for parcels and payments
//! - `cli` - Command-line tools for migrations and configuration checks
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, parcel and payment records, currency and status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
