//! Business logic and external service clients.

pub mod store;
pub mod stripe;

pub use store::{DeleteOutcome, ParcelStore, PaymentReceipt, StoreError};
pub use stripe::{GatewayError, PaymentGateway, PaymentIntent, StripeClient};
