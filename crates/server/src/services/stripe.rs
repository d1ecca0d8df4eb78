//! Stripe API client for payment intents.
//!
//! Only the one call the checkout flow needs: create a payment intent and
//! hand its client secret to the browser, which completes the charge with
//! Stripe.js.

use std::time::Duration;

use async_trait::async_trait;
use parcelpath_core::CurrencyCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use crate::config::StripeConfig;

/// Request timeout for Stripe API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when interacting with the payment processor.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl GatewayError {
    /// Message suitable for returning to the client.
    ///
    /// For API errors this is the processor's own message (e.g. "Amount must
    /// be at least $0.50 usd").
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::Http(_) => "Payment processor unavailable".to_string(),
            Self::Parse(_) => "Unexpected response from payment processor".to_string(),
        }
    }
}

/// A created payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentIntent {
    /// Intent ID (`pi_...`), later reported back as the transaction ID.
    pub id: String,
    /// Secret the browser uses to confirm the payment.
    pub client_secret: String,
}

/// Creates payment intents with an external processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an intent for `amount` in the currency's minor unit.
    async fn create_payment_intent(&self, amount: i64) -> Result<PaymentIntent, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Pull the human-readable message out of a Stripe error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body).map_or_else(
        |_| body.trim().to_string(),
        |parsed| {
            parsed
                .error
                .message
                .or(parsed.error.kind)
                .unwrap_or_else(|| "Unknown payment processor error".to_string())
        },
    )
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_base: String,
    secret_key: SecretString,
    currency: CurrencyCode,
}

impl StripeClient {
    /// Create a new Stripe API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StripeConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            secret_key: config.secret_key.clone(),
            currency: config.currency,
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_payment_intent(&self, amount: i64) -> Result<PaymentIntent, GatewayError> {
        let url = format!("{}/v1/payment_intents", self.api_base);
        let amount = amount.to_string();

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.secret_key.expose_secret())
            .form(&[
                ("amount", amount.as_str()),
                ("currency", self.currency.as_str()),
                ("payment_method_types[]", "card"),
            ])
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let intent: PaymentIntent = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        tracing::info!(intent_id = %intent.id, "Payment intent created");
        Ok(intent)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, http::StatusCode, routing::post};
    use serde_json::json;

    use super::*;

    fn config(api_base: String) -> StripeConfig {
        StripeConfig {
            secret_key: SecretString::from("sk_test_51HqK2aB3xY9mK2nL5pQ7rT0uW4zC6dF8"),
            api_base,
            currency: CurrencyCode::Usd,
        }
    }

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_error_message_from_stripe_body() {
        let body = r#"{"error":{"message":"Amount must be at least $0.50 usd","type":"invalid_request_error"}}"#;
        assert_eq!(error_message(body), "Amount must be at least $0.50 usd");
    }

    #[test]
    fn test_error_message_falls_back_to_type_then_raw() {
        assert_eq!(
            error_message(r#"{"error":{"type":"api_error"}}"#),
            "api_error"
        );
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn test_client_message_hides_transport_details() {
        let err = GatewayError::Parse("missing field".to_string());
        assert_eq!(
            err.client_message(),
            "Unexpected response from payment processor"
        );
    }

    #[tokio::test]
    async fn test_create_payment_intent_success() {
        let router = Router::new().route(
            "/v1/payment_intents",
            post(|body: String| async move {
                assert!(body.contains("amount=1250"));
                assert!(body.contains("currency=usd"));
                axum::Json(json!({
                    "id": "pi_123",
                    "object": "payment_intent",
                    "client_secret": "pi_123_secret_abc"
                }))
            }),
        );
        let client = StripeClient::new(&config(serve(router).await)).unwrap();

        let intent = client.create_payment_intent(1250).await.unwrap();
        assert_eq!(intent.id, "pi_123");
        assert_eq!(intent.client_secret, "pi_123_secret_abc");
    }

    #[tokio::test]
    async fn test_create_payment_intent_api_error() {
        let router = Router::new().route(
            "/v1/payment_intents",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    axum::Json(json!({"error": {"message": "Invalid integer: -5"}})),
                )
            }),
        );
        let client = StripeClient::new(&config(serve(router).await)).unwrap();

        let err = client.create_payment_intent(-5).await.unwrap_err();
        match err {
            GatewayError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid integer: -5");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
