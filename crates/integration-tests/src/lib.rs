//! Integration tests for ParcelPath.
//!
//! Each test spawns the full application router on an ephemeral port,
//! backed by the in-memory repository and a scripted payment gateway, and
//! talks to it over real HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p parcelpath-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use parcelpath_server::config::ServerConfig;
use parcelpath_server::db::MemoryParcelRepository;
use parcelpath_server::services::{GatewayError, ParcelStore, PaymentGateway, PaymentIntent};
use parcelpath_server::state::AppState;
use reqwest::Client;

/// Origin the test server allows for CORS.
pub const FRONTEND_ORIGIN: &str = "http://localhost:5173";

/// Minimum amount the scripted gateway accepts, in cents.
pub const MIN_AMOUNT: i64 = 50;

/// Payment gateway that mimics Stripe's amount validation.
#[derive(Default)]
pub struct ScriptedGateway {
    requested: Mutex<Vec<i64>>,
}

impl ScriptedGateway {
    /// Amounts passed to `create_payment_intent`, in call order.
    pub fn requested(&self) -> Vec<i64> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_payment_intent(&self, amount: i64) -> Result<PaymentIntent, GatewayError> {
        self.requested.lock().unwrap().push(amount);
        if amount < MIN_AMOUNT {
            return Err(GatewayError::Api {
                status: 400,
                message: "Amount must be at least $0.50 usd".to_string(),
            });
        }
        Ok(PaymentIntent {
            id: format!("pi_test_{amount}"),
            client_secret: format!("pi_test_{amount}_secret_xyz"),
        })
    }
}

/// A running server plus handles to its collaborators.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub repository: MemoryParcelRepository,
    pub gateway: Arc<ScriptedGateway>,
}

impl TestContext {
    /// Start a fresh server with empty storage.
    pub async fn new() -> Self {
        let vars: HashMap<String, String> = [
            ("STORAGE_BACKEND", "memory"),
            ("STRIPE_SECRET_KEY", "sk_test_51HqK2aB3xY9mK2nL5pQ7rT0uW4zC6dF8"),
            ("CORS_ALLOWED_ORIGIN", FRONTEND_ORIGIN),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let config = ServerConfig::from_map(&vars).unwrap();

        let repository = MemoryParcelRepository::new();
        let gateway = Arc::new(ScriptedGateway::default());
        let store = ParcelStore::new(Arc::new(repository.clone()), gateway.clone());
        let app = parcelpath_server::app(AppState::new(config, store));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            client: Client::new(),
            base_url: format!("http://{addr}"),
            repository,
            gateway,
        }
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `POST /parcels` and return the inserted ID.
    pub async fn create_parcel(&self, body: serde_json::Value) -> String {
        let resp = self
            .client
            .post(self.url("/parcels"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let json: serde_json::Value = resp.json().await.unwrap();
        json["insertedId"].as_str().unwrap().to_string()
    }
}
