//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STRIPE_SECRET_KEY` - Stripe secret API key (server-side only)
//! - `DATABASE_URL` - `PostgreSQL` connection string, or alternatively
//!   `DB_USER`, `DB_PASS` and `DB_NAME` (with optional `DB_HOST`, default
//!   `localhost:5432`). Not required when `STORAGE_BACKEND=memory`.
//!
//! ## Optional
//! - `STORAGE_BACKEND` - `postgres` (default) or `memory`
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 5000)
//! - `CORS_ALLOWED_ORIGIN` - Browser origin allowed to call the API
//!   (default: `http://localhost:5173`)
//! - `STRIPE_API_BASE` - Stripe API base URL (default: `https://api.stripe.com`)
//! - `PAYMENT_CURRENCY` - Currency for payment intents (default: usd)
//! - `PAYMENT_WRITES_ATOMIC` - Record payments inside one transaction (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use parcelpath_core::CurrencyCode;
use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5432;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Where parcels and payments are persisted.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// `PostgreSQL` via a connection pool.
    Postgres(DatabaseConfig),
    /// Process-local store; contents are lost on restart.
    Memory,
}

/// `PostgreSQL` connection settings.
///
/// Either a full URL or the individual parts. Parts are never joined into a
/// URL, so passwords need no escaping.
#[derive(Clone)]
pub enum DatabaseConfig {
    Url(SecretString),
    Parts {
        host: String,
        port: u16,
        user: String,
        password: SecretString,
        name: String,
    },
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(_) => f.debug_tuple("Url").field(&"[REDACTED]").finish(),
            Self::Parts {
                host,
                port,
                user,
                name,
                ..
            } => f
                .debug_struct("Parts")
                .field("host", host)
                .field("port", port)
                .field("user", user)
                .field("password", &"[REDACTED]")
                .field("name", name)
                .finish(),
        }
    }
}

/// Stripe API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (`sk_live_...` / `sk_test_...`)
    pub secret_key: SecretString,
    /// API base URL, overridable for stripe-mock
    pub api_base: String,
    /// Currency every payment intent is created in
    pub currency: CurrencyCode,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("currency", &self.currency)
            .finish()
    }
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Storage backend
    pub storage: StorageConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Origin allowed by the CORS layer
    pub cors_allowed_origin: String,
    /// Stripe configuration
    pub stripe: StripeConfig,
    /// Run both payment writes in one transaction
    pub payment_writes_atomic: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_vars(&|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_vars(&|key| vars.get(key).cloned())
    }

    fn from_vars(vars: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let storage = match get_env_or_default(vars, "STORAGE_BACKEND", "postgres")
            .to_ascii_lowercase()
            .as_str()
        {
            "postgres" | "postgresql" => StorageConfig::Postgres(get_database_config(vars)?),
            "memory" => StorageConfig::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "STORAGE_BACKEND".to_string(),
                    format!("expected 'postgres' or 'memory', got '{other}'"),
                ));
            }
        };

        let host = parse_env(vars, "HOST", "0.0.0.0")?;
        let port = parse_env(vars, "PORT", "5000")?;
        let cors_allowed_origin =
            get_env_or_default(vars, "CORS_ALLOWED_ORIGIN", "http://localhost:5173");
        let stripe = StripeConfig::from_vars(vars)?;
        let payment_writes_atomic = parse_bool(vars, "PAYMENT_WRITES_ATOMIC")?;

        Ok(Self {
            storage,
            host,
            port,
            cors_allowed_origin,
            stripe,
            payment_writes_atomic,
            sentry_dsn: get_optional_env(vars, "SENTRY_DSN"),
            sentry_environment: get_optional_env(vars, "SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env(vars, "SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env(vars, "SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl DatabaseConfig {
    /// Load only the database settings from the environment.
    ///
    /// Used by tooling that talks to `PostgreSQL` without serving HTTP.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if neither `DATABASE_URL` nor the `DB_*`
    /// variables are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        get_database_config(&|key| std::env::var(key).ok())
    }
}

impl StripeConfig {
    fn from_vars(vars: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            secret_key: get_validated_secret(vars, "STRIPE_SECRET_KEY")?,
            api_base: get_env_or_default(vars, "STRIPE_API_BASE", "https://api.stripe.com")
                .trim_end_matches('/')
                .to_string(),
            currency: parse_env(vars, "PAYMENT_CURRENCY", "usd")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(
    vars: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<String, ConfigError> {
    vars(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(vars: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    vars(key).filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(vars: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    get_optional_env(vars, key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable (or its default) with `FromStr`.
fn parse_env<T>(
    vars: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(vars, key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a boolean flag; unset means `false`.
fn parse_bool(vars: &impl Fn(&str) -> Option<String>, key: &str) -> Result<bool, ConfigError> {
    match get_optional_env(vars, key) {
        None => Ok(false),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected a boolean, got '{other}'"),
            )),
        },
    }
}

/// Get database settings: `DATABASE_URL` first, then the `DB_*` parts.
fn get_database_config(
    vars: &impl Fn(&str) -> Option<String>,
) -> Result<DatabaseConfig, ConfigError> {
    if let Some(url) = get_optional_env(vars, "DATABASE_URL") {
        return Ok(DatabaseConfig::Url(SecretString::from(url)));
    }

    let user = get_required_env(vars, "DB_USER")
        .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL or DB_USER".to_string()))?;
    let password = SecretString::from(get_required_env(vars, "DB_PASS")?);
    let name = get_required_env(vars, "DB_NAME")?;
    let (host, port) = parse_db_host(&get_env_or_default(vars, "DB_HOST", DEFAULT_DB_HOST))?;

    Ok(DatabaseConfig::Parts {
        host,
        port,
        user,
        password,
        name,
    })
}

/// Split `host[:port]`.
fn parse_db_host(value: &str) -> Result<(String, u16), ConfigError> {
    match value.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidEnvVar("DB_HOST".to_string(), e.to_string()))?;
            Ok((host.to_string(), port))
        }
        None => Ok((value.to_string(), DEFAULT_DB_PORT)),
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key from the Stripe dashboard."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret.
fn get_validated_secret(
    vars: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<SecretString, ConfigError> {
    let value = get_required_env(vars, key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    const TEST_STRIPE_KEY: &str = "sk_test_51HqK2aB3xY9mK2nL5pQ7rT0uW4zC6dF8";

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("sk_test_your-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_stripe_key() {
        assert!(validate_secret_strength(TEST_STRIPE_KEY, "TEST_VAR").is_ok());
    }

    #[test]
    fn test_defaults_with_memory_backend() {
        let config = ServerConfig::from_map(&vars(&[
            ("STORAGE_BACKEND", "memory"),
            ("STRIPE_SECRET_KEY", TEST_STRIPE_KEY),
        ]))
        .unwrap();

        assert!(matches!(config.storage, StorageConfig::Memory));
        assert_eq!(config.port, 5000);
        assert_eq!(config.socket_addr().ip().to_string(), "0.0.0.0");
        assert_eq!(config.cors_allowed_origin, "http://localhost:5173");
        assert_eq!(config.stripe.api_base, "https://api.stripe.com");
        assert_eq!(config.stripe.currency, CurrencyCode::Usd);
        assert!(!config.payment_writes_atomic);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_database_url_takes_precedence() {
        let config = ServerConfig::from_map(&vars(&[
            ("DATABASE_URL", "postgres://u:p@db/parcels"),
            ("DB_USER", "ignored"),
            ("STRIPE_SECRET_KEY", TEST_STRIPE_KEY),
        ]))
        .unwrap();

        match config.storage {
            StorageConfig::Postgres(DatabaseConfig::Url(url)) => {
                assert_eq!(url.expose_secret(), "postgres://u:p@db/parcels");
            }
            other => panic!("unexpected storage config: {other:?}"),
        }
    }

    #[test]
    fn test_database_parts() {
        let config = ServerConfig::from_map(&vars(&[
            ("DB_USER", "parcel"),
            ("DB_PASS", "p@ss/word"),
            ("DB_NAME", "parcelDB"),
            ("DB_HOST", "db.internal:6543"),
            ("STRIPE_SECRET_KEY", TEST_STRIPE_KEY),
        ]))
        .unwrap();

        match config.storage {
            StorageConfig::Postgres(DatabaseConfig::Parts {
                host,
                port,
                user,
                password,
                name,
            }) => {
                assert_eq!(host, "db.internal");
                assert_eq!(port, 6543);
                assert_eq!(user, "parcel");
                assert_eq!(password.expose_secret(), "p@ss/word");
                assert_eq!(name, "parcelDB");
            }
            other => panic!("unexpected storage config: {other:?}"),
        }
    }

    #[test]
    fn test_missing_database_config() {
        let result = ServerConfig::from_map(&vars(&[("STRIPE_SECRET_KEY", TEST_STRIPE_KEY)]));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn test_missing_stripe_key() {
        let result = ServerConfig::from_map(&vars(&[("STORAGE_BACKEND", "memory")]));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref key)) if key == "STRIPE_SECRET_KEY")
        );
    }

    #[test]
    fn test_invalid_port_and_backend() {
        let result = ServerConfig::from_map(&vars(&[
            ("STORAGE_BACKEND", "memory"),
            ("STRIPE_SECRET_KEY", TEST_STRIPE_KEY),
            ("PORT", "eighty"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(ref key, _)) if key == "PORT"));

        let result = ServerConfig::from_map(&vars(&[
            ("STORAGE_BACKEND", "mongodb"),
            ("STRIPE_SECRET_KEY", TEST_STRIPE_KEY),
        ]));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar(ref key, _)) if key == "STORAGE_BACKEND")
        );
    }

    #[test]
    fn test_flags_and_currency() {
        let config = ServerConfig::from_map(&vars(&[
            ("STORAGE_BACKEND", "memory"),
            ("STRIPE_SECRET_KEY", TEST_STRIPE_KEY),
            ("PAYMENT_WRITES_ATOMIC", "true"),
            ("PAYMENT_CURRENCY", "EUR"),
            ("STRIPE_API_BASE", "http://localhost:12111/"),
        ]))
        .unwrap();

        assert!(config.payment_writes_atomic);
        assert_eq!(config.stripe.currency, CurrencyCode::Eur);
        assert_eq!(config.stripe.api_base, "http://localhost:12111");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ServerConfig::from_map(&vars(&[
            ("DATABASE_URL", "postgres://u:hunter2@db/parcels"),
            ("STRIPE_SECRET_KEY", TEST_STRIPE_KEY),
        ]))
        .unwrap();

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2"));
        assert!(!debug_output.contains(TEST_STRIPE_KEY));
    }
}
