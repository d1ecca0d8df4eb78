//! Configuration check command.
//!
//! Loads the same configuration the server would, including secret
//! validation, and logs the result with secrets redacted.

use parcelpath_server::config::{ServerConfig, StorageConfig};

use super::CommandError;

/// Load and validate the server configuration.
///
/// # Errors
///
/// Returns `CommandError::Config` if the environment is incomplete or a
/// secret fails validation.
pub fn run() -> Result<(), CommandError> {
    let config = ServerConfig::from_env()?;

    let backend = match config.storage {
        StorageConfig::Postgres(_) => "postgres",
        StorageConfig::Memory => "memory",
    };
    tracing::info!(
        addr = %config.socket_addr(),
        backend,
        currency = %config.stripe.currency,
        payment_writes_atomic = config.payment_writes_atomic,
        sentry = config.sentry_dsn.is_some(),
        "Configuration OK"
    );
    tracing::debug!(?config, "Resolved configuration");
    Ok(())
}
