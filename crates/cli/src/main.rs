//! ParcelPath CLI - Database migrations and configuration checks.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending database migrations
//! parcelpath migrate
//!
//! # Validate the server environment without starting it
//! parcelpath check-config
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "parcelpath")]
#[command(author, version, about = "ParcelPath CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load and validate the server configuration
    CheckConfig,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::CheckConfig => commands::check_config::run()?,
    }
    Ok(())
}
