//! CASALINK Server — Application entry point.
//!
//! Connects to SurrealDB, applies pending migrations, and leaves a ready
//! database for the API layer. The HTTP surface itself is layered on
//! separately.

use casalink_db::{DbConfig, DbManager, run_migrations};
use tracing_subscriber::EnvFilter;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("casalink=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting CASALINK server...");

    let config = DbConfig {
        url: env_or("CASALINK_DB_URL", "127.0.0.1:8000"),
        namespace: env_or("CASALINK_DB_NAMESPACE", "casalink"),
        database: env_or("CASALINK_DB_DATABASE", "main"),
        username: env_or("CASALINK_DB_USER", "root"),
        password: env_or("CASALINK_DB_PASS", "root"),
    };

    let manager = match DbManager::connect(&config).await {
        Ok(manager) => manager,
        Err(error) => {
            tracing::error!(%error, "failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(error) = run_migrations(manager.db()).await {
        tracing::error!(%error, "failed to run migrations");
        std::process::exit(1);
    }

    tracing::info!("CASALINK database ready.");
}
