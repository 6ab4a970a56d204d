//! Banking Back-Office - Main Application Entry Point
//!
//! This is a REST API server for card-funded withdrawals and transfers between
//! bank accounts, with an append-only transaction ledger and an account
//! balance overview.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Storage**: PostgreSQL with sqlx, or an in-process store for demos
//! - **Money**: `rust_decimal`, serialized as strings
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Open the configured store (pool + migrations for PostgreSQL)
//! 3. Build HTTP router with routes and middleware
//! 4. Start server on configured port

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;
mod store;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    config::{Config, StorageBackend},
    handlers::AppState,
    store::{Store, memory::MemoryStore, postgres::PgStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!(storage = ?config.storage, "Configuration loaded");

    match (config.storage, config.database_url.as_deref()) {
        (StorageBackend::Memory, _) => {
            tracing::warn!("Using in-memory store; all data is lost on shutdown");
            let store = MemoryStore::demo(config.lock_timeout());
            serve(store, config.server_port).await
        }
        (StorageBackend::Postgres, Some(database_url)) => {
            let pool = db::create_pool(database_url, config.db_max_connections).await?;
            tracing::info!("Database pool created");

            db::run_migrations(&pool).await?;
            tracing::info!("Database migrations complete");

            let store = PgStore::new(pool, config.lock_timeout());
            serve(store, config.server_port).await
        }
        (StorageBackend::Postgres, None) => Err(config::ConfigError::MissingDatabaseUrl.into()),
    }
}

async fn serve<S: Store>(store: S, port: u16) -> anyhow::Result<()> {
    let app = handlers::router(AppState::new(Arc::new(store)));

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
