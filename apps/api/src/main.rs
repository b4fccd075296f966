mod catalog;
mod config;
mod db;
mod errors;
mod matching;
mod models;
mod routes;
mod state;
mod store;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StoreBackend};
use crate::db::{create_pool, run_migrations};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jobmatch API v{}", env!("CARGO_PKG_VERSION"));

    let store = build_store(&config).await?;
    info!(
        "Store backend: {:?}, default laxity {}%",
        config.store_backend, config.default_laxity
    );

    let state = AppState {
        store,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Connects the configured backend. Postgres gets its migrations applied first.
async fn build_store(config: &Config) -> Result<Arc<dyn Store>> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres backend")?;
            let pool = create_pool(url, config.db_max_connections).await?;
            run_migrations(&pool, config.migrations_dir.as_deref()).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
