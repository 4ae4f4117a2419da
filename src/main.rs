mod color;
mod config;
mod error;
mod fixtures;
mod models;
mod routes;
mod services;
mod state;
mod store;
mod validation;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::store::{EntityStore, MemoryStore, PgStore};

fn init_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();
}

async fn open_store(config: &config::Config) -> anyhow::Result<Arc<dyn EntityStore>> {
    match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.max_connections)
                .await
                .context("Error connecting DB")?;
            tracing::info!("using postgres store");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, data will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::Config::from_env()?;
    init_tracing();

    let store = open_store(&config).await?;

    if config.seed_fixtures {
        fixtures::seed(store.as_ref())
            .await
            .context("failed to load fixtures")?;
    }

    let state = state::AppState::new(store);

    let app = routes::routes().with_state(state);

    let listener = tokio::net::TcpListener::bind(config.addr())
        .await
        .with_context(|| format!("failed to bind {}", config.addr()))?;

    tracing::info!("server is chilling at http://{}", config.addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
