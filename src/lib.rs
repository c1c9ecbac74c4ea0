pub mod api;
pub mod config;
pub mod error;
pub mod external;
pub mod logic;
pub mod model;
pub mod repository;
pub mod seed;
pub mod service;
pub mod store;

// Export API types
pub use api::routes;
pub use api::AppState;

pub use error::{PimsError, PimsResult};

// Export all model types
pub use model::*;

// Export store types
pub use store::{MemoryStore, PostgresStore, Store};

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;
use crate::external::{DocumentStorageClient, HttpDocumentStorageClient, HttpLtsaClient, LtsaClient};

/// Router with state and middleware applied, ready to serve
pub fn build_app<S: Store + 'static>(state: AppState<S>) -> Router {
    api::routes::create_router::<S>()
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Build the app state around `store` with HTTP clients for the external services
pub fn build_state<S: Store + 'static>(store: Arc<S>, config: AppConfig) -> anyhow::Result<AppState<S>> {
    let ltsa: Arc<dyn LtsaClient> = Arc::new(HttpLtsaClient::new(config.ltsa.clone())?);
    let storage: Arc<dyn DocumentStorageClient> =
        Arc::new(HttpDocumentStorageClient::new(config.storage.clone())?);
    Ok(AppState::new(store, config, ltsa, storage))
}

async fn serve_store<S: Store + 'static>(store: Arc<S>, config: AppConfig) -> anyhow::Result<()> {
    use tokio::net::TcpListener;

    // Load seed data for local development (optional)
    if std::env::var("LOAD_SEED_DATA").unwrap_or_default() == "true" {
        log::info!("Loading seed data...");
        seed::load_seed_data(&*store).await?;
    }

    let bind_address = config.server_address();
    let app = build_app(build_state(store, config)?);
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("PIMS API running on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Start the server from configuration. Serves from PostgreSQL unless
/// `database.in_memory` is set.
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    if config.database.in_memory {
        log::warn!("Serving from the in-memory store; data is lost on shutdown");
        return serve_store(Arc::new(MemoryStore::new()), config).await;
    }

    log::info!("Connecting to PostgreSQL...");
    let database_url = config.database_url()?;
    let postgres_store =
        PostgresStore::new(&database_url, config.database.max_connections.unwrap_or(20)).await?;

    log::info!("Running database migrations...");
    postgres_store.migrate().await?;

    serve_store(Arc::new(postgres_store), config).await
}
