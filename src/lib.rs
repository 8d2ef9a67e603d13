pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod response;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;
pub mod store;

use std::sync::Arc;

use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::db::{DatabaseProxy, DbInitError};
use crate::seed::SeedError;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Database(#[from] DbInitError),
    #[error(transparent)]
    Seed(#[from] SeedError),
}

/// Opens the database, applies the schema and seeds the catalog the first
/// time. The database is only marked ready after seeding succeeded, so a
/// failed seed is retried on the next start.
pub async fn bootstrap_database(config: &Config) -> Result<Arc<DatabaseProxy>, BootstrapError> {
    let proxy = DatabaseProxy::open(&config.db).await?;

    if proxy.ensure_schema().await? {
        tracing::info!(lists = config.word_lists.len(), "creating database, seeding catalog");
        seed::seed_word_lists(&proxy, &config.word_lists).await?;
        proxy.mark_schema_ready().await?;
    }

    Ok(Arc::new(proxy))
}

pub fn build_app(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
