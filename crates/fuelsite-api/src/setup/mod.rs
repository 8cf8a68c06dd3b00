//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use fuelsite_core::UploadServerConfig;
use fuelsite_storage::LocalStorage;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing with `RUST_LOG`, defaulting to info for this crate and tower-http.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fuelsite_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize storage, state and routes
pub async fn initialize_app(config: &UploadServerConfig) -> Result<(Arc<AppState>, axum::Router)> {
    config
        .validate()
        .context("Configuration validation failed")?;

    let storage = LocalStorage::new(&config.upload_dir, config.uploads_base_url())
        .await
        .context("Failed to initialize upload storage")?;

    tracing::info!(upload_dir = %config.upload_dir, "Local storage initialized");

    let state = Arc::new(AppState::new(config, Arc::new(storage)));
    let router = routes::setup_routes(config, state.clone())?;

    Ok((state, router))
}
