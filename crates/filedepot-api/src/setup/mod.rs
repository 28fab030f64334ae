//! Application setup and initialization
//!
//! All initialization logic lives here instead of main.rs, so pieces can be
//! reused and tested in isolation.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::Result;
use filedepot_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry();

    tracing::info!(environment = %config.environment, "Configuration loaded");

    // Setup database
    let pool = database::setup_database(&config).await?;

    // Initialize repositories, storage, and the thumbnail queue
    let state = services::initialize_services(&config, pool).await?;

    // Setup routes
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
