//! Rolegraph API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dev_seed;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

#[cfg(test)]
mod test_support;

use rolegraph_core::AppError;
use tracing::info;

use crate::api_config::{ApiCommand, ApiConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let pool = api_services::connect_and_migrate(&config.database_url).await?;

    match config.command {
        ApiCommand::Migrate => {
            info!("database migrations applied successfully");
            return Ok(());
        }
        ApiCommand::Seed => {
            dev_seed::run(pool, &config).await?;
            return Ok(());
        }
        ApiCommand::Serve => {}
    }

    let app_state = api_services::build_app_state(pool, &config).await?;
    let app = api_router::build_router(app_state, &config.frontend_url)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind API listener: {error}")))?;

    info!(%address, cache_backend = ?config.permission_cache_backend, "rolegraph-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("server error: {error}")))
}
