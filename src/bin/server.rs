//! HTTP API server for the melody-learning pipeline.
//!
//! Reads configuration from the environment (and an optional `.env` file)
//! and serves the extract-text / mnemonic-plan / generate-song endpoints.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use melody_learning::server::{build_router, AppState};
use melody_learning::{Pipeline, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = Settings::from_env();
    let bind_addr = settings.bind_addr.clone();
    let pipeline = Pipeline::new(settings)?;

    let state = AppState {
        pipeline: Arc::new(pipeline),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("listening on http://{}", bind_addr);
    info!("health check: http://{}/health", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
