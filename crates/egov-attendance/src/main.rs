//! Attendance scraper and skip calculator for CHARUSAT's eGovernance
//! portal.
//!
//! One request runs one strictly sequential chain: login -> fetch ->
//! parse -> compute. Credentials are never persisted and sessions never
//! outlive a single call.

use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::analytics::AnalyticsStore;
use crate::calc::Thresholds;
use crate::config::AppConfig;
use crate::portal::{PortalClient, PortalConfig};
use crate::types::AppState;

mod analytics;
mod calc;
mod config;
mod portal;
mod server;
mod types;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let portal = match &config.base_url {
        Some(base_url) => PortalClient::with_config(PortalConfig {
            base_url: base_url.clone(),
            ..PortalConfig::default()
        }),
        None => PortalClient::new(),
    }
    .context("failed to build portal client")?;

    let analytics = Arc::new(
        AnalyticsStore::new(&config.analytics_db)
            .with_context(|| format!("failed to open analytics db at {}", config.analytics_db))?,
    );

    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState {
        portal,
        analytics,
        thresholds: Thresholds::default(),
        config,
    });

    let router = server::create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(address = %addr, version = env!("CARGO_PKG_VERSION"), "Server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
