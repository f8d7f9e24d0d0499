//! AQI Proxy - Air quality lookups by city
//!
//! Serves a small REST API in front of the WAQI API, keeping recent lookups
//! in a bounded in-memory cache.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use aqiproxy::cache::LookupCache;
use aqiproxy::cli::{Cli, ProxyConfig};
use aqiproxy::data::WaqiClient;
use aqiproxy::service::AqiService;
use aqiproxy::{logging, server};

/// Logs a warning block when the API token was never configured
fn warn_placeholder_token() {
    tracing::warn!("{}", "=".repeat(60));
    tracing::warn!("API token not configured!");
    tracing::warn!("Please set your WAQI API token:");
    tracing::warn!("  PowerShell: $env:AQI_TOKEN = 'YOUR_TOKEN_HERE'");
    tracing::warn!("  Bash:       export AQI_TOKEN='YOUR_TOKEN_HERE'");
    tracing::warn!("Get free token: https://aqicn.org/data-platform/token/");
    tracing::warn!("{}", "=".repeat(60));
}

/// Resolves on Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; flags and the environment still apply
    let dotenv_result = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = ProxyConfig::from_cli(&cli)?;

    logging::init(config.log_format).context("Failed to initialize logging")?;

    if let Err(e) = dotenv_result {
        if !e.not_found() {
            tracing::warn!("Failed to load .env file: {}", e);
        }
    }

    if config.token_is_placeholder() {
        warn_placeholder_token();
    }

    tracing::info!("Starting AQI proxy...");
    tracing::info!(
        "Cache TTL: {}s, Max Entries: {}, Fetch timeout: {}s",
        config.cache_ttl.as_secs(),
        config.max_entries,
        config.fetch_timeout.as_secs()
    );

    let provider = WaqiClient::with_base_url(&config.token, config.fetch_timeout, &config.base_url)
        .context("Failed to build WAQI client")?;
    let cache = Arc::new(LookupCache::new(config.cache_ttl, config.max_entries));
    let service = AqiService::new(cache, Arc::new(provider));

    let router = server::build_router(service, config.enable_cors);
    server::serve(router, config.listen_addr, shutdown_signal())
        .await
        .with_context(|| format!("Server on {} failed", config.listen_addr))?;

    Ok(())
}
