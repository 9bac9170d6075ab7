// =============================================================================
// Helios Price Service — Main Entry Point
// =============================================================================
//
// GET /api/v1/prices?symbol=MSFT fetches the symbol's raw price-history blob
// from the upstream store, repairs the malformed payload, computes the
// configured RSI / SMA / EMA columns, and returns the enriched series as a
// JSON array.
// =============================================================================

use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use helios_prices::api;
use helios_prices::app_state::AppState;
use helios_prices::config::Config;
use helios_prices::storage::StorageClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Helios Price Service — Starting Up                ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let config_path =
        std::env::var("HELIOS_CONFIG").unwrap_or_else(|_| "helios_config.json".into());
    let mut config = Config::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });

    if let Ok(addr) = std::env::var("HELIOS_BIND_ADDR") {
        config.bind_addr = addr;
    }

    let access_key = std::env::var("HELIOS_STORAGE_KEY")
        .ok()
        .filter(|k| !k.is_empty());
    if access_key.is_none() {
        warn!("HELIOS_STORAGE_KEY not set — upstream requests go out unsigned");
    }

    info!(
        endpoint = %config.storage.endpoint,
        container = %config.storage.container,
        prefix = %config.storage.blob_prefix,
        "Upstream blob store configured"
    );
    info!(
        rsi = config.indicators.rsi_period,
        sma = config.indicators.sma_period,
        ema = config.indicators.ema_period,
        alpha = config.indicators.ema_alpha,
        ordering = ?config.bar_ordering,
        "Indicator parameters"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let storage = StorageClient::new(&config.storage, access_key);
    let state = Arc::new(AppState::new(config, storage));

    // ── 3. Cache sweeper ─────────────────────────────────────────────────
    let ttl_secs = state.config.cache_ttl_secs;
    if ttl_secs > 0 {
        let sweep_state = state.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(tokio::time::Duration::from_secs(ttl_secs)).await;
                let evicted = sweep_state.cache.evict_expired();
                if evicted > 0 {
                    debug!(evicted, "expired cache entries evicted");
                }
            }
        });
    }

    // ── 4. Start the API server ──────────────────────────────────────────
    let bind_addr = state.config.bind_addr.clone();
    let app = api::rest::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding API listener on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");
    axum::serve(listener, app)
        .await
        .context("API server failed")?;

    Ok(())
}
