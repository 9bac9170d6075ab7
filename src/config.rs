// =============================================================================
// Configuration — explicit, file-backed service settings
// =============================================================================
//
// Everything tunable lives in one JSON file (`helios_config.json` by default,
// path overridable via `HELIOS_CONFIG`). All fields carry `#[serde(default)]`
// so an older or partial config file never breaks loading. There are no
// ambient singletons: `main` loads a `Config` once and injects it.
//
// The storage access key is deliberately NOT part of the file — it is read
// from the `HELIOS_STORAGE_KEY` environment variable in `main`.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::BarOrdering;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_endpoint() -> String {
    "https://tradingsystem.blob.core.windows.net".to_string()
}

fn default_account() -> String {
    "tradingsystem".to_string()
}

fn default_container() -> String {
    "price-history".to_string()
}

fn default_blob_prefix() -> String {
    "iex-price-history".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_rsi_period() -> usize {
    14
}

fn default_sma_period() -> usize {
    100
}

fn default_ema_period() -> usize {
    50
}

fn default_ema_alpha() -> f64 {
    // The feed pipeline runs EMA(50) with alpha = 1/50.
    0.02
}

fn default_cache_ttl_secs() -> u64 {
    300
}

// =============================================================================
// StorageConfig
// =============================================================================

/// Where the raw price-history blobs live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the blob store gateway.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Account name carried in the `Authorization: SharedKey` header.
    #[serde(default = "default_account")]
    pub account: String,

    /// Container holding the price-history blobs.
    #[serde(default = "default_container")]
    pub container: String,

    /// Path prefix inside the container; blobs are `{prefix}/{SYMBOL}.json`.
    #[serde(default = "default_blob_prefix")]
    pub blob_prefix: String,

    /// Per-request timeout for upstream fetches, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            account: default_account(),
            container: default_container(),
            blob_prefix: default_blob_prefix(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// =============================================================================
// IndicatorConfig
// =============================================================================

/// Periods and smoothing applied to every served series. Defaults match the
/// upstream pipeline: RSI(14), SMA(100), EMA(50, alpha = 1/50).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorConfig {
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    #[serde(default = "default_sma_period")]
    pub sma_period: usize,

    #[serde(default = "default_ema_period")]
    pub ema_period: usize,

    /// EMA smoothing factor. Paired with `ema_period` by the operator; the
    /// engine does not derive one from the other.
    #[serde(default = "default_ema_alpha")]
    pub ema_alpha: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: default_rsi_period(),
            sma_period: default_sma_period(),
            ema_period: default_ema_period(),
            ema_alpha: default_ema_alpha(),
        }
    }
}

// =============================================================================
// Config
// =============================================================================

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the API server binds to. Env override: `HELIOS_BIND_ADDR`.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub indicators: IndicatorConfig,

    /// Seconds a computed series stays cached. Zero disables the cache.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Chronological direction of the upstream feed.
    #[serde(default)]
    pub bar_ordering: BarOrdering,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            storage: StorageConfig::default(),
            indicators: IndicatorConfig::default(),
            cache_ttl_secs: default_cache_ttl_secs(),
            bar_ordering: BarOrdering::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}
