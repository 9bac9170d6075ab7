// =============================================================================
// Central application state
// =============================================================================
//
// Everything a request handler needs, shared via `Arc<AppState>`: the loaded
// configuration, the upstream blob client, the series cache, and a served-
// request counter surfaced by the health endpoint. Atomics for the counter,
// `parking_lot` inside the cache; nothing else is mutable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::cache::SeriesCache;
use crate::config::Config;
use crate::storage::StorageClient;

/// Shared application state across all handlers.
pub struct AppState {
    pub config: Config,
    pub storage: StorageClient,
    pub cache: SeriesCache,
    requests_served: AtomicU64,
}

impl AppState {
    pub fn new(config: Config, storage: StorageClient) -> Self {
        let cache = SeriesCache::new(Duration::from_secs(config.cache_ttl_secs));
        Self {
            config,
            storage,
            cache,
            requests_served: AtomicU64::new(0),
        }
    }

    /// Count one fully-served prices request; returns the new total.
    pub fn record_served(&self) -> u64 {
        self.requests_served.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn requests_served(&self) -> u64 {
        self.requests_served.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn served_counter_increments() {
        let state = AppState::new(
            Config::default(),
            StorageClient::new(&Config::default().storage, None),
        );
        assert_eq!(state.requests_served(), 0);
        assert_eq!(state.record_served(), 1);
        assert_eq!(state.record_served(), 2);
        assert_eq!(state.requests_served(), 2);
    }
}
