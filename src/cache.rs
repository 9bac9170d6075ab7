// =============================================================================
// SeriesCache — per-symbol TTL cache of served records
// =============================================================================
//
// The upstream blob for a symbol changes at feed cadence, not per request, so
// the handler caches the fully-enriched record array and serves repeats from
// memory. The engine itself stays pure; this is the only stateful piece
// between requests. Entries past their TTL are treated as absent and are
// swept by a background task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde_json::Value;

struct CacheEntry {
    records: Arc<Vec<Value>>,
    inserted_at: Instant,
}

/// Thread-safe TTL cache keyed by upper-cased symbol.
pub struct SeriesCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl SeriesCache {
    /// A zero `ttl` disables the cache entirely.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Fetch the cached records for `symbol`, if present and fresh.
    pub fn get(&self, symbol: &str) -> Option<Arc<Vec<Value>>> {
        if self.ttl.is_zero() {
            return None;
        }
        let map = self.entries.read();
        let entry = map.get(symbol)?;
        if entry.inserted_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.records.clone())
    }

    /// Insert or refresh the records for `symbol`.
    pub fn insert(&self, symbol: &str, records: Arc<Vec<Value>>) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries.write().insert(
            symbol.to_string(),
            CacheEntry {
                records,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        let mut map = self.entries.write();
        let before = map.len();
        map.retain(|_, e| e.inserted_at.elapsed() <= self.ttl);
        before - map.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
