//! In-memory TTL cache for fingerprint results and rendered previews.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, info};

use haze_core::constants::{DEFAULT_CACHE_TTL, DEFAULT_SWEEP_INTERVAL};

use crate::key::CacheKey;
use crate::sweeper::Sweepable;

/// Cache entry with an absolute expiry (`None` never expires).
#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Cache configuration.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// TTL applied by [`TtlCache::set`]
    pub default_ttl: Duration,
    /// Interval between background sweeps
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_CACHE_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Key → value store with per-entry expiry.
///
/// Expired entries are removed lazily when read and proactively by [`TtlCache::sweep`].
/// There is no capacity bound. All operations take the lock for a short, non-async
/// critical section and never suspend.
pub struct TtlCache<V> {
    entries: RwLock<HashMap<CacheKey, CacheEntry<V>>>,
    config: CacheConfig,
}

impl<V: Clone> TtlCache<V> {
    /// Creates a new cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a cache with custom configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Gets a cached value.
    ///
    /// An expired entry is deleted and reported as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired_at(now) => {
                    debug!(key = %key, "Cache hit");
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        // Re-check under the write lock: a concurrent set may have refreshed it.
        let mut entries = self.entries.write();
        match entries.get(key) {
            Some(entry) if entry.is_expired_at(now) => {
                entries.remove(key);
                debug!(key = %key, "Cache entry expired");
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Caches a value with the default TTL.
    pub fn set(&self, key: CacheKey, value: V) {
        self.set_with_ttl(key, value, Some(self.config.default_ttl));
    }

    /// Caches a value with a custom TTL. `None` stores it without expiry.
    ///
    /// Overwrites any existing entry for the key.
    pub fn set_with_ttl(&self, key: CacheKey, value: V, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        debug!(key = %key, ttl_ms = ttl.map(|t| t.as_millis() as u64), "Cache set");
        self.entries.write().insert(key, CacheEntry { value, expires_at });
    }

    /// Removes all expired entries, returning how many were dropped.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired_at(now));
        let removed = before - entries.len();
        drop(entries);

        if removed > 0 {
            info!(removed, "Swept expired cache entries");
        }
        removed
    }

    /// Returns true if an entry (expired or not) is physically stored under `key`.
    pub fn contains_raw(&self, key: &CacheKey) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Returns the number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.read();
        let expired = entries.values().filter(|e| e.is_expired_at(now)).count();
        CacheStats {
            total_entries: entries.len(),
            expired_entries: expired,
            valid_entries: entries.len().saturating_sub(expired),
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync + 'static> Sweepable for TtlCache<V> {
    fn sweep_expired(&self) -> usize {
        self.sweep()
    }
}

/// Cache statistics.
#[derive(Clone, Debug)]
pub struct CacheStats {
    /// Entries physically stored
    pub total_entries: usize,
    /// Stored entries past their expiry, awaiting a read or sweep
    pub expired_entries: usize,
    /// Stored entries still servable
    pub valid_entries: usize,
}
