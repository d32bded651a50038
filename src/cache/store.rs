//! Main cache store: TTL entries, checksums, hit/miss accounting
//!
//! All operations are synchronous and hold the store lock for a single map
//! operation only. The expiry check and the removal of an expired entry
//! happen under the same write lock, so readers never observe a
//! half-removed entry. Writers race last-write-wins; each entry is replaced
//! as a whole.

use crate::cache::{
    checksum::Checksum,
    config::CacheConfig,
    entry::CacheEntry,
    invalidation::InvalidationReason,
    ledger::SessionLedger,
    types::{CacheKey, CacheStats, CacheValue, CachedValue},
};
use chrono::Utc;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// In-process context cache with per-entry TTL and a session ledger
///
/// Owned by the service container and shared as `Arc<ContextCache>`.
pub struct ContextCache {
    /// Cache configuration
    pub(crate) config: CacheConfig,

    /// Internal storage
    store: RwLock<CacheStore>,

    /// Per-session injection records
    ledger: SessionLedger,
}

/// Internal cache storage
#[derive(Default)]
struct CacheStore {
    /// Main storage: key -> entry
    entries: HashMap<CacheKey, CacheEntry>,

    /// Counters; `size`, `hit_rate` and `active_sessions` are filled in on snapshot
    stats: CacheStats,
}

impl CacheStore {
    /// Remove an entry and account for why it went away
    fn remove_entry(&mut self, key: &str, reason: InvalidationReason) -> Option<CacheEntry> {
        let removed = self.entries.remove(key)?;
        match reason {
            InvalidationReason::Expired => self.stats.evictions_ttl += 1,
            _ => self.stats.invalidations += 1,
        }
        debug!(key, %reason, "Removed cache entry");
        Some(removed)
    }

    /// Look up a live entry, lazily evicting it if expired
    fn lookup(&mut self, key: &str) -> Option<CachedValue> {
        let expired = match self.entries.get(key) {
            None => {
                debug!(key, "Cache miss");
                self.stats.misses += 1;
                return None;
            }
            Some(entry) => entry.is_expired(),
        };

        if expired {
            debug!(key, "Cache entry expired");
            self.stats.misses += 1;
            self.remove_entry(key, InvalidationReason::Expired);
            return None;
        }

        self.stats.hits += 1;
        debug!(key, "Cache hit");
        self.entries.get(key).map(|entry| CachedValue {
            value: entry.value.clone(),
            checksum: entry.checksum().to_string(),
        })
    }
}

impl ContextCache {
    /// Create a new cache with the given configuration
    pub fn new(config: CacheConfig) -> Self {
        info!("Initializing context cache with config: {:?}", config);

        let ledger = SessionLedger::new(config.ttl_policy.session);

        Self {
            config,
            store: RwLock::new(CacheStore::default()),
            ledger,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Session injection ledger sharing this cache's lifetime
    pub fn ledger(&self) -> &SessionLedger {
        &self.ledger
    }

    fn write_store(&self) -> RwLockWriteGuard<'_, CacheStore> {
        // Entries are replaced whole, so a poisoned map is still consistent
        self.store.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Get a value from the cache
    pub fn get(&self, key: &str) -> Option<CacheValue> {
        self.write_store().lookup(key).map(|cached| cached.value)
    }

    /// Get a value together with the checksum captured when it was written
    pub fn get_with_checksum(&self, key: &str) -> Option<CachedValue> {
        self.write_store().lookup(key)
    }

    /// Store a value for `ttl`, returning its checksum
    pub fn set(&self, key: impl Into<CacheKey>, value: impl Into<CacheValue>, ttl: Duration) -> Checksum {
        let key = key.into();
        let entry = CacheEntry::new(key.clone(), value.into(), ttl);
        let checksum = entry.checksum().to_string();

        debug!(key = %key, checksum = %checksum, ttl_ms = ttl.as_millis() as u64, "Cache set");
        self.write_store().entries.insert(key, entry);

        checksum
    }

    /// Get a value, or compute it with `producer` on a miss and store it
    ///
    /// The producer runs without any lock held. Its error is returned as is
    /// and nothing is cached for it. Concurrent misses on one key each run
    /// their own producer.
    pub async fn get_or_insert_with<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> std::result::Result<CachedValue, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<CacheValue, E>>,
    {
        if let Some(cached) = self.get_with_checksum(key) {
            return Ok(cached);
        }

        let value = producer().await?;
        let checksum = self.set(key, value.clone(), ttl);
        Ok(CachedValue { value, checksum })
    }

    /// Check if a live entry exists (does not touch hit/miss counters)
    pub fn contains_key(&self, key: &str) -> bool {
        let store = self.store.read().unwrap_or_else(|e| e.into_inner());
        store
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    /// Remove a specific entry; true iff it existed
    pub fn invalidate_key(&self, key: &str) -> bool {
        self.write_store()
            .remove_entry(key, InvalidationReason::Manual)
            .is_some()
    }

    /// Remove every entry whose key starts with `prefix`
    pub fn invalidate_by_prefix(&self, prefix: &str) -> usize {
        self.invalidate_by_prefix_with_reason(
            prefix,
            InvalidationReason::PrefixMatch {
                prefix: prefix.to_string(),
            },
        )
    }

    pub(crate) fn invalidate_key_with_reason(&self, key: &str, reason: InvalidationReason) -> bool {
        self.write_store().remove_entry(key, reason).is_some()
    }

    pub(crate) fn invalidate_by_prefix_with_reason(
        &self,
        prefix: &str,
        reason: InvalidationReason,
    ) -> usize {
        let mut store = self.write_store();

        let keys_to_remove: Vec<CacheKey> = store
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();

        for key in &keys_to_remove {
            store.remove_entry(key, reason.clone());
        }

        info!(prefix, removed = keys_to_remove.len(), %reason, "Invalidated entries by prefix");
        keys_to_remove.len()
    }

    /// Empty cache entries and the session ledger
    pub fn clear_all(&self) {
        let entries = self.clear_entries();
        let sessions = self.ledger.clear();
        info!(entries, sessions, "Cleared cache and session ledger");
    }

    /// Empty cache entries, keeping session ledger state
    pub fn clear_data_cache(&self) {
        let entries = self.clear_entries();
        info!(entries, "Cleared data cache");
    }

    fn clear_entries(&self) -> usize {
        let mut store = self.write_store();
        let count = store.entries.len();
        store.entries.clear();
        store.stats.invalidations += count as u64;
        count
    }

    /// Remove all expired entries and ledger records, returning the number of
    /// cache entries removed
    pub fn gc(&self) -> usize {
        let now = Utc::now();
        let mut store = self.write_store();

        let expired_keys: Vec<CacheKey> = store
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            store.remove_entry(key, InvalidationReason::Expired);
        }
        drop(store);

        let sessions = self.ledger.sweep_expired();
        if !expired_keys.is_empty() || sessions > 0 {
            debug!(
                entries = expired_keys.len(),
                sessions, "GC removed expired entries"
            );
        }

        expired_keys.len()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let store = self.store.read().unwrap_or_else(|e| e.into_inner());
        let mut stats = store.stats.clone();
        stats.size = store.entries.len();
        drop(store);

        stats.hit_rate = CacheStats::compute_hit_rate(stats.hits, stats.misses);
        stats.active_sessions = self.ledger.active_sessions();
        stats
    }

    /// Get number of entries in cache (expired-but-unswept included)
    pub fn len(&self) -> usize {
        let store = self.store.read().unwrap_or_else(|e| e.into_inner());
        store.entries.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Background task for periodic GC
///
/// Returns immediately with a finished handle when auto GC is disabled.
/// Abort the handle on shutdown.
pub fn start_auto_gc(cache: Arc<ContextCache>) -> JoinHandle<()> {
    if !cache.config.enable_auto_gc {
        info!("Automatic cache GC disabled");
        return tokio::spawn(async {});
    }

    let period = cache.config.gc_interval;
    info!("Starting automatic cache GC task (interval: {:?})", period);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // First tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;

            let removed = cache.gc();
            if removed > 0 {
                debug!("Auto GC: removed {} expired entries", removed);
            }
            if cache.len() > 10_000 {
                warn!(entries = cache.len(), "Cache holds more entries than expected after GC");
            }
        }
    })
}
