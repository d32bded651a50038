//! Core type definitions for the cache system

use crate::cache::checksum::Checksum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache key type - see `cache::keys` for the key-space convention
pub type CacheKey = String;

/// Cache value type - layer text or a serialized context stack
pub type CacheValue = String;

/// A value read back together with the checksum captured when it was written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedValue {
    pub value: CacheValue,
    pub checksum: Checksum,
}

/// Statistics snapshot for the metrics/health endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CacheStats {
    /// Number of entries currently in the store (expired-but-unswept included)
    pub size: usize,

    /// Total number of cache hits
    pub hits: u64,

    /// Total number of cache misses
    pub misses: u64,

    /// `hits / (hits + misses) * 100`, rounded to two decimals
    pub hit_rate: f64,

    /// Live session ledger records
    pub active_sessions: usize,

    /// Entries dropped because their TTL elapsed (lazily or by GC)
    pub evictions_ttl: u64,

    /// Entries dropped by explicit invalidation
    pub invalidations: u64,
}

impl CacheStats {
    /// Hit rate as a percentage rounded to two decimals; 0.0 before any lookup
    pub fn compute_hit_rate(hits: u64, misses: u64) -> f64 {
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            let rate = (hits as f64 / total as f64) * 100.0;
            (rate * 100.0).round() / 100.0
        }
    }

    /// Total lookups served
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ size: {}, hits: {}, misses: {}, hit_rate: {:.2}%, active_sessions: {}, evictions_ttl: {}, invalidations: {} }}",
            self.size,
            self.hits,
            self.misses,
            self.hit_rate,
            self.active_sessions,
            self.evictions_ttl,
            self.invalidations
        )
    }
}
