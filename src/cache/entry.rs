//! Cache entry management with TTL support

use crate::cache::checksum::{fingerprint, Checksum};
use crate::cache::types::{CacheKey, CacheValue};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A cache entry with its write-time checksum and absolute expiry
///
/// The checksum is always derived from the value here; there is no way to
/// construct an entry with a caller-supplied checksum.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cache key
    pub key: CacheKey,

    /// The cached value
    pub value: CacheValue,

    /// Fingerprint of `value`, captured at write time
    checksum: Checksum,

    /// When the entry was written
    pub created_at: DateTime<Utc>,

    /// When the entry expires
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create a new entry expiring `ttl` from now
    pub fn new(key: CacheKey, value: CacheValue, ttl: Duration) -> Self {
        Self::new_at(key, value, ttl, Utc::now())
    }

    /// Create a new entry as if written at `now`
    pub fn new_at(key: CacheKey, value: CacheValue, ttl: Duration, now: DateTime<Utc>) -> Self {
        let checksum = fingerprint(&value);

        Self {
            key,
            value,
            checksum,
            created_at: now,
            expires_at: expiry_from(now, ttl),
        }
    }

    /// Checksum captured when the entry was written
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Check expiry against a given instant (used by sweeps to take one clock reading)
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// `now + ttl`, saturating at the far future for absurd durations
pub(crate) fn expiry_from(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
