//! # Context Cache
//!
//! In-process TTL cache for the text layers injected into agent prompts.
//!
//! ## Features
//!
//! - **TTL-Based Expiration**: per-entry lifetime fixed at write time, lazy
//!   eviction on read plus a periodic GC sweep
//! - **Content Checksums**: every write returns the value's fingerprint for
//!   immediate change detection
//! - **Session Ledger**: per-session record of injected layer checksums with
//!   change detection (content and schema drift)
//! - **Webhook Invalidation**: git-host events mapped onto the key-space
//! - **Metrics**: hit/miss counters, hit rate, live sessions
//!
//! ## Example
//!
//! ```rust
//! use ouroboros_context::cache::{keys, ttl, CacheConfig, ContextCache, WebhookDetails};
//!
//! let cache = ContextCache::new(CacheConfig::default());
//!
//! let key = keys::ticket_key("acme/api", 12);
//! let checksum = cache.set(key.clone(), "#12 Fix login redirect", ttl::TICKET_CHAIN_TTL);
//! assert_eq!(cache.get_with_checksum(&key).unwrap().checksum, checksum);
//!
//! let removed = cache.invalidate_for_webhook("issue_close", Some("acme/api"), &WebhookDetails::ticket(12));
//! assert_eq!(removed, 1);
//! assert!(cache.get(&key).is_none());
//! ```

pub mod checksum;
pub mod config;
pub mod entry;
pub mod invalidation;
pub mod keys;
pub mod ledger;
pub mod store;
pub mod ttl;
pub mod types;

pub use checksum::{estimate_tokens, fingerprint, Checksum};
pub use config::{CacheConfig, CacheConfigBuilder};
pub use entry::CacheEntry;
pub use invalidation::{InvalidationReason, WebhookDetails, WebhookEventKind};
pub use keys::CacheKeyBuilder;
pub use ledger::{ChangeDetection, LayerChecksums, SessionInjectionRecord, SessionLedger};
pub use store::{start_auto_gc, ContextCache};
pub use ttl::TtlPolicy;
pub use types::{CacheKey, CacheStats, CacheValue, CachedValue};
