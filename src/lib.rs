//! # Ouroboros Context (ouroboros-context)
//!
//! Context-stack cache for an AI coordinator: caches the text layers
//! (repository docs, ticket chains, thread lineage, execution state) that are
//! injected into agent prompts per conversation thread.
//!
//! ## Features
//!
//! - TTL store with write-time checksums and hit/miss accounting
//! - Session injection ledger with change detection, so only deltas are re-sent
//! - Per-thread context stacks with fork semantics for child threads
//! - Webhook-driven invalidation (issues, pull requests, pushes)
//! - Periodic GC and a stats snapshot for health endpoints
//!
//! The cache is in-process and non-persistent. One [`ContextCache`] is owned
//! by the service container and shared as `Arc<ContextCache>`.
//!
//! ## Turn flow
//!
//! ```rust
//! use ouroboros_context::{CacheConfig, ContextCache, CachedContextStack, ContextLayer, LayerKind};
//!
//! let cache = ContextCache::new(CacheConfig::default());
//!
//! let stack = CachedContextStack::new(
//!     "thread-1",
//!     vec![ContextLayer::new(LayerKind::RepoContext, "# Project rules")],
//! );
//! cache.cache_context_stack(&stack);
//!
//! // First turn: everything is new
//! let changes = cache.ledger().detect_changes("session-1", &stack.checksums);
//! assert!(changes.has_changes);
//! cache.ledger().record_injection("session-1", "thread-1", stack.checksums.clone());
//!
//! // Next turn with the same content: nothing to re-send
//! let changes = cache.ledger().detect_changes("session-1", &stack.checksums);
//! assert!(!changes.has_changes);
//! ```

pub mod cache;
pub mod context;
pub mod error;
pub mod telemetry;

// Re-export main types for convenience
pub use cache::{
    start_auto_gc, CacheConfig, CacheConfigBuilder, CacheStats, CachedValue, ChangeDetection,
    ContextCache, InvalidationReason, LayerChecksums, SessionInjectionRecord, SessionLedger,
    TtlPolicy, WebhookDetails, WebhookEventKind,
};
pub use context::{CachedContextStack, ContextLayer, LayerKind, LayerOverride};
pub use error::{CacheError, Result};
pub use telemetry::init_tracing;
