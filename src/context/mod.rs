//! # Context Stacks
//!
//! Layers, the per-thread stacks assembled from them, and forking of a
//! parent thread's stack into a child.
//!
//! ```rust
//! use ouroboros_context::cache::{CacheConfig, ContextCache};
//! use ouroboros_context::context::{CachedContextStack, ContextLayer, LayerKind, LayerOverride};
//!
//! let cache = ContextCache::new(CacheConfig::default());
//! cache.cache_context_stack(&CachedContextStack::new(
//!     "thread-1",
//!     vec![
//!         ContextLayer::new(LayerKind::RepoContext, "# Project rules"),
//!         ContextLayer::new(LayerKind::TicketChain, "#12 Fix login redirect"),
//!     ],
//! ));
//!
//! let child = cache
//!     .fork_context_stack(
//!         "thread-1",
//!         "thread-2",
//!         &[LayerOverride::new(LayerKind::ExecutionState, "Step 1: reproduce")],
//!     )
//!     .expect("parent stack is cached");
//! assert_eq!(child.layers.len(), 3);
//! assert!(cache.get_cached_context_stack("thread-2").is_some());
//! ```

pub mod fork;
pub mod layer;
pub mod stack;

pub use fork::{apply_overrides, LayerOverride};
pub use layer::{ContextLayer, LayerKind};
pub use stack::{CachedContextStack, LAYER_SEPARATOR};
