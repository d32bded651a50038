//! Cached context stacks
//!
//! A stack is the ordered set of layers injected for one thread plus its
//! derived totals. Stacks are stored JSON-serialized in the TTL store under
//! `context-stack:{thread_id}`, so webhook prefix invalidation reaches them
//! like any other entry. Assembling layer content is the producers' job;
//! this module only persists and serves finished stacks.

use crate::cache::keys::context_stack_key;
use crate::cache::ledger::LayerChecksums;
use crate::cache::store::ContextCache;
use crate::cache::types::CachedValue;
use crate::context::layer::{ContextLayer, LayerKind};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Visible separator between layers in the formatted text
pub const LAYER_SEPARATOR: &str = "\n\n---\n\n";

/// Fully assembled context for one thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedContextStack {
    pub thread_id: String,
    pub layers: Vec<ContextLayer>,
    pub total_tokens: usize,
    pub formatted: String,
    pub checksums: LayerChecksums,
    pub cached_at: DateTime<Utc>,
}

impl CachedContextStack {
    /// Build a stack from ordered layers, deriving totals, text and checksums
    pub fn new(thread_id: impl Into<String>, layers: Vec<ContextLayer>) -> Self {
        let total_tokens = layers.iter().map(|l| l.token_estimate).sum();
        let formatted = layers
            .iter()
            .map(|l| l.content.as_str())
            .collect::<Vec<_>>()
            .join(LAYER_SEPARATOR);
        let checksums = layers
            .iter()
            .map(|l| (l.name.to_string(), l.checksum.clone()))
            .collect();

        Self {
            thread_id: thread_id.into(),
            layers,
            total_tokens,
            formatted,
            checksums,
            cached_at: Utc::now(),
        }
    }

    /// Layer by kind
    pub fn layer(&self, kind: &LayerKind) -> Option<&ContextLayer> {
        self.layers.iter().find(|l| &l.name == kind)
    }

    /// Serialize to cache value
    pub fn to_cache_value(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from cache value
    pub fn from_cache_value(value: &str) -> Result<Self> {
        Ok(serde_json::from_str(value)?)
    }
}

impl ContextCache {
    /// Store a thread's stack, replacing any previous one
    ///
    /// Returns the checksum of the stored payload, or `None` if the stack
    /// could not be serialized (nothing is stored then).
    pub fn cache_context_stack(&self, stack: &CachedContextStack) -> Option<String> {
        let value = match stack.to_cache_value() {
            Ok(value) => value,
            Err(e) => {
                warn!(thread_id = %stack.thread_id, "Failed to serialize context stack: {}", e);
                return None;
            }
        };

        debug!(
            thread_id = %stack.thread_id,
            layers = stack.layers.len(),
            total_tokens = stack.total_tokens,
            "Caching context stack"
        );

        Some(self.set(
            context_stack_key(&stack.thread_id),
            value,
            self.config.ttl_policy.context_stack,
        ))
    }

    /// Cached stack of a thread, if present and fresh
    pub fn get_cached_context_stack(&self, thread_id: &str) -> Option<CachedContextStack> {
        let key = context_stack_key(thread_id);
        let value = self.get(&key)?;

        match CachedContextStack::from_cache_value(&value) {
            Ok(stack) => Some(stack),
            Err(e) => {
                warn!(thread_id, "Discarding unreadable context stack: {}", e);
                self.invalidate_key(&key);
                None
            }
        }
    }

    /// Cache one layer under the key-space convention with its kind's TTL
    pub fn cache_layer(&self, scope: &str, layer: &ContextLayer) -> String {
        self.set(
            layer.name.cache_key(scope),
            layer.content.clone(),
            layer.name.ttl(&self.config.ttl_policy),
        )
    }

    /// Cached layer content of a kind for a scope
    pub fn get_cached_layer(&self, scope: &str, kind: &LayerKind) -> Option<ContextLayer> {
        let CachedValue { value, .. } = self.get_with_checksum(&kind.cache_key(scope))?;
        Some(ContextLayer::new(kind.clone(), value))
    }
}
