//! Fork engine - derive a child thread's stack from its parent's
//!
//! The child starts from the parent's layers in order. Overrides naming an
//! existing layer swap its content in place; overrides naming a layer the
//! parent never had are appended in input order. The result is written
//! under the child's id like any other stack.

use crate::cache::store::ContextCache;
use crate::context::layer::{ContextLayer, LayerKind};
use crate::context::stack::CachedContextStack;
use tracing::{debug, info};

/// Replacement or additional content for one layer of a forked stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerOverride {
    pub name: LayerKind,
    pub content: String,
}

impl LayerOverride {
    pub fn new(name: impl Into<LayerKind>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Apply overrides to a parent's layers
///
/// A name repeated in `overrides` ends up with the last content given, at the
/// position its first occurrence took.
pub fn apply_overrides(parent_layers: &[ContextLayer], overrides: &[LayerOverride]) -> Vec<ContextLayer> {
    let mut layers = parent_layers.to_vec();

    for layer_override in overrides {
        match layers.iter_mut().find(|l| l.name == layer_override.name) {
            Some(existing) => existing.replace_content(layer_override.content.clone()),
            None => layers.push(ContextLayer::new(
                layer_override.name.clone(),
                layer_override.content.clone(),
            )),
        }
    }

    layers
}

impl ContextCache {
    /// Fork a parent's cached stack into `child_thread_id`
    ///
    /// Returns `None` when the parent has no cached stack; the parent is never
    /// recomputed here. On success the child stack is already cached.
    pub fn fork_context_stack(
        &self,
        parent_thread_id: &str,
        child_thread_id: &str,
        overrides: &[LayerOverride],
    ) -> Option<CachedContextStack> {
        let Some(parent) = self.get_cached_context_stack(parent_thread_id) else {
            debug!(
                parent_thread_id,
                child_thread_id, "Parent stack not cached, cannot fork"
            );
            return None;
        };

        let layers = apply_overrides(&parent.layers, overrides);
        let child = CachedContextStack::new(child_thread_id, layers);

        self.cache_context_stack(&child)?;

        info!(
            parent_thread_id,
            child_thread_id,
            overrides = overrides.len(),
            layers = child.layers.len(),
            total_tokens = child.total_tokens,
            "Forked context stack"
        );

        Some(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::config::CacheConfig;

    fn parent_cache() -> ContextCache {
        let cache = ContextCache::new(CacheConfig::default());
        cache.cache_context_stack(&CachedContextStack::new(
            "parent",
            vec![
                ContextLayer::new(LayerKind::RepoContext, "A"),
                ContextLayer::new(LayerKind::TicketChain, "B"),
            ],
        ));
        cache
    }

    #[test]
    fn test_fork_missing_parent() {
        let cache = ContextCache::new(CacheConfig::default());
        assert!(cache.fork_context_stack("missing", "child", &[]).is_none());
        assert!(cache.get_cached_context_stack("child").is_none());
    }

    #[test]
    fn test_fork_overrides_and_appends() {
        let cache = parent_cache();
        let parent = cache.get_cached_context_stack("parent").unwrap();

        let child = cache
            .fork_context_stack(
                "parent",
                "child",
                &[
                    LayerOverride::new(LayerKind::TicketChain, "B2"),
                    LayerOverride::new(LayerKind::ExecutionState, "C"),
                ],
            )
            .unwrap();

        let names: Vec<&LayerKind> = child.layers.iter().map(|l| &l.name).collect();
        assert_eq!(
            names,
            vec![
                &LayerKind::RepoContext,
                &LayerKind::TicketChain,
                &LayerKind::ExecutionState
            ]
        );
        assert_eq!(child.layers[0], parent.layers[0]);
        assert_eq!(child.layers[1].content, "B2");
        assert_ne!(child.layers[1].checksum, parent.layers[1].checksum);
        assert_eq!(child.formatted, "A\n\n---\n\nB2\n\n---\n\nC");
        assert_eq!(child.total_tokens, 3);
        assert_eq!(child.checksums.len(), 3);
        assert_eq!(child.thread_id, "child");

        assert_eq!(cache.get_cached_context_stack("child").unwrap(), child);
        // parent untouched
        assert_eq!(cache.get_cached_context_stack("parent").unwrap(), parent);
    }

    #[test]
    fn test_fork_without_overrides_copies_layers() {
        let cache = parent_cache();
        let parent = cache.get_cached_context_stack("parent").unwrap();

        let child = cache.fork_context_stack("parent", "child", &[]).unwrap();
        assert_eq!(child.layers, parent.layers);
        assert_eq!(child.checksums, parent.checksums);
    }

    #[test]
    fn test_appended_layers_keep_input_order() {
        let layers = apply_overrides(
            &[ContextLayer::new(LayerKind::RepoContext, "A")],
            &[
                LayerOverride::new("zeta", "z"),
                LayerOverride::new("alpha", "a"),
                LayerOverride::new("zeta", "z2"),
            ],
        );

        let names: Vec<String> = layers.iter().map(|l| l.name.to_string()).collect();
        assert_eq!(names, vec!["repo-context", "zeta", "alpha"]);
        assert_eq!(layers[1].content, "z2");
    }
}
