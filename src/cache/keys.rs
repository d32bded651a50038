//! Key-space convention shared by producers and the invalidation mapper
//!
//! Every key kind lives under its own textual prefix so that prefix
//! invalidation can address it:
//!
//! | kind | key |
//! |---|---|
//! | repository docs | `repo-context:{scope}` |
//! | ticket | `ticket:{scope}#{number}` |
//! | assembled ticket chain | `ticket-chain:{scope}` |
//! | thread lineage | `thread-lineage:{thread_id}` |
//! | execution state | `execution-state:{thread_id}` |
//! | assembled stack | `context-stack:{thread_id}` |
//! | custom layer | `layer:{name}:{scope}` |
//!
//! Custom layer kinds live under `layer:` so that no producer-chosen name can
//! land on a built-in key.

use crate::cache::types::CacheKey;

pub const REPO_CONTEXT_PREFIX: &str = "repo-context:";
pub const TICKET_PREFIX: &str = "ticket:";
pub const TICKET_CHAIN_PREFIX: &str = "ticket-chain:";
pub const THREAD_LINEAGE_PREFIX: &str = "thread-lineage:";
pub const EXECUTION_STATE_PREFIX: &str = "execution-state:";
pub const CONTEXT_STACK_PREFIX: &str = "context-stack:";
pub const CUSTOM_LAYER_PREFIX: &str = "layer:";

/// Repository documentation for a repo scope (e.g. `owner/repo`)
pub fn repo_context_key(scope: &str) -> CacheKey {
    format!("{}{}", REPO_CONTEXT_PREFIX, scope)
}

/// One ticket/issue of a repo scope
pub fn ticket_key(scope: &str, number: u64) -> CacheKey {
    format!("{}{}#{}", TICKET_PREFIX, scope, number)
}

/// Ticket chain assembled for a scope; dropped on every ticket mutation
pub fn ticket_chain_key(scope: &str) -> CacheKey {
    format!("{}{}", TICKET_CHAIN_PREFIX, scope)
}

pub fn thread_lineage_key(thread_id: &str) -> CacheKey {
    format!("{}{}", THREAD_LINEAGE_PREFIX, thread_id)
}

pub fn execution_state_key(thread_id: &str) -> CacheKey {
    format!("{}{}", EXECUTION_STATE_PREFIX, thread_id)
}

/// Assembled context stack of a thread
pub fn context_stack_key(thread_id: &str) -> CacheKey {
    format!("{}{}", CONTEXT_STACK_PREFIX, thread_id)
}

/// Producer-defined layer `name` for a scope
pub fn custom_layer_key(name: &str, scope: &str) -> CacheKey {
    CacheKeyBuilder::new(format!("{}{}", CUSTOM_LAYER_PREFIX, name))
        .identifier(scope)
        .build()
}

/// Builder for keys of custom layer kinds: `{kind}:{identifier}[?k=v&...]`
pub struct CacheKeyBuilder {
    kind: String,
    identifier: String,
    params: Vec<(String, String)>,
}

impl CacheKeyBuilder {
    /// Create a new cache key builder for a layer kind name
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            identifier: String::new(),
            params: Vec::new(),
        }
    }

    /// Set the primary identifier
    pub fn identifier(mut self, id: impl Into<String>) -> Self {
        self.identifier = id.into();
        self
    }

    /// Add a parameter to the key
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Prefix shared by every key of this kind
    pub fn prefix(&self) -> String {
        format!("{}:", self.kind)
    }

    /// Build the cache key
    pub fn build(self) -> CacheKey {
        let mut key = format!("{}:{}", self.kind, self.identifier);

        if !self.params.is_empty() {
            let params_str: Vec<String> = self
                .params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            key.push('?');
            key.push_str(&params_str.join("&"));
        }

        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_keys() {
        assert_eq!(repo_context_key("acme/api"), "repo-context:acme/api");
        assert_eq!(ticket_key("acme/api", 42), "ticket:acme/api#42");
        assert_eq!(context_stack_key("th-1"), "context-stack:th-1");
        assert_eq!(thread_lineage_key("th-1"), "thread-lineage:th-1");
        assert_eq!(execution_state_key("th-1"), "execution-state:th-1");
        assert_eq!(ticket_chain_key("th-1"), "ticket-chain:th-1");
    }

    #[test]
    fn test_custom_layer_keys_stay_in_their_namespace() {
        assert_eq!(custom_layer_key("review-notes", "th-1"), "layer:review-notes:th-1");

        for name in ["context-stack", "ticket", "repo-context"] {
            let key = custom_layer_key(name, "th-1");
            assert!(key.starts_with(CUSTOM_LAYER_PREFIX));
            assert_ne!(key, context_stack_key("th-1"));
        }
    }

    #[test]
    fn test_prefixes_are_distinct() {
        let prefixes = [
            REPO_CONTEXT_PREFIX,
            TICKET_PREFIX,
            TICKET_CHAIN_PREFIX,
            THREAD_LINEAGE_PREFIX,
            EXECUTION_STATE_PREFIX,
            CONTEXT_STACK_PREFIX,
            CUSTOM_LAYER_PREFIX,
        ];
        for (i, a) in prefixes.iter().enumerate() {
            for b in prefixes.iter().skip(i + 1) {
                assert!(!a.starts_with(b) && !b.starts_with(a));
            }
        }
    }

    #[test]
    fn test_cache_key_builder() {
        let key = CacheKeyBuilder::new("review-notes").identifier("th-9").build();
        assert_eq!(key, "review-notes:th-9");

        let builder = CacheKeyBuilder::new("review-notes")
            .identifier("th-9")
            .param("pr", "17")
            .param("rev", "3");
        assert_eq!(builder.prefix(), "review-notes:");
        let key = builder.build();
        assert_eq!(key, "review-notes:th-9?pr=17&rev=3");
    }
}
