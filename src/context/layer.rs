//! Context layers - named slices of text injected into agent prompts

use crate::cache::checksum::{estimate_tokens, fingerprint, Checksum};
use crate::cache::keys::{
    custom_layer_key, execution_state_key, repo_context_key, thread_lineage_key,
    ticket_chain_key,
};
use crate::cache::ttl::TtlPolicy;
use crate::cache::types::CacheKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Kind of a context layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LayerKind {
    /// Repository documentation (CLAUDE.md)
    RepoContext,
    /// Ticket/issue chain the thread works on
    TicketChain,
    /// Summaries of ancestor threads
    ThreadLineage,
    /// Execution plan and progress
    ExecutionState,
    /// Producer-defined kind
    Custom(String),
}

impl LayerKind {
    pub fn as_str(&self) -> &str {
        match self {
            LayerKind::RepoContext => "repo-context",
            LayerKind::TicketChain => "ticket-chain",
            LayerKind::ThreadLineage => "thread-lineage",
            LayerKind::ExecutionState => "execution-state",
            LayerKind::Custom(name) => name,
        }
    }

    /// Lifetime of a cached layer of this kind
    pub fn ttl(&self, policy: &TtlPolicy) -> Duration {
        match self {
            LayerKind::RepoContext => policy.repo_context,
            LayerKind::TicketChain => policy.ticket_chain,
            LayerKind::ThreadLineage => policy.thread_lineage,
            LayerKind::ExecutionState => policy.execution_state,
            LayerKind::Custom(_) => policy.custom_layer,
        }
    }

    /// Key of the cached layer for a scope (a repo for repo docs, a thread otherwise)
    ///
    /// Custom kinds are namespaced under `layer:`, so a custom name equal to a
    /// built-in prefix cannot overwrite a built-in entry.
    pub fn cache_key(&self, scope: &str) -> CacheKey {
        match self {
            LayerKind::RepoContext => repo_context_key(scope),
            LayerKind::TicketChain => ticket_chain_key(scope),
            LayerKind::ThreadLineage => thread_lineage_key(scope),
            LayerKind::ExecutionState => execution_state_key(scope),
            LayerKind::Custom(name) => custom_layer_key(name, scope),
        }
    }
}

impl From<&str> for LayerKind {
    fn from(name: &str) -> Self {
        match name {
            "repo-context" => LayerKind::RepoContext,
            "ticket-chain" => LayerKind::TicketChain,
            "thread-lineage" => LayerKind::ThreadLineage,
            "execution-state" => LayerKind::ExecutionState,
            other => LayerKind::Custom(other.to_string()),
        }
    }
}

impl From<String> for LayerKind {
    fn from(name: String) -> Self {
        LayerKind::from(name.as_str())
    }
}

impl From<LayerKind> for String {
    fn from(kind: LayerKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One layer of a context stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLayer {
    pub name: LayerKind,
    pub content: String,
    pub checksum: Checksum,
    pub token_estimate: usize,
}

impl ContextLayer {
    /// Build a layer, deriving checksum and token estimate from `content`
    pub fn new(name: impl Into<LayerKind>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            checksum: fingerprint(&content),
            token_estimate: estimate_tokens(&content),
            content,
        }
    }

    /// Swap in new content, re-deriving checksum and token estimate
    pub fn replace_content(&mut self, content: impl Into<String>) {
        let content = content.into();
        self.checksum = fingerprint(&content);
        self.token_estimate = estimate_tokens(&content);
        self.content = content;
    }
}
