//! Cache invalidation: removal reasons and the webhook invalidation mapper
//!
//! A webhook classifier calls [`ContextCache::invalidate_for_webhook`] once it
//! has parsed and acted on an event. Invalidation is best-effort
//! housekeeping: unknown events or a missing scope count as zero removals,
//! never as an error.

use crate::cache::keys::{
    context_stack_key, repo_context_key, ticket_key, CONTEXT_STACK_PREFIX, TICKET_CHAIN_PREFIX,
};
use crate::cache::store::ContextCache;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Reason an entry left the cache
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvalidationReason {
    /// Entry expired based on TTL
    Expired,

    /// Manual invalidation by key
    Manual,

    /// Bulk invalidation by key prefix
    PrefixMatch { prefix: String },

    /// Invalidated by a git-host webhook event
    Webhook { event: WebhookEventKind },
}

impl fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidationReason::Expired => write!(f, "TTL expired"),
            InvalidationReason::Manual => write!(f, "manual invalidation"),
            InvalidationReason::PrefixMatch { prefix } => write!(f, "prefix match: {}", prefix),
            InvalidationReason::Webhook { event } => write!(f, "webhook: {}", event),
        }
    }
}

/// Webhook event kinds the mapper knows about
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventKind {
    IssueUpdate,
    IssueClose,
    PrMerge,
    Push,
    /// Anything else; always a no-op
    Unrecognized(String),
}

impl WebhookEventKind {
    /// Parse the classifier's event name (`issue_update`, `push`, ...)
    pub fn parse(kind: &str) -> Self {
        match kind {
            "issue_update" => WebhookEventKind::IssueUpdate,
            "issue_close" => WebhookEventKind::IssueClose,
            "pr_merge" => WebhookEventKind::PrMerge,
            "push" => WebhookEventKind::Push,
            other => WebhookEventKind::Unrecognized(other.to_string()),
        }
    }

    /// Ticket mutations: the ticket key and every assembled stack go stale
    pub fn mutates_ticket(&self) -> bool {
        matches!(
            self,
            WebhookEventKind::IssueUpdate | WebhookEventKind::IssueClose | WebhookEventKind::PrMerge
        )
    }
}

impl fmt::Display for WebhookEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebhookEventKind::IssueUpdate => write!(f, "issue_update"),
            WebhookEventKind::IssueClose => write!(f, "issue_close"),
            WebhookEventKind::PrMerge => write!(f, "pr_merge"),
            WebhookEventKind::Push => write!(f, "push"),
            WebhookEventKind::Unrecognized(kind) => write!(f, "unrecognized:{}", kind),
        }
    }
}

/// The slice of a webhook payload the mapper needs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookDetails {
    /// Issue or pull request number
    #[serde(default)]
    pub number: Option<u64>,

    /// Paths changed by a push
    #[serde(default)]
    pub files: Vec<String>,
}

impl WebhookDetails {
    pub fn ticket(number: u64) -> Self {
        Self {
            number: Some(number),
            ..Default::default()
        }
    }

    pub fn push<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            number: None,
            files: files.into_iter().map(Into::into).collect(),
        }
    }
}

/// True when any changed path's file name is one of `doc_names`
pub fn touches_repo_docs(files: &[String], doc_names: &[String]) -> bool {
    files.iter().any(|path| {
        Path::new(path)
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| doc_names.iter().any(|doc| doc == name))
    })
}

impl ContextCache {
    /// Evict the keys affected by a webhook event, returning how many went away
    ///
    /// - `issue_update`, `issue_close`, `pr_merge`: the `(scope, number)` ticket
    ///   key plus every assembled ticket chain and context stack. There is no
    ///   reverse index from tickets to threads, and both are cheap to rebuild.
    /// - `push`: the scope's repository docs, only if a repo-doc file changed.
    /// - anything else, or an empty scope: nothing.
    pub fn invalidate_for_webhook(
        &self,
        event_kind: &str,
        scope: Option<&str>,
        details: &WebhookDetails,
    ) -> usize {
        let kind = WebhookEventKind::parse(event_kind);

        let Some(scope) = scope.map(str::trim).filter(|s| !s.is_empty()) else {
            debug!(event = %kind, "Webhook without scope, nothing to invalidate");
            return 0;
        };

        let reason = InvalidationReason::Webhook { event: kind.clone() };

        let removed = match &kind {
            k if k.mutates_ticket() => {
                let mut removed = 0;
                if let Some(number) = details.number {
                    if self.invalidate_key_with_reason(&ticket_key(scope, number), reason.clone()) {
                        removed += 1;
                    }
                }
                removed += self.invalidate_by_prefix_with_reason(TICKET_CHAIN_PREFIX, reason.clone());
                removed + self.invalidate_by_prefix_with_reason(CONTEXT_STACK_PREFIX, reason)
            }
            WebhookEventKind::Push => {
                if touches_repo_docs(&details.files, &self.config.repo_doc_files) {
                    usize::from(self.invalidate_key_with_reason(&repo_context_key(scope), reason))
                } else {
                    0
                }
            }
            _ => 0,
        };

        info!(event = %kind, scope, removed, "Webhook invalidation");
        removed
    }

    /// Drop one thread's assembled stack, e.g. after its layers were edited
    pub fn invalidate_thread_stack(&self, thread_id: &str) -> bool {
        self.invalidate_key(&context_stack_key(thread_id))
    }
}
