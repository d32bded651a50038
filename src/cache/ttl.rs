//! Freshness policy per layer kind
//!
//! Every caller shares these constants instead of inlining durations.
//! Volatile sources get short lifetimes, slow-moving summaries long ones.
//! The assembled stack is the shortest-lived entry since rebuilding it from
//! cached layers is cheap. Session ledger records outlive everything else
//! because one session spans many agent turns.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Repository documentation (CLAUDE.md and friends)
pub const REPO_CONTEXT_TTL: Duration = Duration::from_secs(30 * 60);

/// Ticket/issue chain text
pub const TICKET_CHAIN_TTL: Duration = Duration::from_secs(5 * 60);

/// Parent-thread lineage summaries
pub const THREAD_LINEAGE_TTL: Duration = Duration::from_secs(60 * 60);

/// Execution plan / progress state
pub const EXECUTION_STATE_TTL: Duration = Duration::from_secs(3 * 60);

/// Fully assembled context stack for a thread
pub const CONTEXT_STACK_TTL: Duration = Duration::from_secs(2 * 60);

/// Session injection ledger records
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Fallback for layer kinds introduced by producers outside the built-in set
pub const DEFAULT_LAYER_TTL: Duration = Duration::from_secs(10 * 60);

/// Overridable copy of the TTL constants, carried by `CacheConfig`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtlPolicy {
    pub repo_context: Duration,
    pub ticket_chain: Duration,
    pub thread_lineage: Duration,
    pub execution_state: Duration,
    pub context_stack: Duration,
    pub session: Duration,
    pub custom_layer: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            repo_context: REPO_CONTEXT_TTL,
            ticket_chain: TICKET_CHAIN_TTL,
            thread_lineage: THREAD_LINEAGE_TTL,
            execution_state: EXECUTION_STATE_TTL,
            context_stack: CONTEXT_STACK_TTL,
            session: SESSION_TTL,
            custom_layer: DEFAULT_LAYER_TTL,
        }
    }
}

impl TtlPolicy {
    /// Every duration must be non-zero
    pub fn validate(&self) -> Result<(), String> {
        let named = [
            ("repo_context", self.repo_context),
            ("ticket_chain", self.ticket_chain),
            ("thread_lineage", self.thread_lineage),
            ("execution_state", self.execution_state),
            ("context_stack", self.context_stack),
            ("session", self.session),
            ("custom_layer", self.custom_layer),
        ];

        for (name, ttl) in named {
            if ttl.is_zero() {
                return Err(format!("ttl_policy.{} must be greater than 0", name));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_ttl_is_shortest() {
        let policy = TtlPolicy::default();
        for ttl in [
            policy.repo_context,
            policy.ticket_chain,
            policy.thread_lineage,
            policy.execution_state,
            policy.custom_layer,
        ] {
            assert!(policy.context_stack < ttl);
        }
    }

    #[test]
    fn test_session_ttl_is_longest() {
        let policy = TtlPolicy::default();
        assert!(policy.session > policy.thread_lineage);
        assert!(TICKET_CHAIN_TTL < THREAD_LINEAGE_TTL);
    }

    #[test]
    fn test_validate_rejects_zero() {
        let mut policy = TtlPolicy::default();
        assert!(policy.validate().is_ok());

        policy.ticket_chain = Duration::ZERO;
        let err = policy.validate().unwrap_err();
        assert!(err.contains("ticket_chain"));
    }
}
