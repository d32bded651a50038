//! Session injection ledger
//!
//! Remembers, per agent session, the checksum of every layer that was last
//! injected into a prompt. The orchestrator compares the current checksums
//! against that record before each turn and re-sends only what changed.

use crate::cache::checksum::Checksum;
use crate::cache::entry::expiry_from;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;

/// Layer name -> checksum, ordered by name
pub type LayerChecksums = BTreeMap<String, Checksum>;

/// What was last injected for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInjectionRecord {
    pub session_id: String,
    pub thread_id: String,
    pub checksums: LayerChecksums,
    pub injected_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionInjectionRecord {
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Outcome of comparing current layer checksums with the last injection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDetection {
    pub has_changes: bool,
    /// Changed, added and removed layer names, sorted
    pub changed_layers: Vec<String>,
    /// Checksums of the previous injection, `None` on a session's first turn
    pub previous_checksums: Option<LayerChecksums>,
}

/// Per-session record of injected layer checksums
pub struct SessionLedger {
    records: RwLock<HashMap<String, SessionInjectionRecord>>,
    ttl: Duration,
}

impl SessionLedger {
    /// Create an empty ledger whose records live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Store the injection state for a session, replacing any previous record
    pub fn record_injection(
        &self,
        session_id: &str,
        thread_id: &str,
        checksums: LayerChecksums,
    ) -> SessionInjectionRecord {
        let now = Utc::now();
        let record = SessionInjectionRecord {
            session_id: session_id.to_string(),
            thread_id: thread_id.to_string(),
            checksums,
            injected_at: now,
            expires_at: expiry_from(now, self.ttl),
        };

        debug!(
            session_id,
            thread_id,
            layers = record.checksums.len(),
            "Recorded injection"
        );

        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.insert(session_id.to_string(), record.clone());
        record
    }

    /// Last injection of a session, if it has not expired
    pub fn get_last_injection(&self, session_id: &str) -> Option<SessionInjectionRecord> {
        let now = Utc::now();
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());

        match records.get(session_id) {
            Some(record) if record.is_expired_at(now) => {
                debug!(session_id, "Session record expired");
                records.remove(session_id);
                None
            }
            Some(record) => Some(record.clone()),
            None => None,
        }
    }

    /// Forget a session; true iff a record existed
    pub fn remove_session(&self, session_id: &str) -> bool {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.remove(session_id).is_some()
    }

    /// Compare `current` checksums with the session's last injection
    ///
    /// A layer counts as changed when its checksum differs, when it is new
    /// in `current`, or when it disappeared since the last injection.
    pub fn detect_changes(&self, session_id: &str, current: &LayerChecksums) -> ChangeDetection {
        let Some(previous) = self.get_last_injection(session_id) else {
            let changed_layers: Vec<String> = current.keys().cloned().collect();
            return ChangeDetection {
                has_changes: !changed_layers.is_empty(),
                changed_layers,
                previous_checksums: None,
            };
        };

        let previous = previous.checksums;
        let mut changed: BTreeSet<&String> = BTreeSet::new();

        for (name, checksum) in current {
            if previous.get(name) != Some(checksum) {
                changed.insert(name);
            }
        }
        for name in previous.keys() {
            if !current.contains_key(name) {
                changed.insert(name);
            }
        }

        let changed_layers: Vec<String> = changed.into_iter().cloned().collect();
        debug!(session_id, changed = ?changed_layers, "Detected layer changes");

        ChangeDetection {
            has_changes: !changed_layers.is_empty(),
            changed_layers,
            previous_checksums: Some(previous),
        }
    }

    /// Number of unexpired records
    pub fn active_sessions(&self) -> usize {
        let now = Utc::now();
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        records.values().filter(|r| !r.is_expired_at(now)).count()
    }

    /// Drop every expired record, returning how many were removed
    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let before = records.len();
        records.retain(|_, record| !record.is_expired_at(now));
        before - records.len()
    }

    /// Drop every record
    pub fn clear(&self) -> usize {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let count = records.len();
        records.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ttl::SESSION_TTL;

    fn checksums(pairs: &[(&str, &str)]) -> LayerChecksums {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_record_overwrites_not_merges() {
        let ledger = SessionLedger::new(SESSION_TTL);
        ledger.record_injection("s1", "t1", checksums(&[("a", "1"), ("b", "2")]));
        ledger.record_injection("s1", "t2", checksums(&[("c", "3")]));

        let record = ledger.get_last_injection("s1").unwrap();
        assert_eq!(record.thread_id, "t2");
        assert_eq!(record.checksums, checksums(&[("c", "3")]));
        assert_eq!(ledger.active_sessions(), 1);
    }

    #[test]
    fn test_remove_session() {
        let ledger = SessionLedger::new(SESSION_TTL);
        ledger.record_injection("s1", "t1", checksums(&[("a", "1")]));

        assert!(ledger.remove_session("s1"));
        assert!(!ledger.remove_session("s1"));
        assert!(ledger.get_last_injection("s1").is_none());
    }

    #[test]
    fn test_first_turn_everything_is_new() {
        let ledger = SessionLedger::new(SESSION_TTL);
        let result = ledger.detect_changes("s1", &checksums(&[("b", "2"), ("a", "1")]));

        assert!(result.has_changes);
        assert_eq!(result.changed_layers, vec!["a", "b"]);
        assert!(result.previous_checksums.is_none());
    }

    #[test]
    fn test_first_turn_nothing_to_inject() {
        let ledger = SessionLedger::new(SESSION_TTL);
        let result = ledger.detect_changes("s1", &LayerChecksums::new());

        assert!(!result.has_changes);
        assert!(result.changed_layers.is_empty());
        assert!(result.previous_checksums.is_none());
    }

    #[test]
    fn test_content_and_schema_drift() {
        let ledger = SessionLedger::new(SESSION_TTL);
        ledger.record_injection("s1", "t1", checksums(&[("a", "1"), ("b", "2")]));

        let modified = ledger.detect_changes("s1", &checksums(&[("a", "1"), ("b", "3")]));
        assert_eq!(modified.changed_layers, vec!["b"]);
        assert_eq!(
            modified.previous_checksums,
            Some(checksums(&[("a", "1"), ("b", "2")]))
        );

        let removed = ledger.detect_changes("s1", &checksums(&[("a", "1")]));
        assert_eq!(removed.changed_layers, vec!["b"]);

        let added = ledger.detect_changes("s1", &checksums(&[("a", "1"), ("b", "2"), ("c", "x")]));
        assert_eq!(added.changed_layers, vec!["c"]);

        let same = ledger.detect_changes("s1", &checksums(&[("a", "1"), ("b", "2")]));
        assert!(!same.has_changes);
        assert!(same.changed_layers.is_empty());
    }

    #[test]
    fn test_prior_record_then_empty_current() {
        let ledger = SessionLedger::new(SESSION_TTL);
        ledger.record_injection("s1", "t1", checksums(&[("a", "1")]));

        let result = ledger.detect_changes("s1", &LayerChecksums::new());
        assert!(result.has_changes);
        assert_eq!(result.changed_layers, vec!["a"]);
    }

    #[test]
    fn test_expired_records_are_absent_and_swept() {
        let ledger = SessionLedger::new(Duration::from_millis(1));
        ledger.record_injection("s1", "t1", checksums(&[("a", "1")]));
        ledger.record_injection("s2", "t1", checksums(&[("a", "1")]));
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(ledger.active_sessions(), 0);
        assert!(ledger.get_last_injection("s1").is_none());
        assert_eq!(ledger.sweep_expired(), 1);

        let result = ledger.detect_changes("s2", &checksums(&[("a", "1")]));
        assert!(result.previous_checksums.is_none());
    }

    #[test]
    fn test_clear() {
        let ledger = SessionLedger::new(SESSION_TTL);
        ledger.record_injection("s1", "t1", checksums(&[("a", "1")]));
        ledger.record_injection("s2", "t2", checksums(&[("a", "1")]));

        assert_eq!(ledger.clear(), 2);
        assert_eq!(ledger.active_sessions(), 0);
    }
}
