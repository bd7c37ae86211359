//! Content-change detection between successive polls of a dataset.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Key used when a caller passes an empty dataset name.
pub const DEFAULT_DATASET: &str = "routine";

/// Last-seen state of one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutineSnapshot {
    pub signature: String,
    /// When the dataset was last checked.
    pub updated_at: DateTime<Utc>,
    /// When the signature last differed from its predecessor (first sighting counts).
    pub changed_at: DateTime<Utc>,
    pub count: usize,
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
    pub changed: bool,
    pub previous_count: usize,
    pub current_count: usize,
    pub updated_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_optional_time")]
    pub previous_updated_at: Option<DateTime<Utc>>,
}

fn serialize_optional_time<S: serde::Serializer>(
    t: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match t {
        Some(t) => serializer.serialize_str(&t.to_rfc3339()),
        None => serializer.serialize_str(""),
    }
}

/// Storage for snapshots, keyed by normalized dataset name.
///
/// `replace` must be atomic: two concurrent evaluations of the same key each
/// observe a distinct predecessor.
pub trait SnapshotStore: Send + Sync {
    fn get(&self, key: &str) -> Option<RoutineSnapshot>;

    /// Store `snapshot` under `key`, returning what was there before.
    fn replace(&self, key: &str, snapshot: RoutineSnapshot) -> Option<RoutineSnapshot>;
}

/// Process-local store. Lost on restart.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    inner: Mutex<HashMap<String, RoutineSnapshot>>,
}

impl SnapshotStore for InMemorySnapshotStore {
    fn get(&self, key: &str) -> Option<RoutineSnapshot> {
        match self.inner.lock() {
            Ok(map) => map.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        }
    }

    fn replace(&self, key: &str, snapshot: RoutineSnapshot) -> Option<RoutineSnapshot> {
        let mut map = match self.inner.lock() {
            Ok(map) => map,
            Err(poisoned) => {
                warn!("snapshot store: lock poisoned, recovering");
                poisoned.into_inner()
            }
        };
        map.insert(key.to_string(), snapshot)
    }
}

/// Tracks a content signature per dataset and reports changes.
#[derive(Clone)]
pub struct ChangeDetector {
    store: Arc<dyn SnapshotStore>,
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new(Arc::new(InMemorySnapshotStore::default()))
    }
}

impl ChangeDetector {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    /// Evaluate `items` against the previous snapshot of `name`, stamped now.
    pub fn detect<T: Serialize>(&self, name: &str, items: &[T]) -> ChangeReport {
        self.detect_at(name, items, Utc::now())
    }

    /// Same as [`detect`](Self::detect) with an explicit clock.
    pub fn detect_at<T: Serialize>(
        &self,
        name: &str,
        items: &[T],
        now: DateTime<Utc>,
    ) -> ChangeReport {
        let key = dataset_key(name);
        let signature = signature_of(items);
        let count = items.len();

        // changed_at needs the predecessor, but the write must stay a single
        // atomic replace. A racing writer in between only skews changed_at.
        let changed_at = match self.store.get(&key) {
            Some(prev) if prev.signature == signature => prev.changed_at,
            _ => now,
        };

        let previous = self.store.replace(
            &key,
            RoutineSnapshot {
                signature: signature.clone(),
                updated_at: now,
                changed_at,
                count,
            },
        );

        let changed = previous
            .as_ref()
            .is_some_and(|prev| prev.signature != signature);
        debug!("change: {key} count={count} changed={changed}");

        ChangeReport {
            changed,
            previous_count: previous.as_ref().map_or(0, |p| p.count),
            current_count: count,
            updated_at: now,
            previous_updated_at: previous.map(|p| p.updated_at),
        }
    }

    /// Current snapshot for `name`, if it has been evaluated.
    pub fn snapshot(&self, name: &str) -> Option<RoutineSnapshot> {
        self.store.get(&dataset_key(name))
    }
}

fn dataset_key(name: &str) -> String {
    let key = name.trim().to_lowercase();
    if key.is_empty() {
        DEFAULT_DATASET.to_string()
    } else {
        key
    }
}

/// Hex SHA-256 of the JSON serialization. Order-sensitive.
fn signature_of<T: Serialize>(items: &[T]) -> String {
    let json = match serde_json::to_string(items) {
        Ok(json) => json,
        Err(e) => {
            warn!("change: failed to serialize items: {e}");
            String::new()
        }
    };
    hex::encode(Sha256::digest(json.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 20, h, 0, 0).unwrap()
    }

    fn grid(cells: &[&str]) -> Vec<Vec<String>> {
        vec![cells.iter().map(|c| c.to_string()).collect()]
    }

    #[test]
    fn test_first_call_is_not_a_change() {
        let d = ChangeDetector::default();
        let r = d.detect_at("routine", &grid(&["a"]), at(8));
        assert!(!r.changed);
        assert_eq!(r.previous_count, 0);
        assert_eq!(r.current_count, 1);
        assert_eq!(r.previous_updated_at, None);
        assert_eq!(r.updated_at, at(8));
    }

    #[test]
    fn test_change_reported_exactly_once() {
        let d = ChangeDetector::default();
        let a = grid(&["a"]);
        let b = grid(&["b"]);

        assert!(!d.detect_at("routine", &a, at(8)).changed);
        assert!(!d.detect_at("routine", &a, at(9)).changed);

        let r = d.detect_at("routine", &b, at(10));
        assert!(r.changed);
        assert_eq!(r.previous_updated_at, Some(at(9)));

        assert!(!d.detect_at("routine", &b, at(11)).changed);
    }

    #[test]
    fn test_updated_at_advances_changed_at_does_not() {
        let d = ChangeDetector::default();
        let a = grid(&["a"]);
        d.detect_at("routine", &a, at(8));
        d.detect_at("routine", &a, at(9));

        let snap = d.snapshot("routine").unwrap();
        assert_eq!(snap.updated_at, at(9));
        assert_eq!(snap.changed_at, at(8));

        d.detect_at("routine", &grid(&["z"]), at(10));
        assert_eq!(d.snapshot("routine").unwrap().changed_at, at(10));
    }

    #[test]
    fn test_signature_is_order_sensitive() {
        let d = ChangeDetector::default();
        d.detect_at("x", &["a", "b"], at(8));
        let r = d.detect_at("x", &["b", "a"], at(9));
        assert!(r.changed);
        assert_eq!(r.previous_count, 2);
        assert_eq!(r.current_count, 2);
    }

    #[test]
    fn test_keys_are_case_insensitive_and_default() {
        let d = ChangeDetector::default();
        d.detect_at("", &["a"], at(8));
        let r = d.detect_at("ROUTINE", &["b"], at(9));
        assert!(r.changed, "empty name and ROUTINE share the default key");

        let r = d.detect_at("other", &["b"], at(9));
        assert!(!r.changed, "distinct datasets are tracked separately");
    }

    #[test]
    fn test_report_serializes_missing_previous_as_empty() {
        let d = ChangeDetector::default();
        let r = d.detect_at("routine", &["a"], at(8));
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["previous_updated_at"], "");
        assert_eq!(json["changed"], false);
    }

    #[test]
    fn test_concurrent_replace_observes_distinct_predecessors() {
        let store = Arc::new(InMemorySnapshotStore::default());
        let d = ChangeDetector::new(store.clone());
        d.detect_at("routine", &["seed"], at(7));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let d = d.clone();
                std::thread::spawn(move || d.detect_at("routine", &[format!("v{i}")], at(8)))
            })
            .collect();
        let changed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.changed)
            .count();
        assert_eq!(changed, 8, "every distinct write sees a different predecessor");
    }
}
