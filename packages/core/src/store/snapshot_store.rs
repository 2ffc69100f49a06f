//! SnapshotStore Trait and In-Memory Backend
//!
//! The store exclusively owns every [`Snapshot`] after creation and hands out
//! `Arc<Snapshot>` views; nothing can mutate a snapshot once saved.
//!
//! # Design Decisions
//!
//! 1. **Synchronous**: every operation is a map access under a lock, so the
//!    trait has no async methods
//! 2. **Explicit Lifecycle**: the store is an object created with `new()` and
//!    emptied with `clear()`, injected into services as `Arc<dyn SnapshotStore>`
//! 3. **Ordered Diff Keys**: diffs are keyed by `(from_id, to_id)`; the reverse
//!    direction is never derived implicitly
//!
//! # Examples
//!
//! ```rust
//! use vibetree_core::store::{InMemorySnapshotStore, SnapshotStore};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn SnapshotStore> = Arc::new(InMemorySnapshotStore::new());
//! assert!(store.is_empty());
//! assert!(store.get("missing").is_err());
//! ```

use super::error::StoreError;
use super::events::StoreEvent;
use crate::models::{Snapshot, TreeDiff};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

/// Default broadcast capacity for store events
pub const STORE_EVENT_CHANNEL_CAPACITY: usize = 128;

/// Abstraction over snapshot persistence
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` and serialize concurrent calls;
/// multiple edit sessions may create snapshots at the same time.
pub trait SnapshotStore: Send + Sync {
    /// Insert or overwrite a snapshot by id, returning the stored view
    fn save(&self, snapshot: Snapshot) -> Arc<Snapshot>;

    /// Look up a snapshot by id
    fn get(&self, id: &str) -> Result<Arc<Snapshot>, StoreError>;

    /// All snapshots, newest `created_at` first; ties go to the most recently
    /// inserted
    fn list(&self) -> Vec<Arc<Snapshot>>;

    /// Cache a diff under its `(from, to)` pair
    fn save_diff(&self, diff: TreeDiff);

    /// Cached diff for the ordered pair
    fn get_diff(&self, from_id: &str, to_id: &str) -> Result<TreeDiff, StoreError>;

    /// Number of stored snapshots
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all snapshots and cached diffs
    fn clear(&self);
}

#[derive(Debug)]
struct StoredSnapshot {
    snapshot: Arc<Snapshot>,
    /// Insertion sequence used to break `created_at` ties
    seq: u64,
}

#[derive(Debug, Default)]
struct StoreState {
    snapshots: HashMap<String, StoredSnapshot>,
    diffs: HashMap<(String, String), TreeDiff>,
    next_seq: u64,
}

/// Process-local snapshot store guarded by a single `RwLock`
pub struct InMemorySnapshotStore {
    state: RwLock<StoreState>,

    /// Broadcast channel for store events
    event_tx: broadcast::Sender<StoreEvent>,
}

impl Default for InMemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemorySnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySnapshotStore")
            .field("snapshots", &self.len())
            .field("subscribers", &self.event_tx.receiver_count())
            .finish()
    }
}

impl InMemorySnapshotStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::with_event_capacity(STORE_EVENT_CHANNEL_CAPACITY)
    }

    /// Create an empty store with a custom event channel capacity
    pub fn with_event_capacity(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            state: RwLock::new(StoreState::default()),
            event_tx,
        }
    }

    /// Subscribe to store events
    ///
    /// Receivers only observe events emitted after subscribing.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.event_tx.subscribe()
    }

    /// Number of cached diffs
    pub fn diff_count(&self) -> usize {
        self.read().diffs.len()
    }

    /// Ignores errors if no subscribers
    fn emit_event(&self, event: StoreEvent) {
        let _ = self.event_tx.send(event);
    }

    // Every mutation is a single map insert/remove/clear, so a poisoned lock
    // still guards consistent state.
    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn save(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        let replaced = {
            let mut state = self.write();
            let seq = state.next_seq;
            state.next_seq += 1;
            state
                .snapshots
                .insert(
                    snapshot.id.clone(),
                    StoredSnapshot {
                        snapshot: Arc::clone(&snapshot),
                        seq,
                    },
                )
                .is_some()
        };

        if replaced {
            tracing::warn!("Overwrote existing snapshot {}", snapshot.id);
        } else {
            tracing::info!("Saved snapshot {}", snapshot.id);
        }

        self.emit_event(StoreEvent::SnapshotSaved {
            snapshot: Arc::clone(&snapshot),
            replaced,
        });
        snapshot
    }

    fn get(&self, id: &str) -> Result<Arc<Snapshot>, StoreError> {
        self.read()
            .snapshots
            .get(id)
            .map(|stored| Arc::clone(&stored.snapshot))
            .ok_or_else(|| StoreError::snapshot_not_found(id))
    }

    fn list(&self) -> Vec<Arc<Snapshot>> {
        let state = self.read();
        let mut stored: Vec<&StoredSnapshot> = state.snapshots.values().collect();
        stored.sort_by(|a, b| {
            b.snapshot
                .created_at
                .cmp(&a.snapshot.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        stored
            .into_iter()
            .map(|s| Arc::clone(&s.snapshot))
            .collect()
    }

    fn save_diff(&self, diff: TreeDiff) {
        let from_id = diff.from_snapshot_id.clone();
        let to_id = diff.to_snapshot_id.clone();

        self.write()
            .diffs
            .insert((from_id.clone(), to_id.clone()), diff);

        tracing::debug!("Cached diff {} -> {}", from_id, to_id);
        self.emit_event(StoreEvent::DiffSaved { from_id, to_id });
    }

    fn get_diff(&self, from_id: &str, to_id: &str) -> Result<TreeDiff, StoreError> {
        self.read()
            .diffs
            .get(&(from_id.to_string(), to_id.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::diff_not_found(from_id, to_id))
    }

    fn len(&self) -> usize {
        self.read().snapshots.len()
    }

    fn clear(&self) {
        {
            let mut state = self.write();
            state.snapshots.clear();
            state.diffs.clear();
        }
        tracing::info!("Cleared snapshot store");
        self.emit_event(StoreEvent::Cleared);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, TreeNode};
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::Map;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_735_898_400 + seconds, 0).unwrap()
    }

    fn snapshot(id: &str, created_at: DateTime<Utc>) -> Snapshot {
        Snapshot {
            id: id.to_string(),
            created_at,
            tree: Document::new(TreeNode::new("Song").unwrap()),
            derived_prompt: "music composition".to_string(),
            derived_lyrics: "[Instrumental]".to_string(),
            derived_parameters: Map::new(),
            derived_metadata: Map::new(),
            audio_reference: None,
            reference_audio_path: None,
            generation_info: None,
        }
    }

    fn diff(from: &str, to: &str) -> TreeDiff {
        TreeDiff {
            from_snapshot_id: from.to_string(),
            to_snapshot_id: to.to_string(),
            summary: "No changes".to_string(),
            node_diffs: Vec::new(),
        }
    }

    fn ids(snapshots: &[Arc<Snapshot>]) -> Vec<&str> {
        snapshots.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_save_and_get() {
        let store = InMemorySnapshotStore::new();
        let saved = store.save(snapshot("a", at(0)));

        let fetched = store.get("a").unwrap();
        assert!(Arc::ptr_eq(&saved, &fetched));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let store = InMemorySnapshotStore::new();
        let err = store.get("nope").unwrap_err();
        assert_eq!(err, StoreError::snapshot_not_found("nope"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_list_newest_first() {
        let store = InMemorySnapshotStore::new();
        store.save(snapshot("old", at(0)));
        store.save(snapshot("new", at(60)));
        store.save(snapshot("mid", at(30)));

        assert_eq!(ids(&store.list()), vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_list_ties_last_inserted_first() {
        let store = InMemorySnapshotStore::new();
        store.save(snapshot("first", at(0)));
        store.save(snapshot("second", at(0)));
        store.save(snapshot("third", at(0)));

        assert_eq!(ids(&store.list()), vec!["third", "second", "first"]);
    }

    #[test]
    fn test_overwrite_replaces_and_reorders() {
        let store = InMemorySnapshotStore::new();
        store.save(snapshot("a", at(0)));
        store.save(snapshot("b", at(0)));

        let mut replacement = snapshot("a", at(0));
        replacement.derived_prompt = "replaced".to_string();
        store.save(replacement);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a").unwrap().derived_prompt, "replaced");
        assert_eq!(ids(&store.list()), vec!["a", "b"]);
    }

    #[test]
    fn test_diffs_keyed_by_ordered_pair() {
        let store = InMemorySnapshotStore::new();
        store.save_diff(diff("a", "b"));

        assert!(store.get_diff("a", "b").is_ok());
        assert_eq!(
            store.get_diff("b", "a").unwrap_err(),
            StoreError::diff_not_found("b", "a")
        );
        assert_eq!(store.diff_count(), 1);
    }

    #[test]
    fn test_clear() {
        let store = InMemorySnapshotStore::new();
        store.save(snapshot("a", at(0)));
        store.save_diff(diff("initial", "a"));

        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.diff_count(), 0);
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_events_without_subscribers_do_not_fail() {
        let store = InMemorySnapshotStore::with_event_capacity(1);
        for i in 0..4 {
            store.save(snapshot(&format!("s{}", i), at(i)));
        }
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_concurrent_saves() {
        let store = Arc::new(InMemorySnapshotStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store.save(snapshot(&format!("{}-{}", t, i), at(i)));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 200);
        assert_eq!(store.list().len(), 200);
    }
}
