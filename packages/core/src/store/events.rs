//! Snapshot Store Events
//!
//! Change notifications published by [`InMemorySnapshotStore`](super::InMemorySnapshotStore)
//! on a tokio broadcast channel. Subscribers (a UI bridge, an audit log) learn
//! about new snapshots and cached diffs without coupling to the store.
//!
//! Events are emitted after the store's lock is released, in the order the
//! mutations were applied by the emitting thread.

use crate::models::Snapshot;
use std::sync::Arc;

/// Store-level change notifications
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// A snapshot was saved; `replaced` is true when it overwrote an existing id
    SnapshotSaved {
        snapshot: Arc<Snapshot>,
        replaced: bool,
    },

    /// A diff was cached for the ordered pair
    DiffSaved { from_id: String, to_id: String },

    /// All snapshots and diffs were removed
    Cleared,
}

impl StoreEvent {
    /// Get a string representation of the event type
    pub fn event_type(&self) -> &str {
        match self {
            StoreEvent::SnapshotSaved { .. } => "snapshot:saved",
            StoreEvent::DiffSaved { .. } => "diff:saved",
            StoreEvent::Cleared => "store:cleared",
        }
    }
}
