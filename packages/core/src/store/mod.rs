//! Snapshot Store
//!
//! - [`SnapshotStore`] - persistence abstraction used by the services layer
//! - [`InMemorySnapshotStore`] - process-local backend with change events
//! - [`StoreError`] - not-found conditions for snapshots and cached diffs
//! - [`StoreEvent`] - broadcast notifications for saves and teardown

mod error;
mod events;
mod snapshot_store;

pub use error::StoreError;
pub use events::StoreEvent;
pub use snapshot_store::{InMemorySnapshotStore, SnapshotStore, STORE_EVENT_CHANNEL_CAPACITY};
