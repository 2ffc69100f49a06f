//! Snapshot Store Error Types

use thiserror::Error;

/// Lookup failures reported by a [`SnapshotStore`](super::SnapshotStore)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No snapshot is stored under the id
    #[error("Snapshot not found: {id}")]
    SnapshotNotFound { id: String },

    /// No diff is cached for the ordered pair
    #[error("Diff not found: {from_id} -> {to_id}")]
    DiffNotFound { from_id: String, to_id: String },
}

impl StoreError {
    /// Create a snapshot not found error
    pub fn snapshot_not_found(id: impl Into<String>) -> Self {
        Self::SnapshotNotFound { id: id.into() }
    }

    /// Create a diff not found error
    pub fn diff_not_found(from_id: impl Into<String>, to_id: impl Into<String>) -> Self {
        Self::DiffNotFound {
            from_id: from_id.into(),
            to_id: to_id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::SnapshotNotFound { .. } | StoreError::DiffNotFound { .. }
        )
    }
}
