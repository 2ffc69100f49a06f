//! Service Layer Error Types
//!
//! This module defines error types for snapshot-service operations, chaining
//! the model and store errors they are built on.

use crate::models::ValidationError;
use crate::store::StoreError;
use thiserror::Error;

/// Snapshot service errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotServiceError {
    /// Document rejected before any extraction or diffing ran
    #[error("Document validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Snapshot or cached diff lookup failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Reference that names no snapshot and is not the initial sentinel
    #[error("Invalid snapshot reference: {0:?}")]
    InvalidReference(String),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SnapshotServiceError {
    /// Create an invalid reference error
    pub fn invalid_reference(reference: impl Into<String>) -> Self {
        Self::InvalidReference(reference.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// True for missing snapshots and diffs (the HTTP 404 equivalent)
    pub fn is_not_found(&self) -> bool {
        matches!(self, SnapshotServiceError::Store(err) if err.is_not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_are_not_found() {
        let err: SnapshotServiceError = StoreError::snapshot_not_found("abc").into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Snapshot not found: abc");
    }

    #[test]
    fn test_validation_error_message() {
        let err: SnapshotServiceError = ValidationError::empty_name("root/children[0]").into();
        assert!(!err.is_not_found());
        assert!(err.to_string().starts_with("Document validation failed"));
    }
}
