//! Business Services
//!
//! This module contains the orchestration layer of the edit flow:
//!
//! - `SnapshotService` - extraction, snapshot capture and diffing over a
//!   shared `SnapshotStore`
//!
//! Services coordinate between the store and the pure algorithms in
//! [`crate::diff`] and [`crate::extraction`].

pub mod error;
pub mod snapshot_service;

pub use error::SnapshotServiceError;
pub use snapshot_service::{
    AssembledPrompt, CreateSnapshotRequest, EditOutcome, SnapshotService, SnapshotServiceConfig,
    PENDING_SNAPSHOT_ID,
};
