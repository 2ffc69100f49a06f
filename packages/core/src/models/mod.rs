//! Data Models
//!
//! This module contains the core data structures used throughout VibeTree:
//!
//! - `TreeNode` / `Document` - Schema-free, recursively nested song description
//! - `Snapshot` - Frozen capture of a document and its derived generation state
//! - `NodeDiff` / `TreeDiff` - Structural change records between two documents
//!
//! Documents are validated once at construction (`Document::from_json`,
//! `Document::from_value`) and treated as immutable afterwards.

mod snapshot;
mod tree;

pub use snapshot::{
    ChangeType, NodeDiff, Snapshot, SnapshotDescriptor, SnapshotRef, TreeDiff,
    INITIAL_SNAPSHOT_ID,
};
pub use tree::{Document, NodeValue, Scalar, TreeNode, ValidationError, MAX_TREE_DEPTH};
