//! VibeTree Core
//!
//! This crate provides the versioned tree model, structural diffing, snapshot
//! storage and parameter extraction behind the VibeTree song editor.
//!
//! # Architecture
//!
//! - **Schema-free Tree**: A song is a recursively nested tree of named nodes
//!   with typed `value` and `metadata` payloads
//! - **Positional Diffing**: Trees are flattened to path-keyed maps and compared
//!   path by path
//! - **Immutable Snapshots**: Every edit is captured as a new snapshot; nothing
//!   is ever edited in place
//! - **Syntactic Extraction**: Generation parameters come from a deterministic
//!   keyword traversal, no NLP
//!
//! # Modules
//!
//! - [`models`] - Data structures (TreeNode, Document, Snapshot, TreeDiff)
//! - [`diff`] - Flattening and diff engines
//! - [`extraction`] - Parameter extraction pipeline
//! - [`store`] - Snapshot store abstraction and in-memory backend
//! - [`services`] - Snapshot service orchestrating the edit flow

pub mod diff;
pub mod extraction;
pub mod models;
pub mod services;
pub mod store;

// Re-export commonly used types
pub use models::*;
pub use services::*;
