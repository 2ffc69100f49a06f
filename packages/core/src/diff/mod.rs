//! Flattening and Diff Engines
//!
//! - [`flatten`] - path-addressed, pre-order flattening of a tree
//! - [`engine`] - added/modified/deleted detection and change summaries
//!
//! Both are pure functions over borrowed documents and may run on any thread.

pub mod engine;
pub mod flatten;

pub use engine::{build_tree_diff, diff_against, diff_documents, diff_flat, summarize};
pub use flatten::{child_path, flatten, flatten_node, FlatTree, NodeDescriptor, ROOT_PATH};
