//! Path-Addressed Tree Flattening
//!
//! Converts a tree into an ordered, path-keyed map of node descriptors so two
//! trees can be compared path by path.
//!
//! # Path Addressing
//!
//! - The root is addressed as `root`
//! - The i-th child (0-indexed) of the node at `P` is `P/children[i]`
//!
//! Paths are positional: inserting or reordering a sibling shifts the paths of
//! every later sibling.

use crate::models::{Document, NodeValue, TreeNode};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Path of the root node
pub const ROOT_PATH: &str = "root";

/// Flattened view of one node, borrowing from the source tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDescriptor<'a> {
    /// Fresh opaque id for caller bookkeeping (UI row keys); never compared
    #[serde(rename = "id")]
    pub synthetic_id: String,
    pub name: &'a str,
    pub value: Option<&'a NodeValue>,
    pub metadata: &'a BTreeMap<String, NodeValue>,
    pub children_count: usize,
}

impl NodeDescriptor<'_> {
    /// Structural equality over `{name, value, metadata}`; ids are ignored
    pub fn same_content(&self, other: &NodeDescriptor<'_>) -> bool {
        self.name == other.name && self.value == other.value && self.metadata == other.metadata
    }
}

/// Ordered `path -> descriptor` map in depth-first pre-order
#[derive(Debug, Clone, Default)]
pub struct FlatTree<'a> {
    entries: Vec<(String, NodeDescriptor<'a>)>,
    index: HashMap<String, usize>,
}

impl<'a> FlatTree<'a> {
    /// The flattening of the empty tree
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a descriptor by path
    pub fn get(&self, path: &str) -> Option<&NodeDescriptor<'a>> {
        self.index.get(path).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Entries in traversal order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeDescriptor<'a>)> {
        self.entries.iter().map(|(path, desc)| (path.as_str(), desc))
    }

    /// Paths in traversal order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(path, _)| path.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, path: String, descriptor: NodeDescriptor<'a>) {
        self.index.insert(path.clone(), self.entries.len());
        self.entries.push((path, descriptor));
    }
}

/// Flatten a document's tree
pub fn flatten(document: &Document) -> FlatTree<'_> {
    flatten_node(&document.root)
}

/// Flatten a subtree, addressing `node` as `root`
pub fn flatten_node(node: &TreeNode) -> FlatTree<'_> {
    let mut flat = FlatTree::empty();
    let mut stack: Vec<(&TreeNode, String)> = vec![(node, ROOT_PATH.to_string())];

    while let Some((current, path)) = stack.pop() {
        // Reverse push keeps pre-order in declaration order
        for (i, child) in current.children.iter().enumerate().rev() {
            stack.push((child, child_path(&path, i)));
        }

        flat.push(
            path,
            NodeDescriptor {
                synthetic_id: synthetic_id(),
                name: &current.name,
                value: current.value.as_ref(),
                metadata: &current.metadata,
                children_count: current.children.len(),
            },
        );
    }

    flat
}

/// Path of the `index`-th child of the node at `parent`
pub fn child_path(parent: &str, index: usize) -> String {
    format!("{}/children[{}]", parent, index)
}

fn synthetic_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
