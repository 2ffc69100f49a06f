//! Vibe Tree Data Structures
//!
//! This module defines the recursive `TreeNode` type and the `Document` wrapper
//! that together describe a song as a schema-free tree of named characteristics.
//!
//! # Architecture
//!
//! - **Universal Node**: A single struct represents branches and leaves alike
//! - **Typed Payloads**: `value` and `metadata` entries are a tagged union
//!   ([`NodeValue`]) instead of untyped JSON, so consumers match exhaustively
//! - **Ordered Children**: `children` keep declaration order; it is meaningful
//! - **Owned Tree**: Children are owned by value, so a `TreeNode` can never be
//!   its own ancestor
//!
//! # Examples
//!
//! ```rust
//! use vibetree_core::models::{Document, NodeValue, TreeNode};
//!
//! let tree = TreeNode::new("Song")?
//!     .with_child(TreeNode::new("Title")?.with_value("Test"))
//!     .with_child(
//!         TreeNode::new("Instrumentation")?
//!             .with_child(TreeNode::new("Piano")?)
//!             .with_child(TreeNode::new("Strings")?),
//!     );
//!
//! let document = Document::new(tree);
//! assert!(document.validate().is_ok());
//! # Ok::<(), vibetree_core::models::ValidationError>(())
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Default limit on how far below the root a node may sit
pub const MAX_TREE_DEPTH: usize = 10;

/// Validation errors for trees and documents
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Node at {path} has an empty name")]
    EmptyName { path: String },

    #[error("Node at {path} exceeds the maximum tree depth of {max_depth}")]
    DepthExceeded { path: String, max_depth: usize },

    #[error("Malformed document: {0}")]
    Malformed(String),
}

impl ValidationError {
    /// Create an empty name error
    pub fn empty_name(path: impl Into<String>) -> Self {
        Self::EmptyName { path: path.into() }
    }

    /// Create a depth exceeded error
    pub fn depth_exceeded(path: impl Into<String>, max_depth: usize) -> Self {
        Self::DepthExceeded {
            path: path.into(),
            max_depth,
        }
    }

    /// Create a malformed document error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

/// A single scalar payload: text, number or boolean.
///
/// Numbers keep their JSON representation (`80` stays an integer, `0.5` a
/// float) so that serialization round trips are lossless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    /// Build a numeric scalar from a float; `None` for NaN or infinities
    pub fn from_f64(value: f64) -> Option<Self> {
        serde_json::Number::from_f64(value).map(Scalar::Number)
    }

    /// The text payload, if this is a text scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Numeric view of the scalar (text is not parsed here)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(number) => number.as_f64(),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(flag) => write!(f, "{}", flag),
            Scalar::Number(number) => write!(f, "{}", number),
            Scalar::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Scalar::Number(value.into())
    }
}

/// Payload carried by a node's `value` slot or by a metadata entry.
///
/// An absent value is modelled as `Option<NodeValue>::None` on the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
    Map(BTreeMap<String, Scalar>),
}

impl NodeValue {
    /// Build a list value from anything convertible to scalars
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        NodeValue::List(items.into_iter().map(Into::into).collect())
    }

    /// All scalars held by this value, in order (map values by key order)
    pub fn scalars(&self) -> Vec<&Scalar> {
        match self {
            NodeValue::Scalar(scalar) => vec![scalar],
            NodeValue::List(items) => items.iter().collect(),
            NodeValue::Map(entries) => entries.values().collect(),
        }
    }

    /// The single scalar, if this value is one
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            NodeValue::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }
}

impl From<Scalar> for NodeValue {
    fn from(value: Scalar) -> Self {
        NodeValue::Scalar(value)
    }
}

macro_rules! node_value_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for NodeValue {
                fn from(value: $ty) -> Self {
                    NodeValue::Scalar(value.into())
                }
            }
        )*
    };
}

node_value_from_scalar!(&str, String, bool, i64, i32, u64);

/// Recursive building block of a vibe tree.
///
/// # Fields
///
/// - `name`: Non-empty label, unique only among its siblings
/// - `value`: Optional payload; absent for purely structural branches
/// - `metadata`: Auxiliary attributes (ranges, roles, suggested tempo, ...)
/// - `children`: Ordered child nodes, empty for leaves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<NodeValue>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, NodeValue>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Create a node with the given name and no payload
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyName` if `name` is empty or whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_name("<new node>"));
        }

        Ok(Self {
            name,
            value: None,
            metadata: BTreeMap::new(),
            children: Vec::new(),
        })
    }

    /// Set the node's value
    pub fn with_value(mut self, value: impl Into<NodeValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Insert a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<NodeValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Append a child node
    pub fn with_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append several child nodes in order
    pub fn with_children(mut self, children: impl IntoIterator<Item = TreeNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// True when the node has no children
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Case-insensitive name comparison, ignoring surrounding whitespace
    pub fn name_matches(&self, candidate: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(candidate.trim())
    }

    /// Total number of nodes in this subtree, including `self`
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Check names and depth across the whole subtree.
    ///
    /// Uses an explicit work stack so adversarially deep input cannot overflow
    /// the call stack before the depth limit is hit.
    pub fn validate(&self, max_depth: usize) -> Result<(), ValidationError> {
        let mut stack: Vec<(&TreeNode, String, usize)> = vec![(self, "root".to_string(), 0)];

        while let Some((node, path, depth)) = stack.pop() {
            if node.name.trim().is_empty() {
                return Err(ValidationError::empty_name(path));
            }
            if depth > max_depth {
                return Err(ValidationError::depth_exceeded(path, max_depth));
            }

            for (index, child) in node.children.iter().enumerate().rev() {
                stack.push((child, format!("{}/children[{}]", path, index), depth + 1));
            }
        }

        Ok(())
    }
}

/// A named wrapper around exactly one root node plus document-level metadata.
///
/// Document-level fields may arrive either here or on the root node's
/// `metadata`; consumers check both.
///
/// # Wire Format
///
/// Serializes as `{"root": {...}, "title": ..., "genre": ..., "tags": [...],
/// "duration_seconds": ...}` (optional fields omitted when empty). Deserializes
/// from that shape or from a bare node object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub root: TreeNode,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

#[derive(Deserialize)]
struct WrappedDocument {
    root: TreeNode,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    duration_seconds: Option<f64>,
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let wrapped = raw
            .as_object()
            .is_some_and(|object| object.contains_key("root"));

        if wrapped {
            let doc: WrappedDocument = serde_json::from_value(raw).map_err(D::Error::custom)?;
            Ok(Self {
                root: doc.root,
                title: doc.title,
                genre: doc.genre,
                tags: doc.tags,
                duration_seconds: doc.duration_seconds,
            })
        } else {
            let root: TreeNode = serde_json::from_value(raw).map_err(D::Error::custom)?;
            Ok(Self::new(root))
        }
    }
}

impl Document {
    /// Wrap a root node with no document-level fields
    pub fn new(root: TreeNode) -> Self {
        Self {
            root,
            title: None,
            genre: None,
            tags: Vec::new(),
            duration_seconds: None,
        }
    }

    /// Parse a document from JSON text and validate it
    ///
    /// # Errors
    ///
    /// - `ValidationError::Malformed` if the text is not a document
    /// - Any structural error from [`Document::validate`]
    pub fn from_json(text: &str) -> Result<Self, ValidationError> {
        let document: Document =
            serde_json::from_str(text).map_err(|e| ValidationError::malformed(e.to_string()))?;
        document.validate()?;
        Ok(document)
    }

    /// Parse a document from an already-decoded JSON value and validate it
    pub fn from_value(value: serde_json::Value) -> Result<Self, ValidationError> {
        let document: Document =
            serde_json::from_value(value).map_err(|e| ValidationError::malformed(e.to_string()))?;
        document.validate()?;
        Ok(document)
    }

    /// Canonical JSON representation
    pub fn to_json(&self) -> serde_json::Value {
        // Every field is a plain map/list/scalar, so this cannot fail
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Validate with the default depth limit ([`MAX_TREE_DEPTH`])
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_with_max_depth(MAX_TREE_DEPTH)
    }

    /// Validate with an explicit depth limit
    pub fn validate_with_max_depth(&self, max_depth: usize) -> Result<(), ValidationError> {
        self.root.validate(max_depth)
    }

    /// Entry of the root node's metadata (where some schemas carry document fields)
    pub fn root_metadata(&self, key: &str) -> Option<&NodeValue> {
        self.root.metadata.get(key)
    }

    /// Total node count
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }
}
