//! Structural Diff Engine
//!
//! Compares two flattened trees path by path and reports added, modified and
//! deleted nodes.
//!
//! # Emission Order
//!
//! 1. Deletions and modifications, in the order their paths appear while
//!    scanning the original flattening
//! 2. Additions, in the order their paths appear while scanning the modified
//!    flattening
//!
//! Callers rely on this order for deterministic output.

use super::flatten::{flatten, FlatTree};
use crate::models::{ChangeType, Document, NodeDiff, TreeDiff};

/// Diff two documents
///
/// # Examples
///
/// ```rust
/// use vibetree_core::diff::{diff_documents, summarize};
/// use vibetree_core::models::{Document, TreeNode};
///
/// let before = Document::new(TreeNode::new("Song")?.with_child(TreeNode::new("Tempo")?));
/// let after = Document::new(
///     TreeNode::new("Song")?
///         .with_child(TreeNode::new("Tempo")?.with_value(90))
///         .with_child(TreeNode::new("Key Center")?.with_value("D major")),
/// );
///
/// let changes = diff_documents(&before, &after);
/// assert_eq!(summarize(&changes), "1 node added, 1 node modified");
/// # Ok::<(), vibetree_core::models::ValidationError>(())
/// ```
pub fn diff_documents(original: &Document, modified: &Document) -> Vec<NodeDiff> {
    diff_flat(&flatten(original), &flatten(modified))
}

/// Diff against an optional original; `None` is the empty tree
pub fn diff_against(original: Option<&Document>, modified: &Document) -> Vec<NodeDiff> {
    match original {
        Some(original) => diff_documents(original, modified),
        None => diff_flat(&FlatTree::empty(), &flatten(modified)),
    }
}

/// Diff two flattenings
pub fn diff_flat(original: &FlatTree<'_>, modified: &FlatTree<'_>) -> Vec<NodeDiff> {
    let mut diffs = Vec::new();

    for (path, before) in original.iter() {
        match modified.get(path) {
            None => diffs.push(NodeDiff {
                id: before.synthetic_id.clone(),
                path: path.to_string(),
                node_name: before.name.to_string(),
                change_type: ChangeType::Deleted,
                original_value: before.value.cloned(),
                modified_value: None,
            }),
            Some(after) if !before.same_content(after) => diffs.push(NodeDiff {
                id: before.synthetic_id.clone(),
                path: path.to_string(),
                node_name: after.name.to_string(),
                change_type: ChangeType::Modified,
                original_value: before.value.cloned(),
                modified_value: after.value.cloned(),
            }),
            Some(_) => {}
        }
    }

    for (path, after) in modified.iter() {
        if !original.contains(path) {
            diffs.push(NodeDiff {
                id: after.synthetic_id.clone(),
                path: path.to_string(),
                node_name: after.name.to_string(),
                change_type: ChangeType::Added,
                original_value: None,
                modified_value: after.value.cloned(),
            });
        }
    }

    tracing::debug!(
        "Diffed {} original paths against {} modified paths: {} changes",
        original.len(),
        modified.len(),
        diffs.len()
    );

    diffs
}

/// Human-readable summary of a change list.
///
/// Counts per kind in the fixed order added, modified, deleted, pluralized
/// (`"1 node added"`, `"2 nodes added"`), joined with `", "`. An empty list
/// reads `"No changes"`.
pub fn summarize(diffs: &[NodeDiff]) -> String {
    if diffs.is_empty() {
        return "No changes".to_string();
    }

    let parts: Vec<String> = [ChangeType::Added, ChangeType::Modified, ChangeType::Deleted]
        .into_iter()
        .filter_map(|kind| {
            let count = diffs.iter().filter(|d| d.change_type == kind).count();
            (count > 0).then(|| {
                let noun = if count == 1 { "node" } else { "nodes" };
                format!("{} {} {}", count, noun, kind)
            })
        })
        .collect();

    parts.join(", ")
}

/// Assemble a [`TreeDiff`] payload from a change list
pub fn build_tree_diff(
    from_snapshot_id: impl Into<String>,
    to_snapshot_id: impl Into<String>,
    node_diffs: Vec<NodeDiff>,
) -> TreeDiff {
    TreeDiff {
        from_snapshot_id: from_snapshot_id.into(),
        to_snapshot_id: to_snapshot_id.into(),
        summary: summarize(&node_diffs),
        node_diffs,
    }
}
