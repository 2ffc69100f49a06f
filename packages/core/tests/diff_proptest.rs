//! Property-based tests for serialization, flattening, diffing and extraction
//!
//! Trees are generated with integer, boolean and text scalars only, so JSON
//! round trips are exact.

use proptest::prelude::*;
use std::collections::HashSet;
use vibetree_core::diff::{diff_documents, flatten, summarize};
use vibetree_core::extraction::extract;
use vibetree_core::models::{ChangeType, Document, NodeValue, Scalar, TreeNode};

fn name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Z][a-z]{0,8}",
        "[A-Z][a-z]{1,6} [A-Z][a-z]{1,6}",
        Just("Instrumentation".to_string()),
        Just("Primary Emotions".to_string()),
        Just("Tempo".to_string()),
    ]
}

fn scalar_strategy() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        any::<i64>().prop_map(Scalar::from),
        any::<bool>().prop_map(Scalar::from),
        "[a-z ]{0,12}".prop_map(Scalar::from),
    ]
}

fn value_strategy() -> impl Strategy<Value = NodeValue> {
    prop_oneof![
        scalar_strategy().prop_map(NodeValue::from),
        prop::collection::vec(scalar_strategy(), 0..4).prop_map(NodeValue::List),
        prop::collection::btree_map("[a-z]{1,6}", scalar_strategy(), 0..3).prop_map(NodeValue::Map),
    ]
}

fn leaf_strategy() -> impl Strategy<Value = TreeNode> {
    (
        name_strategy(),
        prop::option::of(value_strategy()),
        prop::collection::btree_map("[a-z_]{1,8}", value_strategy(), 0..3),
    )
        .prop_map(|(name, value, metadata)| TreeNode {
            name,
            value,
            metadata,
            children: Vec::new(),
        })
}

fn tree_strategy() -> impl Strategy<Value = TreeNode> {
    leaf_strategy().prop_recursive(4, 48, 5, |inner| {
        (leaf_strategy(), prop::collection::vec(inner, 0..5)).prop_map(|(mut node, children)| {
            node.children = children;
            node
        })
    })
}

fn document_strategy() -> impl Strategy<Value = Document> {
    tree_strategy().prop_map(Document::new)
}

#[cfg(test)]
mod proptest_tests {
    use super::*;

    proptest! {
        #[test]
        fn test_serialization_round_trip(document in document_strategy()) {
            let text = serde_json::to_string(&document.to_json()).unwrap();
            let parsed = Document::from_json(&text).unwrap();
            prop_assert_eq!(parsed, document);
        }

        #[test]
        fn test_diff_against_self_is_empty(document in document_strategy()) {
            let diffs = diff_documents(&document, &document);
            prop_assert!(diffs.is_empty());
            prop_assert_eq!(summarize(&diffs), "No changes");
        }

        #[test]
        fn test_diff_against_clone_is_empty(document in document_strategy()) {
            let copy = document.clone();
            prop_assert!(diff_documents(&document, &copy).is_empty());
        }

        #[test]
        fn test_diff_completeness(a in document_strategy(), b in document_strategy()) {
            let flat_a = flatten(&a);
            let flat_b = flatten(&b);
            let diffs = diff_documents(&a, &b);

            let reported: HashSet<(&str, ChangeType)> = diffs
                .iter()
                .map(|d| (d.path.as_str(), d.change_type))
                .collect();
            prop_assert_eq!(reported.len(), diffs.len(), "each path is reported once");

            for (path, descriptor) in flat_a.iter() {
                match flat_b.get(path) {
                    None => prop_assert!(reported.contains(&(path, ChangeType::Deleted))),
                    Some(other) if descriptor.same_content(other) => {
                        prop_assert!(!diffs.iter().any(|d| d.path == path));
                    }
                    Some(_) => prop_assert!(reported.contains(&(path, ChangeType::Modified))),
                }
            }

            for path in flat_b.paths() {
                if !flat_a.contains(path) {
                    prop_assert!(reported.contains(&(path, ChangeType::Added)));
                }
            }

            for diff in &diffs {
                prop_assert!(flat_a.contains(&diff.path) || flat_b.contains(&diff.path));
            }
        }

        #[test]
        fn test_diff_order_deletions_and_modifications_first(
            a in document_strategy(),
            b in document_strategy(),
        ) {
            let diffs = diff_documents(&a, &b);
            let first_added = diffs
                .iter()
                .position(|d| d.change_type == ChangeType::Added)
                .unwrap_or(diffs.len());
            prop_assert!(diffs[first_added..]
                .iter()
                .all(|d| d.change_type == ChangeType::Added));
        }

        #[test]
        fn test_flatten_covers_every_node(document in document_strategy()) {
            prop_assert_eq!(flatten(&document).len(), document.node_count());
        }

        #[test]
        fn test_extraction_never_empty_and_deterministic(document in document_strategy()) {
            let first = extract(&document);
            let second = extract(&document);

            prop_assert!(!first.prompt.trim().is_empty());
            prop_assert!(!first.lyrics.trim().is_empty());
            prop_assert_eq!(first, second);
        }
    }
}
