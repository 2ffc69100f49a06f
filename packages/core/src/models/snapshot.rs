//! Snapshot and Diff Records
//!
//! Immutable point-in-time captures of a [`Document`] together with the
//! generation parameters derived from it, and the structural change records
//! produced when two captures are compared.

use super::tree::{Document, NodeValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// Identifier used in place of a snapshot id when diffing against nothing
pub const INITIAL_SNAPSHOT_ID: &str = "initial";

/// Reference to a previous snapshot, or to the empty tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SnapshotRef {
    /// No prior snapshot: diff against the empty tree
    Initial,
    /// An existing snapshot by id
    Id(String),
}

impl SnapshotRef {
    /// Interpret an inbound identifier; the sentinel maps to `Initial`
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed == INITIAL_SNAPSHOT_ID {
            SnapshotRef::Initial
        } else {
            SnapshotRef::Id(trimmed.to_string())
        }
    }

    /// Wire form of the reference
    pub fn as_str(&self) -> &str {
        match self {
            SnapshotRef::Initial => INITIAL_SNAPSHOT_ID,
            SnapshotRef::Id(id) => id,
        }
    }
}

impl fmt::Display for SnapshotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for SnapshotRef {
    fn from(raw: &str) -> Self {
        SnapshotRef::parse(raw)
    }
}

/// A frozen capture of a tree and its generation state.
///
/// Snapshots are created once by the snapshot service and never edited; the
/// store hands them out behind `Arc` so every reader sees the same instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,

    pub created_at: DateTime<Utc>,

    pub tree: Document,

    /// Caption text handed to the audio-generation collaborator
    pub derived_prompt: String,

    /// Lyrics skeleton handed to the audio-generation collaborator
    pub derived_lyrics: String,

    /// Full request parameter object used for generation
    #[serde(default)]
    pub derived_parameters: Map<String, Value>,

    /// bpm / key / time signature / duration / tags, plus collaborator metadata
    #[serde(default)]
    pub derived_metadata: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_audio_path: Option<PathBuf>,

    /// Low-level generation prompt reported back by the collaborator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_info: Option<String>,
}

impl Snapshot {
    /// Short descriptor returned right after creation
    pub fn descriptor(&self) -> SnapshotDescriptor {
        SnapshotDescriptor {
            id: self.id.clone(),
            created_at: self.created_at,
            audio_reference: self.audio_reference.clone(),
        }
    }
}

/// `{id, created_at, audio_reference}` summary of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDescriptor {
    pub id: String,
    /// ISO-8601 on the wire
    pub created_at: DateTime<Utc>,
    pub audio_reference: Option<String>,
}

/// Kind of structural change at one path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Added => "added",
            ChangeType::Modified => "modified",
            ChangeType::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structural change between two trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDiff {
    /// Synthetic id assigned at flatten time; not stable across calls
    pub id: String,

    /// Positional path, e.g. `root/children[1]/children[0]`
    pub path: String,

    pub node_name: String,

    #[serde(rename = "type")]
    pub change_type: ChangeType,

    #[serde(rename = "original", default)]
    pub original_value: Option<NodeValue>,

    #[serde(rename = "modified", default)]
    pub modified_value: Option<NodeValue>,
}

/// The aggregate set of changes between two documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeDiff {
    /// Source snapshot id, or [`INITIAL_SNAPSHOT_ID`]
    #[serde(rename = "from")]
    pub from_snapshot_id: String,

    #[serde(rename = "to")]
    pub to_snapshot_id: String,

    pub summary: String,

    #[serde(rename = "changes", default)]
    pub node_diffs: Vec<NodeDiff>,
}

impl TreeDiff {
    /// Check if there are any node changes
    pub fn has_changes(&self) -> bool {
        !self.node_diffs.is_empty()
    }

    /// Number of changes of the given kind
    pub fn count(&self, change_type: ChangeType) -> usize {
        self.node_diffs
            .iter()
            .filter(|d| d.change_type == change_type)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TreeNode;
    use serde_json::json;

    #[test]
    fn test_snapshot_ref_parse() {
        assert_eq!(SnapshotRef::parse("initial"), SnapshotRef::Initial);
        assert_eq!(SnapshotRef::parse(" initial "), SnapshotRef::Initial);
        assert_eq!(
            SnapshotRef::parse("abc-123"),
            SnapshotRef::Id("abc-123".to_string())
        );
        assert_eq!(SnapshotRef::Initial.to_string(), "initial");
    }

    /// Contract test: the diff payload uses the short wire names
    /// `{from, to, summary, changes: [{path, node_name, type, original, modified}]}`.
    #[test]
    fn test_tree_diff_serialization_contract() {
        let diff = TreeDiff {
            from_snapshot_id: INITIAL_SNAPSHOT_ID.to_string(),
            to_snapshot_id: "snap-2".to_string(),
            summary: "1 node modified".to_string(),
            node_diffs: vec![NodeDiff {
                id: "a1b2c3d4".to_string(),
                path: "root/children[0]".to_string(),
                node_name: "Title".to_string(),
                change_type: ChangeType::Modified,
                original_value: Some(NodeValue::from("Old")),
                modified_value: Some(NodeValue::from("New")),
            }],
        };

        let value = serde_json::to_value(&diff).unwrap();

        assert_eq!(value["from"], "initial");
        assert_eq!(value["to"], "snap-2");
        assert_eq!(value["summary"], "1 node modified");
        assert_eq!(value["changes"][0]["type"], "modified");
        assert_eq!(value["changes"][0]["path"], "root/children[0]");
        assert_eq!(value["changes"][0]["node_name"], "Title");
        assert_eq!(value["changes"][0]["original"], "Old");
        assert_eq!(value["changes"][0]["modified"], "New");

        let parsed: TreeDiff = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, diff);
    }

    #[test]
    fn test_descriptor_uses_iso_timestamp() {
        let snapshot = Snapshot {
            id: "snap-1".to_string(),
            created_at: "2025-01-03T10:00:00Z".parse().unwrap(),
            tree: Document::new(TreeNode::new("Song").unwrap()),
            derived_prompt: "music composition".to_string(),
            derived_lyrics: "[Instrumental]".to_string(),
            derived_parameters: Map::new(),
            derived_metadata: Map::new(),
            audio_reference: Some("/audio/snap-1.mp3".to_string()),
            reference_audio_path: None,
            generation_info: None,
        };

        let value = serde_json::to_value(snapshot.descriptor()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "snap-1",
                "created_at": "2025-01-03T10:00:00Z",
                "audio_reference": "/audio/snap-1.mp3"
            })
        );
    }

    #[test]
    fn test_has_changes_and_count() {
        let mut diff = TreeDiff {
            from_snapshot_id: "a".to_string(),
            to_snapshot_id: "b".to_string(),
            summary: "No changes".to_string(),
            node_diffs: Vec::new(),
        };
        assert!(!diff.has_changes());

        diff.node_diffs.push(NodeDiff {
            id: "x".to_string(),
            path: "root/children[2]".to_string(),
            node_name: "Bridge".to_string(),
            change_type: ChangeType::Added,
            original_value: None,
            modified_value: None,
        });
        assert!(diff.has_changes());
        assert_eq!(diff.count(ChangeType::Added), 1);
        assert_eq!(diff.count(ChangeType::Deleted), 0);
    }
}
