//! Snapshot Service
//!
//! Orchestrates the edit flow: a client submits a document, the extraction
//! pipeline derives generation parameters, the store captures everything as an
//! immutable snapshot, and later edits are diffed against a referenced
//! snapshot.
//!
//! # Edit Flow
//!
//! 1. Resolve the reference snapshot (`initial` means the empty tree)
//! 2. Validate the submitted document and extract parameters
//! 3. Save a new snapshot under a fresh id
//! 4. Diff the reference tree against the new tree and cache the result
//!
//! A reference that names a missing snapshot fails with not-found before any
//! snapshot is created.
//!
//! # Examples
//!
//! ```rust
//! use vibetree_core::models::{Document, SnapshotRef};
//! use vibetree_core::services::{CreateSnapshotRequest, SnapshotService};
//! use vibetree_core::store::InMemorySnapshotStore;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = SnapshotService::new(Arc::new(InMemorySnapshotStore::new()));
//!
//! let first = Document::from_value(json!({"name": "Song", "children": [{"name": "Tempo"}]}))?;
//! let outcome = service.submit_edit(&SnapshotRef::Initial, CreateSnapshotRequest::new(first))?;
//! assert_eq!(outcome.diff.summary, "2 nodes added");
//!
//! let second = Document::from_value(json!({"name": "Song", "children": [{"name": "Tempo", "value": 90}]}))?;
//! let reference = SnapshotRef::parse(&outcome.snapshot.id);
//! let outcome = service.submit_edit(&reference, CreateSnapshotRequest::new(second))?;
//! assert_eq!(outcome.diff.summary, "1 node modified");
//! # Ok(())
//! # }
//! ```

use super::error::SnapshotServiceError;
use crate::diff::{build_tree_diff, diff_against};
use crate::extraction::{ExtractionConfig, ParameterExtractor};
use crate::models::{Document, Snapshot, SnapshotDescriptor, SnapshotRef, TreeDiff, MAX_TREE_DEPTH};
use crate::store::SnapshotStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// `to` id of a diff computed against an unsaved document
pub const PENDING_SNAPSHOT_ID: &str = "pending";

/// Snapshot service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotServiceConfig {
    /// Extraction rules and request defaults
    pub extraction: ExtractionConfig,

    /// Deepest level below the root a submitted document may reach
    pub max_tree_depth: usize,

    /// Store computed diffs so repeated lookups skip recomputation
    pub cache_diffs: bool,
}

impl Default for SnapshotServiceConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            max_tree_depth: MAX_TREE_DEPTH,
            cache_diffs: true,
        }
    }
}

impl SnapshotServiceConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_tree_depth == 0 {
            return Err("max_tree_depth must be greater than 0".to_string());
        }

        self.extraction.validate()
    }
}

/// Prompt and lyrics produced by the external LLM assembly pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssembledPrompt {
    pub prompt: String,
    #[serde(default)]
    pub lyrics: String,
}

/// Everything needed to capture one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSnapshotRequest {
    pub document: Document,

    /// Replaces the derived prompt and lyrics when its prompt is non-blank
    pub assembled: Option<AssembledPrompt>,

    /// URL of the generated audio, when the collaborator already produced it
    pub audio_reference: Option<String>,

    pub reference_audio_path: Option<PathBuf>,

    /// Collaborator-reported metadata, merged over the extracted values
    pub metadata: Map<String, Value>,

    pub generation_info: Option<String>,
}

impl CreateSnapshotRequest {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            assembled: None,
            audio_reference: None,
            reference_audio_path: None,
            metadata: Map::new(),
            generation_info: None,
        }
    }

    pub fn with_assembled_prompt(mut self, assembled: AssembledPrompt) -> Self {
        self.assembled = Some(assembled);
        self
    }

    pub fn with_audio_reference(mut self, url: impl Into<String>) -> Self {
        self.audio_reference = Some(url.into());
        self
    }

    pub fn with_reference_audio_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.reference_audio_path = Some(path.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_generation_info(mut self, info: impl Into<String>) -> Self {
        self.generation_info = Some(info.into());
        self
    }
}

/// Result of submitting an edit: the new snapshot and what changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditOutcome {
    pub snapshot: SnapshotDescriptor,
    pub diff: TreeDiff,
}

/// Coordinates extraction, snapshot capture and diffing over a shared store
///
/// Cloning is cheap; clones share the same store.
#[derive(Clone)]
pub struct SnapshotService {
    store: Arc<dyn SnapshotStore>,
    extractor: ParameterExtractor,
    config: SnapshotServiceConfig,
}

impl std::fmt::Debug for SnapshotService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotService")
            .field("snapshots", &self.store.len())
            .field("config", &self.config)
            .finish()
    }
}

impl SnapshotService {
    /// Create a service with the default configuration
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        let config = SnapshotServiceConfig::default();
        Self {
            store,
            extractor: ParameterExtractor::new(config.extraction.clone()),
            config,
        }
    }

    /// Create a service with a validated configuration
    pub fn with_config(
        store: Arc<dyn SnapshotStore>,
        config: SnapshotServiceConfig,
    ) -> Result<Self, SnapshotServiceError> {
        config
            .validate()
            .map_err(SnapshotServiceError::invalid_config)?;

        Ok(Self {
            store,
            extractor: ParameterExtractor::new(config.extraction.clone()),
            config,
        })
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    pub fn config(&self) -> &SnapshotServiceConfig {
        &self.config
    }

    pub fn extractor(&self) -> &ParameterExtractor {
        &self.extractor
    }

    /// Validate, extract and capture a document as a new snapshot
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` if the document exceeds the configured depth
    /// or contains a blank node name. Nothing is stored in that case.
    pub fn create_snapshot(
        &self,
        request: CreateSnapshotRequest,
    ) -> Result<SnapshotDescriptor, SnapshotServiceError> {
        self.insert_snapshot(request)
            .map(|snapshot| snapshot.descriptor())
    }

    pub fn get_snapshot(&self, id: &str) -> Result<Arc<Snapshot>, SnapshotServiceError> {
        Ok(self.store.get(id)?)
    }

    /// All snapshots, newest first
    pub fn list_snapshots(&self) -> Vec<Arc<Snapshot>> {
        self.store.list()
    }

    /// Capture an edited document and diff it against `reference`
    ///
    /// # Errors
    ///
    /// - `Store(SnapshotNotFound)` if `reference` names a missing snapshot;
    ///   no snapshot is created
    /// - `ValidationFailed` if the document is rejected
    pub fn submit_edit(
        &self,
        reference: &SnapshotRef,
        request: CreateSnapshotRequest,
    ) -> Result<EditOutcome, SnapshotServiceError> {
        let from = self.resolve(reference)?;
        let to = self.insert_snapshot(request)?;

        let changes = diff_against(from.as_deref().map(|s| &s.tree), &to.tree);
        let diff = build_tree_diff(reference.as_str(), to.id.as_str(), changes);

        tracing::info!(
            "Edit {} -> {}: {}",
            diff.from_snapshot_id,
            diff.to_snapshot_id,
            diff.summary
        );

        if self.config.cache_diffs {
            self.store.save_diff(diff.clone());
        }

        Ok(EditOutcome {
            snapshot: to.descriptor(),
            diff,
        })
    }

    /// Diff two stored snapshots, using the cache when possible
    pub fn diff_snapshots(
        &self,
        from: &SnapshotRef,
        to_id: &str,
    ) -> Result<TreeDiff, SnapshotServiceError> {
        let source = self.resolve(from)?;
        let target = self.store.get(to_id)?;

        if self.config.cache_diffs {
            if let Ok(cached) = self.store.get_diff(from.as_str(), to_id) {
                tracing::debug!("Diff cache hit {} -> {}", from, to_id);
                return Ok(cached);
            }
        }

        let changes = diff_against(source.as_deref().map(|s| &s.tree), &target.tree);
        let diff = build_tree_diff(from.as_str(), to_id, changes);

        if self.config.cache_diffs {
            self.store.save_diff(diff.clone());
        }

        Ok(diff)
    }

    /// Previously cached diff for the ordered pair, never recomputed
    pub fn cached_diff(
        &self,
        from: &SnapshotRef,
        to_id: &str,
    ) -> Result<TreeDiff, SnapshotServiceError> {
        Ok(self.store.get_diff(from.as_str(), to_id)?)
    }

    /// Diff an unsaved document against `reference` without storing anything
    pub fn preview_diff(
        &self,
        reference: &SnapshotRef,
        document: &Document,
    ) -> Result<TreeDiff, SnapshotServiceError> {
        document.validate_with_max_depth(self.config.max_tree_depth)?;
        let from = self.resolve(reference)?;

        let changes = diff_against(from.as_deref().map(|s| &s.tree), document);
        Ok(build_tree_diff(reference.as_str(), PENDING_SNAPSHOT_ID, changes))
    }

    /// `None` for the initial sentinel, the stored snapshot otherwise
    fn resolve(
        &self,
        reference: &SnapshotRef,
    ) -> Result<Option<Arc<Snapshot>>, SnapshotServiceError> {
        match reference {
            SnapshotRef::Initial => Ok(None),
            SnapshotRef::Id(id) if id.trim().is_empty() => {
                Err(SnapshotServiceError::invalid_reference(id.as_str()))
            }
            SnapshotRef::Id(id) => Ok(Some(self.store.get(id)?)),
        }
    }

    fn insert_snapshot(
        &self,
        request: CreateSnapshotRequest,
    ) -> Result<Arc<Snapshot>, SnapshotServiceError> {
        let CreateSnapshotRequest {
            document,
            assembled,
            audio_reference,
            reference_audio_path,
            metadata,
            generation_info,
        } = request;

        document.validate_with_max_depth(self.config.max_tree_depth)?;
        let params = self.extractor.extract(&document);

        let (prompt, lyrics) = match assembled {
            Some(assembled) if !assembled.prompt.trim().is_empty() => {
                let lyrics = if assembled.lyrics.trim().is_empty() {
                    self.config.extraction.lyrics_fallback().to_string()
                } else {
                    assembled.lyrics
                };
                (assembled.prompt, lyrics)
            }
            _ => (params.prompt.clone(), params.lyrics.clone()),
        };

        let mut derived_parameters = params.to_request_params(&self.config.extraction.request);
        derived_parameters.insert("prompt".to_string(), json!(prompt));
        derived_parameters.insert("lyrics".to_string(), json!(lyrics));

        let mut derived_metadata = params.metadata_map();
        derived_metadata.extend(metadata);

        let snapshot = Snapshot {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            tree: document,
            derived_prompt: prompt,
            derived_lyrics: lyrics,
            derived_parameters,
            derived_metadata,
            audio_reference,
            reference_audio_path,
            generation_info,
        };

        tracing::info!(
            "Created snapshot {} ({} nodes)",
            snapshot.id,
            snapshot.tree.node_count()
        );

        Ok(self.store.save(snapshot))
    }
}
