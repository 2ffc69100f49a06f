//! Parameter Extraction Pipeline
//!
//! Deterministic, purely syntactic traversal turning an arbitrarily shaped
//! vibe tree into generation parameters: prompt text, tags, a lyrics skeleton
//! and tempo/key/meter/duration metadata.
//!
//! # Recognition Rules
//!
//! - **Keywords**: every scalar `value` and metadata entry in the tree, except
//!   reserved root metadata keys (`tags`, `overall_arc`, ...), which are
//!   consumed separately
//! - **Instruments**: names of the direct children of an "Instrumentation" node
//! - **Moods**: scalar values under the first emotion sentinel that yields any
//!   ("Primary Emotions", then "Emotional Landscape"), capped to `max_moods`
//! - **Tempo / Meter / Key Center**: read from the named nodes, preferring
//!   those under a temporal or harmonic branch respectively
//! - **Lyrics**: turning points and emotional arc phases as `[Label] value`
//!   lines, followed by an `[Instrumentation]` section
//!
//! Identical documents always produce byte-identical output: metadata maps
//! are ordered and nothing reads clocks or randomness.
//!
//! # Examples
//!
//! ```rust
//! use vibetree_core::extraction::extract;
//! use vibetree_core::models::Document;
//! use serde_json::json;
//!
//! let document = Document::from_value(json!({
//!     "name": "Song",
//!     "children": [
//!         {"name": "Title", "value": "Test"},
//!         {"name": "Instrumentation", "children": [{"name": "Piano"}, {"name": "Strings"}]}
//!     ]
//! }))?;
//!
//! let params = extract(&document);
//! assert_eq!(params.prompt, "Test, Piano, Strings");
//! assert_eq!(params.lyrics, "[Instrumentation]\nPiano\nStrings");
//! # Ok::<(), vibetree_core::models::ValidationError>(())
//! ```

mod config;
mod params;
mod tokens;

pub use config::{ExtractionConfig, RequestDefaults};
pub use params::GenerationParams;
pub use tokens::TokenSet;

use crate::models::{Document, NodeValue, Scalar, TreeNode};
use regex::Regex;
use std::sync::LazyLock;

/// Sanity bounds for an extracted tempo
const MIN_BPM: f64 = 1.0;
const MAX_BPM: f64 = 999.0;

/// Extract parameters with the default configuration
pub fn extract(document: &Document) -> GenerationParams {
    ParameterExtractor::default().extract(document)
}

/// Extraction pipeline bound to a configuration
#[derive(Debug, Clone, Default)]
pub struct ParameterExtractor {
    config: ExtractionConfig,
}

impl ParameterExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Derive generation parameters from a document
    pub fn extract(&self, document: &Document) -> GenerationParams {
        let mut walk = TreeWalk::new(&self.config);
        walk.run(&document.root);

        let title = self.resolve_title(document);
        let genre = resolve_field(document, document.genre.as_deref(), "genre", "Genre");
        let document_tags = document_tags(document);

        let moods: Vec<String> = walk
            .moods
            .iter()
            .find(|set| !set.is_empty())
            .map(|set| {
                set.as_slice()
                    .iter()
                    .take(self.config.max_moods)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let mut prompt_tokens = TokenSet::new();
        prompt_tokens.extend(title.iter());
        prompt_tokens.extend(genre.iter());
        prompt_tokens.extend(document_tags.iter());
        prompt_tokens.extend(moods.iter());
        prompt_tokens.extend(walk.instruments.as_slice());

        let prompt = if prompt_tokens.is_empty() {
            tracing::debug!("No prompt tokens found, using fallback prompt");
            self.config.prompt_fallback().to_string()
        } else {
            prompt_tokens.as_slice().join(", ")
        };

        let lyrics = self.assemble_lyrics(&walk);

        let mut tags = TokenSet::new();
        tags.extend(document_tags.iter());
        tags.extend(genre.iter());
        tags.extend(walk.keywords.as_slice());

        GenerationParams {
            prompt,
            lyrics,
            tags: tags.into_vec(),
            bpm: walk.bpm.resolve(),
            key: walk.key.resolve(),
            time_signature: walk.time_signature.resolve(),
            duration_seconds: document_duration(document),
        }
    }

    fn resolve_title(&self, document: &Document) -> Option<String> {
        resolve_field(document, document.title.as_deref(), "title", "Title").or_else(|| {
            self.config
                .root_name_as_title
                .then(|| document.root.name.trim().to_string())
                .filter(|name| !name.is_empty())
        })
    }

    fn assemble_lyrics(&self, walk: &TreeWalk<'_>) -> String {
        let mut sections = Vec::new();

        let narrative: Vec<&str> = walk
            .turning_points
            .iter()
            .chain(walk.arc_phases.iter())
            .map(String::as_str)
            .collect();
        if !narrative.is_empty() {
            sections.push(narrative.join("\n"));
        }

        if !walk.instruments.is_empty() {
            sections.push(format!(
                "[Instrumentation]\n{}",
                walk.instruments.as_slice().join("\n")
            ));
        }

        if sections.is_empty() {
            tracing::debug!("No narrative or instrumentation found, using fallback lyrics");
            self.config.lyrics_fallback().to_string()
        } else {
            sections.join("\n\n")
        }
    }
}

/// First value found for a tempo/meter/key field, preferring nodes under the
/// expected branch over nodes found anywhere else
#[derive(Debug)]
struct Candidate<T> {
    qualified: Option<T>,
    loose: Option<T>,
}

impl<T> Default for Candidate<T> {
    fn default() -> Self {
        Self {
            qualified: None,
            loose: None,
        }
    }
}

impl<T> Candidate<T> {
    fn offer(&mut self, qualified: bool, value: Option<T>) {
        let slot = if qualified {
            &mut self.qualified
        } else {
            &mut self.loose
        };
        if slot.is_none() {
            *slot = value;
        }
    }

    fn resolve(self) -> Option<T> {
        self.qualified.or(self.loose)
    }
}

/// Accumulated state of one pre-order traversal
struct TreeWalk<'c> {
    config: &'c ExtractionConfig,
    keywords: TokenSet,
    instruments: TokenSet,
    /// One set per emotion sentinel, in sentinel priority order
    moods: Vec<TokenSet>,
    bpm: Candidate<u32>,
    time_signature: Candidate<String>,
    key: Candidate<String>,
    turning_points: Vec<String>,
    arc_phases: Vec<String>,
}

impl<'c> TreeWalk<'c> {
    fn new(config: &'c ExtractionConfig) -> Self {
        Self {
            config,
            keywords: TokenSet::new(),
            instruments: TokenSet::new(),
            moods: vec![TokenSet::new(); config.emotion_names.len()],
            bpm: Candidate::default(),
            time_signature: Candidate::default(),
            key: Candidate::default(),
            turning_points: Vec::new(),
            arc_phases: Vec::new(),
        }
    }

    fn run(&mut self, root: &TreeNode) {
        let mut stack: Vec<(&TreeNode, Option<&TreeNode>)> = vec![(root, None)];

        while let Some((node, parent)) = stack.pop() {
            self.visit(node, parent);
            for child in node.children.iter().rev() {
                stack.push((child, Some(node)));
            }
        }
    }

    fn visit(&mut self, node: &TreeNode, parent: Option<&TreeNode>) {
        let config = self.config;
        let is_root = parent.is_none();

        if let Some(value) = &node.value {
            self.keywords.extend(scalar_strings(value));
        }
        for (key, value) in &node.metadata {
            if is_root && config.is_reserved_root_key(key) {
                continue;
            }
            self.keywords.extend(scalar_strings(value));
        }

        if matches_any(node, &config.instrumentation_names) {
            for child in &node.children {
                self.instruments.insert(&child.name);
            }
        }

        for (index, sentinel) in config.emotion_names.iter().enumerate() {
            if node.name_matches(sentinel) {
                collect_subtree_values(node, &mut self.moods[index]);
            }
        }

        if matches_any(node, &config.tempo_names) {
            let qualified = parent_matches(parent, &config.temporal_branch_keywords);
            self.bpm.offer(qualified, bpm_from(node));
        }

        if matches_any(node, &config.meter_names) {
            let qualified = parent_matches(parent, &config.temporal_branch_keywords);
            self.time_signature.offer(qualified, time_signature_from(node));
        }

        if matches_any(node, &config.key_names) {
            let qualified = parent_matches(parent, &config.harmonic_branch_keywords);
            self.key.offer(qualified, key_from(node));
        }

        if matches_any(node, &config.turning_point_names) {
            for child in &node.children {
                if let Some(text) = child.value.as_ref().and_then(value_text) {
                    self.turning_points
                        .push(format!("[{}] {}", child.name.trim(), text));
                }
            }
        }

        if matches_any(node, &config.emotional_arc_names) {
            for (phase, value) in &node.metadata {
                if let Some(text) = value_text(value) {
                    self.arc_phases
                        .push(format!("[{}] {}", phase_label(phase), text));
                }
            }
            for child in &node.children {
                if let Some(text) = child.value.as_ref().and_then(value_text) {
                    self.arc_phases
                        .push(format!("[{}] {}", child.name.trim(), text));
                }
            }
        }
    }
}

fn matches_any(node: &TreeNode, names: &[String]) -> bool {
    names.iter().any(|name| node.name_matches(name))
}

fn parent_matches(parent: Option<&TreeNode>, keywords: &[String]) -> bool {
    parent.is_some_and(|p| {
        let name = p.name.to_lowercase();
        keywords
            .iter()
            .any(|keyword| name.contains(&keyword.to_lowercase()))
    })
}

/// Scalar values of `node` and all its descendants, in pre-order
fn collect_subtree_values(node: &TreeNode, into: &mut TokenSet) {
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if let Some(value) = &current.value {
            into.extend(scalar_strings(value));
        }
        stack.extend(current.children.iter().rev());
    }
}

fn scalar_strings(value: &NodeValue) -> Vec<String> {
    value.scalars().into_iter().map(Scalar::to_string).collect()
}

/// Scalars joined with `", "`; `None` when blank
fn value_text(value: &NodeValue) -> Option<String> {
    let text = value
        .scalars()
        .into_iter()
        .map(|s| s.to_string().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    (!text.is_empty()).then_some(text)
}

/// `emotional_peak` -> `Emotional Peak`
fn phase_label(key: &str) -> String {
    key.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

/// Numeric reading of a value: numbers directly, text by its first number
fn numeric(value: &NodeValue) -> Option<f64> {
    let scalar = value.scalars().into_iter().next()?;
    match scalar {
        Scalar::Number(number) => number.as_f64(),
        Scalar::Text(text) => NUMBER_RE
            .find(text)
            .and_then(|m| m.as_str().parse::<f64>().ok()),
        Scalar::Bool(_) => None,
    }
}

fn bpm_from(node: &TreeNode) -> Option<u32> {
    ["suggested_bpm", "bpm"]
        .iter()
        .filter_map(|key| node.metadata.get(*key))
        .chain(node.value.iter())
        .filter_map(numeric)
        .map(f64::trunc)
        .find(|bpm| bpm.is_finite() && (MIN_BPM..=MAX_BPM).contains(bpm))
        .map(|bpm| bpm as u32)
}

/// `"4/4"` -> `"4"`; other text is kept as is
fn time_signature_from(node: &TreeNode) -> Option<String> {
    let raw = node
        .metadata
        .get("time_signature")
        .or(node.value.as_ref())
        .and_then(|value| value.as_scalar())?
        .to_string();

    let numerator = raw.split('/').next().unwrap_or_default().trim();
    (!numerator.is_empty()).then(|| numerator.to_string())
}

fn key_from(node: &TreeNode) -> Option<String> {
    node.value
        .as_ref()
        .or_else(|| node.metadata.get("key"))
        .and_then(|value| value.as_scalar())
        .map(|scalar| scalar.to_string().trim().to_string())
        .filter(|key| !key.is_empty())
}

/// Dedicated document field, then root metadata entry, then a direct child of
/// the root carrying the value (e.g. a "Title" node)
fn resolve_field(
    document: &Document,
    dedicated: Option<&str>,
    metadata_key: &str,
    child_name: &str,
) -> Option<String> {
    dedicated
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| document.root_metadata(metadata_key).and_then(value_text))
        .or_else(|| {
            document
                .root
                .children
                .iter()
                .find(|child| child.name_matches(child_name))
                .and_then(|child| child.value.as_ref())
                .and_then(value_text)
        })
}

fn document_tags(document: &Document) -> Vec<String> {
    let mut tags: Vec<String> = document.tags.clone();
    if let Some(value) = document.root_metadata("tags") {
        tags.extend(scalar_strings(value));
    }
    tags
}

fn document_duration(document: &Document) -> Option<f64> {
    document
        .duration_seconds
        .or_else(|| document.root_metadata("duration_seconds").and_then(numeric))
        .filter(|seconds| seconds.is_finite() && *seconds > 0.0)
}
