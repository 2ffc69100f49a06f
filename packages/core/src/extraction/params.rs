//! Generation parameters derived from a tree

use super::config::RequestDefaults;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Flat parameter set consumed by the audio-generation collaborator.
///
/// `prompt` and `lyrics` are never empty; see the fallbacks in
/// [`ExtractionConfig`](super::ExtractionConfig).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub prompt: String,
    pub lyrics: String,
    pub tags: Vec<String>,
    pub bpm: Option<u32>,
    pub key: Option<String>,
    pub time_signature: Option<String>,
    pub duration_seconds: Option<f64>,
}

impl GenerationParams {
    /// Request object for the generation service.
    ///
    /// Always carries `prompt`, `lyrics`, `inference_steps`, `batch_size`,
    /// `audio_format` and `audio_duration`; `bpm`, `key_scale` and
    /// `time_signature` only when extracted.
    pub fn to_request_params(&self, defaults: &RequestDefaults) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("prompt".to_string(), json!(self.prompt));
        params.insert("lyrics".to_string(), json!(self.lyrics));
        params.insert("inference_steps".to_string(), json!(defaults.inference_steps));
        params.insert("batch_size".to_string(), json!(defaults.batch_size));
        params.insert("audio_format".to_string(), json!(defaults.audio_format));
        params.insert(
            "audio_duration".to_string(),
            json!(defaults.audio_duration(self.duration_seconds)),
        );

        if let Some(bpm) = self.bpm {
            params.insert("bpm".to_string(), json!(bpm));
        }
        if let Some(key) = &self.key {
            params.insert("key_scale".to_string(), json!(key));
        }
        if let Some(time_signature) = &self.time_signature {
            params.insert("time_signature".to_string(), json!(time_signature));
        }

        params
    }

    /// Derived metadata recorded on a snapshot (absent fields are `null`)
    pub fn metadata_map(&self) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("bpm".to_string(), json!(self.bpm));
        metadata.insert("key".to_string(), json!(self.key));
        metadata.insert("time_signature".to_string(), json!(self.time_signature));
        metadata.insert("duration_seconds".to_string(), json!(self.duration_seconds));
        metadata.insert("tags".to_string(), json!(self.tags));
        metadata
    }
}
