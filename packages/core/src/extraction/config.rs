//! Configuration for the parameter extraction pipeline
use serde::{Deserialize, Serialize};

/// Upper bound accepted for `max_moods`
const MAX_SUPPORTED_MOODS: usize = 32;

const DEFAULT_FALLBACK_PROMPT: &str = "music composition";
const DEFAULT_FALLBACK_LYRICS: &str = "[Instrumental]";

/// Sentinel names and limits steering extraction.
///
/// All name comparisons are case-insensitive. Branch keywords match when the
/// parent's name contains the keyword (so "Temporal Dynamics" and
/// "Rhythm & Tempo" both qualify as temporal branches).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Branches whose direct children name instruments
    pub instrumentation_names: Vec<String>,

    /// Mood sources in priority order; the first sentinel that yields tokens wins
    pub emotion_names: Vec<String>,

    /// Cap on mood tokens carried into the prompt
    pub max_moods: usize,

    /// Branches whose valued children become narrative lyric lines
    pub turning_point_names: Vec<String>,

    /// Nodes whose phases (metadata entries and valued children) become lyric lines
    pub emotional_arc_names: Vec<String>,

    pub tempo_names: Vec<String>,
    pub meter_names: Vec<String>,
    pub key_names: Vec<String>,

    /// Parent-name keywords marking a temporal branch (tempo, meter)
    pub temporal_branch_keywords: Vec<String>,

    /// Parent-name keywords marking a harmonic branch (key center)
    pub harmonic_branch_keywords: Vec<String>,

    /// Root metadata keys consumed separately and skipped by keyword collection
    pub reserved_root_keys: Vec<String>,

    /// Use the root node's name as the title when no explicit title exists
    pub root_name_as_title: bool,

    /// Prompt returned when no tokens are found
    pub fallback_prompt: String,

    /// Lyrics returned when no narrative or instrumentation is found
    pub fallback_lyrics: String,

    /// Defaults for the generation request object
    pub request: RequestDefaults,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            instrumentation_names: strings(&["Instrumentation"]),
            emotion_names: strings(&["Primary Emotions", "Emotional Landscape"]),
            max_moods: 5,
            turning_point_names: strings(&["Turning Points"]),
            emotional_arc_names: strings(&["Emotional Arc"]),
            tempo_names: strings(&["Tempo"]),
            meter_names: strings(&["Meter"]),
            key_names: strings(&["Key Center"]),
            temporal_branch_keywords: strings(&["temporal", "rhythm", "tempo"]),
            harmonic_branch_keywords: strings(&["harmonic", "harmony", "tonal"]),
            reserved_root_keys: strings(&[
                "tags",
                "overall_arc",
                "title",
                "genre",
                "duration_seconds",
            ]),
            root_name_as_title: false,
            fallback_prompt: DEFAULT_FALLBACK_PROMPT.to_string(),
            fallback_lyrics: DEFAULT_FALLBACK_LYRICS.to_string(),
            request: RequestDefaults::default(),
        }
    }
}

impl ExtractionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_moods == 0 {
            return Err("max_moods must be greater than 0".to_string());
        }

        if self.max_moods > MAX_SUPPORTED_MOODS {
            return Err(format!("max_moods cannot exceed {}", MAX_SUPPORTED_MOODS));
        }

        if self.fallback_prompt.trim().is_empty() {
            return Err("fallback_prompt cannot be empty".to_string());
        }

        if self.fallback_lyrics.trim().is_empty() {
            return Err("fallback_lyrics cannot be empty".to_string());
        }

        for (field, names) in [
            ("instrumentation_names", &self.instrumentation_names),
            ("emotion_names", &self.emotion_names),
            ("tempo_names", &self.tempo_names),
            ("meter_names", &self.meter_names),
            ("key_names", &self.key_names),
        ] {
            if names.iter().any(|n| n.trim().is_empty()) {
                return Err(format!("{} cannot contain blank names", field));
            }
        }

        self.request.validate()
    }

    /// Fallback prompt, never blank even for an unvalidated config
    pub fn prompt_fallback(&self) -> &str {
        non_blank(&self.fallback_prompt, DEFAULT_FALLBACK_PROMPT)
    }

    /// Fallback lyrics, never blank even for an unvalidated config
    pub fn lyrics_fallback(&self) -> &str {
        non_blank(&self.fallback_lyrics, DEFAULT_FALLBACK_LYRICS)
    }

    /// True when `key` is a root metadata key consumed outside keyword collection
    pub fn is_reserved_root_key(&self, key: &str) -> bool {
        self.reserved_root_keys
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(key))
    }
}

/// Fixed fields of the request sent to the audio-generation collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestDefaults {
    pub inference_steps: u32,
    pub batch_size: u32,
    pub audio_format: String,

    /// Longest clip requested, in seconds
    pub max_audio_duration: f64,

    /// Clip length used when the document carries no duration
    pub default_audio_duration: f64,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            inference_steps: 8,
            batch_size: 1,
            audio_format: "mp3".to_string(),
            max_audio_duration: 120.0,
            default_audio_duration: 30.0,
        }
    }
}

impl RequestDefaults {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.inference_steps == 0 {
            return Err("inference_steps must be greater than 0".to_string());
        }

        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }

        if self.audio_format.trim().is_empty() {
            return Err("audio_format cannot be empty".to_string());
        }

        if self.max_audio_duration.is_nan() || self.max_audio_duration <= 0.0 {
            return Err("max_audio_duration must be positive".to_string());
        }

        if self.default_audio_duration.is_nan()
            || self.default_audio_duration <= 0.0
            || self.default_audio_duration > self.max_audio_duration
        {
            return Err(format!(
                "default_audio_duration must be in (0, {}]",
                self.max_audio_duration
            ));
        }

        Ok(())
    }

    /// Requested clip length for a document duration
    pub fn audio_duration(&self, duration_seconds: Option<f64>) -> f64 {
        match duration_seconds {
            Some(seconds) if seconds > 0.0 => seconds.min(self.max_audio_duration),
            _ => self.default_audio_duration,
        }
    }
}

fn non_blank<'a>(configured: &'a str, default: &'a str) -> &'a str {
    if configured.trim().is_empty() {
        default
    } else {
        configured
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
