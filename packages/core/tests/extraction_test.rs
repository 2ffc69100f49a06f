//! Extraction Pipeline Integration Tests
//!
//! Runs the full pipeline over a realistic vibe tree and over both accepted
//! document shapes.

use serde_json::json;
use vibetree_core::diff::flatten;
use vibetree_core::extraction::{extract, ExtractionConfig, ParameterExtractor, RequestDefaults};
use vibetree_core::models::Document;

const MOMENTS_ECHO: &str = include_str!("fixtures/moments_echo.json");

fn moments_echo() -> Document {
    Document::from_json(MOMENTS_ECHO).unwrap()
}

#[test]
fn test_full_tree_prompt() {
    let params = extract(&moments_echo());

    assert_eq!(
        params.prompt,
        "nostalgic, piano-driven, ambient, introspective, lo-fi, \
         nostalgia, warmth, longing, Piano, Strings, Ambient Pads"
    );
}

#[test]
fn test_full_tree_lyrics() {
    let params = extract(&moments_echo());

    let expected = [
        "[Discovery (Intro)] from stillness to awareness",
        "[Immersion (Chorus)] from curiosity to deep feeling",
        "[Acceptance (Bridge)] from nostalgia to acceptance",
        "[Intro] gentle awakening",
        "[Peak] bittersweet realization",
        "[Resolution] peaceful acceptance",
        "",
        "[Instrumentation]",
        "Piano",
        "Strings",
        "Ambient Pads",
    ]
    .join("\n");

    assert_eq!(params.lyrics, expected);
}

#[test]
fn test_full_tree_metadata() {
    let params = extract(&moments_echo());

    assert_eq!(params.bpm, Some(80));
    assert_eq!(params.time_signature.as_deref(), Some("4"));
    assert_eq!(
        params.key.as_deref(),
        Some("D major with frequent minor iv coloring")
    );
    assert_eq!(params.duration_seconds, Some(240.0));
}

#[test]
fn test_full_tree_tags() {
    let params = extract(&moments_echo());

    assert_eq!(
        &params.tags[..8],
        [
            "nostalgic",
            "piano-driven",
            "ambient",
            "introspective",
            "lo-fi",
            "nostalgia",
            "warmth",
            "longing"
        ]
    );
    assert!(params.tags.contains(&"dusty rose".to_string()));
    assert!(params.tags.contains(&"foundation".to_string()));
    // Reserved root keys are consumed separately
    assert!(!params
        .tags
        .iter()
        .any(|t| t.starts_with("gentle exploration")));
    // "warm" from Piano characteristics is distinct from "warmth"
    assert!(params.tags.contains(&"warm".to_string()));
}

#[test]
fn test_full_tree_request_params() {
    let params = extract(&moments_echo());
    let request = params.to_request_params(&RequestDefaults::default());

    assert_eq!(request["audio_duration"], 120.0);
    assert_eq!(request["bpm"], 80);
    assert_eq!(request["key_scale"], "D major with frequent minor iv coloring");
    assert_eq!(request["time_signature"], "4");
    assert_eq!(request["lyrics"], params.lyrics.as_str());
}

#[test]
fn test_full_tree_flattens_every_node() {
    let document = moments_echo();
    let flat = flatten(&document);

    assert_eq!(flat.len(), 28);
    assert_eq!(flat.len(), document.node_count());
    assert_eq!(
        flat.get("root/children[5]/children[2]/children[0]").map(|d| d.name),
        Some("Discovery (Intro)")
    );
}

#[test]
fn test_concrete_scenario() {
    let document = Document::from_value(json!({
        "name": "Song",
        "children": [
            {"name": "Title", "value": "Test"},
            {"name": "Instrumentation", "children": [{"name": "Piano"}, {"name": "Strings"}]}
        ]
    }))
    .unwrap();

    let flat = flatten(&document);
    let paths: Vec<&str> = flat.paths().collect();
    assert_eq!(
        paths,
        vec![
            "root",
            "root/children[0]",
            "root/children[1]",
            "root/children[1]/children[0]",
            "root/children[1]/children[1]",
        ]
    );

    let params = extract(&document);
    let piano = params.prompt.find("Piano").unwrap();
    let strings = params.prompt.find("Strings").unwrap();
    assert!(piano < strings);
}

#[test]
fn test_both_document_shapes_extract_identically() {
    let bare = Document::from_value(json!({
        "name": "Song",
        "metadata": {"tags": ["dreamy"]},
        "children": [{"name": "Instrumentation", "children": [{"name": "Synth"}]}]
    }))
    .unwrap();
    let wrapped = Document::from_value(json!({
        "root": {
            "name": "Song",
            "metadata": {"tags": ["dreamy"]},
            "children": [{"name": "Instrumentation", "children": [{"name": "Synth"}]}]
        }
    }))
    .unwrap();

    assert_eq!(extract(&bare), extract(&wrapped));
}

#[test]
fn test_top_level_fields_feed_prompt() {
    let document = Document::from_value(json!({
        "root": {"name": "Song"},
        "title": "Night Drive",
        "genre": "synthwave",
        "tags": ["retro"],
        "duration_seconds": 60.5
    }))
    .unwrap();

    let params = extract(&document);
    assert_eq!(params.prompt, "Night Drive, synthwave, retro");
    assert_eq!(params.duration_seconds, Some(60.5));
}

#[test]
fn test_custom_sentinels() {
    let config = ExtractionConfig {
        instrumentation_names: vec!["Instruments".to_string()],
        emotion_names: vec!["Mood".to_string()],
        max_moods: 1,
        ..Default::default()
    };
    let extractor = ParameterExtractor::new(config);

    let document = Document::from_value(json!({
        "name": "Song",
        "children": [
            {"name": "Mood", "value": ["calm", "bright"]},
            {"name": "instruments", "children": [{"name": "Guitar"}]}
        ]
    }))
    .unwrap();

    let params = extractor.extract(&document);
    assert_eq!(params.prompt, "calm, Guitar");
    assert_eq!(params.lyrics, "[Instrumentation]\nGuitar");
}

#[test]
fn test_extraction_is_byte_identical_across_calls() {
    let document = moments_echo();
    let first = serde_json::to_string(&extract(&document)).unwrap();
    let second = serde_json::to_string(&extract(&document)).unwrap();
    assert_eq!(first, second);
}
