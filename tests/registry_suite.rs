//! Preset loading and navigation: manifest files on disk, degraded
//! fallback, and the wrap-around laws.

use pulseviz::manifest::{manifest_to_text, parse_manifest, PresetDef};
use pulseviz::registry::{Bindings, PresetRegistry, PresetSource};
use std::path::PathBuf;

fn temp_manifest(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("pulseviz-{name}-{}.presets", std::process::id()));
    std::fs::write(&path, contents).expect("write temp manifest");
    path
}

#[test]
fn manifest_file_preserves_declared_order() {
    let path = temp_manifest(
        "order",
        "# demo pack\nAlpha|waveform|first\nBeta|plasma|second\nGamma|bars|\n",
    );
    let reg = PresetRegistry::load(PresetSource::File(&path), Bindings::default());
    let names: Vec<&str> = reg.defs().iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["Alpha", "Beta", "Gamma"]);
    assert_eq!(reg.defs()[2].description, "");
    assert!(reg.status().status.starts_with("Ready"));
    let _ = std::fs::remove_file(path);
}

#[test]
fn unreadable_manifest_degrades_to_builtin_presets() {
    let path = PathBuf::from("/nonexistent/never.presets");
    let reg = PresetRegistry::load(PresetSource::File(&path), Bindings::default());
    assert!(reg.len() >= 1);
    assert!(
        reg.status().status.contains("built-in"),
        "status must say the fallback happened: {}",
        reg.status().status
    );
}

#[test]
fn malformed_line_degrades_to_builtin_presets() {
    let path = temp_manifest("broken", "ok|waveform|fine\n|nameless|broken\n");
    let reg = PresetRegistry::load(PresetSource::File(&path), Bindings::default());
    assert!(reg.status().status.contains("built-in"));
    let _ = std::fs::remove_file(path);
}

#[test]
fn manifest_text_round_trips() {
    let defs = vec![
        PresetDef::new("One", "waveform", "a line"),
        PresetDef::new("Two", "collage", ""),
    ];
    let parsed = parse_manifest(&manifest_to_text(&defs)).expect("round trip");
    assert_eq!(parsed, defs);
}

#[test]
fn single_preset_registry_wraps_onto_itself() {
    let mut reg = PresetRegistry::load(
        PresetSource::Supplied(vec![PresetDef::new("only", "plasma", "")]),
        Bindings::default(),
    );
    reg.advance(1);
    assert_eq!(reg.current_index(), 0);
    reg.advance(-1);
    assert_eq!(reg.current_index(), 0);
}

#[test]
fn advance_past_the_end_wraps_to_zero() {
    let defs = (0..3).map(|i| PresetDef::new(&format!("p{i}"), "bars", "")).collect();
    let mut reg = PresetRegistry::load(PresetSource::Supplied(defs), Bindings::default());
    reg.select(2);
    reg.advance(1);
    assert_eq!(reg.current_index(), 0);
    reg.advance(-1);
    assert_eq!(reg.current_index(), 2);
}

#[test]
fn start_query_matches_index_or_name_substring() {
    let defs = vec![
        PresetDef::new("Pulse Wave", "waveform", ""),
        PresetDef::new("Ember Burst", "particles", ""),
        PresetDef::new("Starfall", "starfield", ""),
    ];
    let mut reg = PresetRegistry::load(PresetSource::Supplied(defs), Bindings::default());
    reg.select_by_query("ember");
    assert_eq!(reg.current_index(), 1);
    reg.select_by_query("2");
    assert_eq!(reg.current_index(), 2);
    reg.select_by_query("no such preset");
    assert_eq!(reg.current_index(), 2, "unmatched query leaves selection alone");
}

#[test]
fn builtin_pack_resolves_every_kind() {
    let reg = PresetRegistry::load(PresetSource::Builtin, Bindings::default());
    for def in reg.defs() {
        assert!(
            reg.resolve(&def.kind).is_ok(),
            "built-in preset '{}' has unresolvable kind '{}'",
            def.name,
            def.kind
        );
    }
}
