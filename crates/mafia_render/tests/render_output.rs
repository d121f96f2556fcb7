use mafia_core::core_api::{Engine, Session};
use mafia_core::detect::{ProgramCandidate, detect_coord_layout, detect_program};
use mafia_core::garage::GarageCatalog;
use mafia_render::{
    JsonStyle, ProgramReport, TextRenderOptions, render_catalog_json, render_catalog_text,
    render_coord_layout_json, render_coord_layout_text, render_program_json,
    render_program_text, render_session_json, render_session_text,
};
use serde_json::Value;

fn times_session() -> Session {
    let mut raw = 2u32.to_le_bytes().to_vec();
    for (name, a, b) in [("Lost Heaven", 61_500u32, 3u32), ("", 0, 0)] {
        let mut field = [0u8; 32];
        field[..name.len()].copy_from_slice(name.as_bytes());
        raw.extend_from_slice(&field);
        raw.extend_from_slice(&a.to_le_bytes());
        raw.extend_from_slice(&b.to_le_bytes());
    }
    Engine::new()
        .open_bytes(raw, None)
        .expect("fixture should parse")
}

fn keys(value: &Value) -> Vec<&str> {
    value
        .as_object()
        .expect("json should be an object")
        .keys()
        .map(String::as_str)
        .collect()
}

#[test]
fn session_json_uses_canonical_top_level_order() {
    let session = times_session();
    let value = render_session_json(&session, JsonStyle::CanonicalV1);
    assert_eq!(
        keys(&value),
        vec!["format", "raw_size", "modified", "count", "records", "layout"]
    );
    assert_eq!(value["format"], "mr-times");
    assert_eq!(value["records"][0]["name"], "Lost Heaven");
    assert_eq!(value["records"][0]["value_a"], 61_500);
    assert_eq!(value["layout"][1]["section"], "records");
    assert_eq!(value["layout"][1]["end"], 84);
}

#[test]
fn session_text_hides_empty_records_unless_verbose() {
    let session = times_session();
    let text = render_session_text(&session, TextRenderOptions::default());
    assert!(text.contains("Format: mr-times"));
    assert!(text.contains("Lost Heaven"));
    assert!(!text.contains("[ 1]"));
    assert!(!text.contains("Layout:"));

    let verbose = render_session_text(&session, TextRenderOptions { verbose: true });
    assert!(verbose.contains("[ 1]"));
    assert!(verbose.contains("Layout:"));
}

#[test]
fn modified_flag_follows_edits() {
    let mut session = times_session();
    session.set_mr_times_values(1, 5, 6).expect("edit");
    let value = render_session_json(&session, JsonStyle::CanonicalV1);
    assert_eq!(value["modified"], true);
    assert_eq!(value["records"][1]["value_b"], 6);
}

#[test]
fn coord_layout_json_lists_groups_with_values() {
    let mut payload = vec![0u8; 66];
    payload[0] = 3;
    payload[13] = 6;
    payload[14..18].copy_from_slice(&12.5f32.to_le_bytes());
    let layout = detect_coord_layout(&payload);

    let value = render_coord_layout_json(&layout, &payload);
    assert_eq!(
        keys(&value),
        vec!["kind", "payload_len", "groups", "inventory_offset"]
    );
    assert_eq!(value["kind"], "human");
    assert_eq!(value["groups"][1]["capability"], "human_transform");
    assert_eq!(value["groups"][1]["fields"][0]["name"], "position");
    assert_eq!(value["groups"][1]["fields"][0]["value"][0], 12.5);
    assert!(value["inventory_offset"].is_null());

    let text = render_coord_layout_text(&layout, &payload, TextRenderOptions::default());
    assert!(text.contains("[human_combat]"));
    assert!(text.contains("(12.500, 0.000, 0.000)"));
}

#[test]
fn program_json_reports_missing_block() {
    let value = render_program_json(None);
    assert_eq!(value, serde_json::json!({ "found": false }));
    assert!(render_program_text(None, TextRenderOptions::default()).contains("No program"));
}

#[test]
fn program_json_includes_tables() {
    let mut block = vec![0u8; 39];
    block[0] = 2;
    block[19..23].copy_from_slice(&1u32.to_le_bytes());
    block[27..31].copy_from_slice(&1u32.to_le_bytes());
    block.extend_from_slice(&4.0f32.to_le_bytes());
    block.extend_from_slice(&5u32.to_le_bytes());
    block.extend_from_slice(&[0u8; 4]);
    block.extend_from_slice(b"tommy");

    let location = detect_program(&[ProgramCandidate {
        segment: 0,
        name: "payload.bin",
        bytes: &block,
        is_game_payload: true,
    }])
    .expect("program");
    let report = ProgramReport {
        vars: mafia_core::detect::read_program_vars(&block, &location.layout).expect("vars"),
        names: mafia_core::detect::read_program_names(&block, &location.layout),
        location,
    };

    let value = render_program_json(Some(&report));
    assert_eq!(value["found"], true);
    assert_eq!(value["segment_name"], "payload.bin");
    assert_eq!(value["vars"], serde_json::json!([4.0]));
    assert_eq!(value["actors"], serde_json::json!(["tommy"]));

    let text = render_program_text(Some(&report), TextRenderOptions { verbose: true });
    assert!(text.contains("payload.bin (game payload)"));
    assert!(text.contains("tommy"));
}

#[test]
fn embedded_catalog_renders_every_car() {
    let catalog = GarageCatalog::embedded();
    let value = render_catalog_json(&catalog);
    assert_eq!(value["source"], "embedded");
    assert_eq!(value["count"], catalog.len());
    assert_eq!(
        value["cars"].as_array().expect("cars array").len(),
        catalog.len()
    );
    assert_eq!(
        keys(&value["cars"][0]),
        vec![
            "index",
            "code",
            "model",
            "shadow",
            "display_name",
            "race_mask",
            "champ_mask",
            "freeride_mask"
        ]
    );

    let text = render_catalog_text(&catalog, TextRenderOptions::default());
    assert!(text.contains("embedded table"));
    assert_eq!(text.lines().count(), catalog.len() + 3);
}
