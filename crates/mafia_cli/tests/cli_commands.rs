use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

use mafia_core::garage::CATALOG_RECORD_SIZE;
use serde_json::Value;

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mafia-se"))
        .args(args)
        .env_remove("MAFIA_GAME_DIR")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run mafia-se CLI")
}

fn temp_path(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}_{}_{}", std::process::id(), nanos))
}

fn write_fixture(prefix: &str, bytes: &[u8]) -> PathBuf {
    let path = temp_path(prefix);
    fs::write(&path, bytes).expect("write fixture");
    path
}

fn path_arg(path: &PathBuf) -> String {
    path.to_string_lossy().to_string()
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn mr_times_bytes() -> Vec<u8> {
    let mut raw = 2u32.to_le_bytes().to_vec();
    for (name, a, b) in [("Lost Heaven", 61_500u32, 3u32), ("Salieri", 0, 0)] {
        let mut field = [0u8; 32];
        field[..name.len()].copy_from_slice(name.as_bytes());
        raw.extend_from_slice(&field);
        raw.extend_from_slice(&a.to_le_bytes());
        raw.extend_from_slice(&b.to_le_bytes());
    }
    raw
}

fn program_block(var_count: u32, actors: &[&str]) -> Vec<u8> {
    let mut block = vec![0u8; 39];
    block[0] = 2;
    block[19..23].copy_from_slice(&var_count.to_le_bytes());
    block[27..31].copy_from_slice(&(actors.len() as u32).to_le_bytes());
    for i in 0..var_count {
        block.extend_from_slice(&(i as f32 + 0.5).to_le_bytes());
    }
    for name in actors {
        block.extend_from_slice(&(name.len() as u32).to_le_bytes());
        block.extend_from_slice(&[0u8; 4]);
        block.extend_from_slice(name.as_bytes());
    }
    block
}

fn letter_tag(i: usize) -> String {
    let first = char::from(b'A' + (i / 26) as u8);
    let second = char::from(b'A' + (i % 26) as u8);
    format!("{first}{second}")
}

fn catalog_bytes(count: usize) -> Vec<u8> {
    (0..count)
        .flat_map(|i| {
            let mut rec = vec![0u8; CATALOG_RECORD_SIZE];
            let fields = [
                (0, format!("test_{i:02}")),
                (32, format!("test_{i:02}.i3d")),
                (64, format!("test_{i:02}_s.i3d")),
                (96, format!("Test Car {}", letter_tag(i))),
            ];
            for (offset, text) in fields {
                rec[offset..offset + text.len()].copy_from_slice(text.as_bytes());
            }
            rec
        })
        .collect()
}

#[test]
fn info_detects_mr_profile_from_size() {
    let path = write_fixture("mafia_se_info_profile", &[0u8; 136]);
    let output = run_cli(&["info", &path_arg(&path)]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Format: mr-profile"));
    let _ = fs::remove_file(&path);
}

#[test]
fn info_json_lists_mr_times_records() {
    let path = write_fixture("mafia_se_info_times", &mr_times_bytes());
    let output = run_cli(&["info", "--json", &path_arg(&path)]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["format"], "mr-times");
    assert_eq!(json["count"], 2);
    assert_eq!(json["records"][0]["name"], "Lost Heaven");
    assert_eq!(json["modified"], false);
    let _ = fs::remove_file(&path);
}

#[test]
fn info_format_hint_overrides_cascade() {
    let path = write_fixture("mafia_se_info_hint", &[0u8; 84]);
    let plain = stdout_json(&run_cli(&["info", "--json", &path_arg(&path)]));
    assert_eq!(plain["format"], "mr-times");

    let hinted = run_cli(&["info", "--json", "--format", "mr-seg0", &path_arg(&path)]);
    assert!(hinted.status.success());
    let hinted = stdout_json(&hinted);
    assert_eq!(hinted["format"], "mr-seg0");
    assert_eq!(hinted["points"].as_array().expect("points").len(), 6);
    let _ = fs::remove_file(&path);
}

#[test]
fn info_reports_every_failed_format() {
    let path = write_fixture("mafia_se_info_garbage", b"junk!");
    let output = run_cli(&["info", &path_arg(&path)]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no save format matched"));
    assert!(stderr.contains("mr-seg0"));
    let _ = fs::remove_file(&path);
}

#[test]
fn edit_writes_mr_profile_word_and_keeps_input() {
    let input = write_fixture("mafia_se_edit_in", &[0u8; 136]);
    let output_path = temp_path("mafia_se_edit_out");
    let output = run_cli(&[
        "edit",
        &path_arg(&input),
        "--output",
        &path_arg(&output_path),
        "--set-word",
        "3=0x2A",
        "--set-word",
        "33=7",
    ]);
    assert!(output.status.success(), "{:?}", output);

    let edited = fs::read(&output_path).expect("read edited output");
    assert_eq!(edited.len(), 136);
    assert_eq!(&edited[12..16], &42u32.to_le_bytes());
    assert_eq!(&edited[132..136], &7u32.to_le_bytes());
    assert_eq!(fs::read(&input).expect("read input"), vec![0u8; 136]);

    let _ = fs::remove_file(&input);
    let _ = fs::remove_file(&output_path);
}

#[test]
fn edit_updates_times_and_points() {
    let times = write_fixture("mafia_se_edit_times", &mr_times_bytes());
    let times_out = temp_path("mafia_se_edit_times_out");
    let output = run_cli(&[
        "--json",
        "edit",
        &path_arg(&times),
        "--output",
        &path_arg(&times_out),
        "--set-times",
        "1=100,2",
        "--set-name",
        "1=Sam",
    ]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["modified"], true);
    assert_eq!(json["records"][1]["name"], "Sam");
    assert_eq!(json["records"][1]["value_a"], 100);

    let seg0 = write_fixture("mafia_se_edit_seg0", &[0u8; 36]);
    let seg0_out = temp_path("mafia_se_edit_seg0_out");
    let output = run_cli(&[
        "edit",
        &path_arg(&seg0),
        "--format",
        "mr-seg0",
        "--output",
        &path_arg(&seg0_out),
        "--set-point",
        "1=-1.5,2,3",
    ]);
    assert!(output.status.success());
    let edited = fs::read(&seg0_out).expect("read edited seg0");
    assert_eq!(&edited[24..28], &(-1.5f32).to_le_bytes());
    assert_eq!(&edited[32..36], &3.0f32.to_le_bytes());

    for path in [times, times_out, seg0, seg0_out] {
        let _ = fs::remove_file(path);
    }
}

#[test]
fn edit_without_changes_is_a_usage_error() {
    let input = write_fixture("mafia_se_edit_none", &[0u8; 136]);
    let output_path = temp_path("mafia_se_edit_none_out");
    let output = run_cli(&[
        "edit",
        &path_arg(&input),
        "--output",
        &path_arg(&output_path),
    ]);
    assert_eq!(output.status.code(), Some(2));
    assert!(!output_path.exists());
    let _ = fs::remove_file(&input);
}

#[test]
fn edit_out_of_range_fails_without_writing() {
    let input = write_fixture("mafia_se_edit_range", &[0u8; 136]);
    let output_path = temp_path("mafia_se_edit_range_out");
    let output = run_cli(&[
        "edit",
        &path_arg(&input),
        "--output",
        &path_arg(&output_path),
        "--set-word",
        "34=1",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Overrun"));
    assert!(!output_path.exists());
    let _ = fs::remove_file(&input);
}

#[test]
fn edit_rejects_malformed_values() {
    let input = write_fixture("mafia_se_edit_bad", &[0u8; 136]);
    let output = run_cli(&[
        "edit",
        &path_arg(&input),
        "--output",
        "unused.bin",
        "--set-word",
        "three=1",
    ]);
    assert_eq!(output.status.code(), Some(2));
    let _ = fs::remove_file(&input);
}

#[test]
fn actor_reports_human_groups() {
    let mut payload = vec![0u8; 66];
    payload[0] = 3;
    payload[13] = 6;
    let path = write_fixture("mafia_se_actor_human", &payload);

    let output = run_cli(&["actor", &path_arg(&path)]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[human_transform]"));
    assert!(stdout.contains("[human_combat]"));
    assert!(!stdout.contains("[human_health]"));
    let _ = fs::remove_file(&path);
}

#[test]
fn actor_json_reports_car_kind() {
    let mut payload = vec![0u8; 49];
    payload[0] = 3;
    payload[13] = 9;
    let path = write_fixture("mafia_se_actor_car", &payload);

    let output = run_cli(&["actor", "--json", &path_arg(&path)]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["kind"], "car");
    assert_eq!(json["payload_len"], 49);
    let _ = fs::remove_file(&path);
}

#[test]
fn program_picks_block_with_most_variables() {
    let small = write_fixture("mafia_se_program_small", &program_block(1, &["tommy"]));
    let mut padded = vec![0xEEu8; 10];
    padded.extend_from_slice(&program_block(3, &["paulie", "sam"]));
    let large = write_fixture("mafia_se_program_large", &padded);

    let output = run_cli(&[
        "program",
        "--json",
        "--game-payload",
        "0",
        &path_arg(&small),
        &path_arg(&large),
    ]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["found"], true);
    assert_eq!(json["segment"], 1);
    assert_eq!(json["is_game_payload"], false);
    assert_eq!(json["base_off"], 10);
    assert_eq!(json["vars"], serde_json::json!([0.5, 1.5, 2.5]));
    assert_eq!(json["actors"], serde_json::json!(["paulie", "sam"]));

    let _ = fs::remove_file(&small);
    let _ = fs::remove_file(&large);
}

#[test]
fn program_reports_missing_block() {
    let path = write_fixture("mafia_se_program_none", &[0u8; 64]);
    let output = run_cli(&["program", &path_arg(&path)]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No program block found."));
    let _ = fs::remove_file(&path);
}

#[test]
fn garage_falls_back_to_embedded_table() {
    let dir = temp_path("mafia_se_garage_empty");
    fs::create_dir_all(&dir).expect("create game dir");

    let output = Command::new(env!("CARGO_BIN_EXE_mafia-se"))
        .args(["garage", "--json"])
        .env("MAFIA_GAME_DIR", &dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run mafia-se CLI");
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["source"], "embedded");
    assert!(json["count"].as_u64().expect("count") >= 80);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn garage_reads_explicit_catalog() {
    let path = write_fixture("mafia_se_garage_catalog", &catalog_bytes(21));
    let output = run_cli(&["garage", "--catalog", &path_arg(&path)]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Test Car AU"));
    assert_eq!(stdout.lines().count(), 21 + 3);
    let _ = fs::remove_file(&path);
}

#[test]
fn garage_missing_catalog_fails() {
    let path = temp_path("mafia_se_garage_missing");
    let output = run_cli(&["garage", "--catalog", &path_arg(&path)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error loading catalog"));
}
