use std::sync::Arc;

use mafia_core::core_api::{CoreError, CoreErrorCode, Engine, SaveFormat, SnapshotDetails};
use mafia_core::detect::{ActorKind, Capability, FieldValue};
use mafia_core::profile::ProfileBlock;
use mafia_core::reader::read_u32_le;
use mafia_core::segment::{MetaFields, MissionCodec, SaveData, Segment};
use mafia_core::variants::MrSeg0Point;

/// Minimal stand-in container: `MSAV`, a u32 segment count, then per segment
/// a u8 name length, the name, a u32 body length and the body.
#[derive(Debug)]
struct TestContainer;

const CONTAINER_MAGIC: &[u8; 4] = b"MSAV";

impl MissionCodec for TestContainer {
    fn parse(&self, raw: &[u8]) -> Result<SaveData, CoreError> {
        let bad = |msg: &str| CoreError::new(CoreErrorCode::Rejected, msg);
        if raw.get(..4) != Some(&CONTAINER_MAGIC[..]) {
            return Err(bad("missing MSAV magic"));
        }
        let count = read_u32_le(raw, 4).ok_or_else(|| bad("no segment count"))?;
        let mut pos = 8usize;
        let mut save = SaveData::default();
        for index in 0..count as usize {
            let name_len = *raw.get(pos).ok_or_else(|| bad("truncated name"))? as usize;
            let name = raw
                .get(pos + 1..pos + 1 + name_len)
                .ok_or_else(|| bad("truncated name"))?;
            let name = String::from_utf8_lossy(name).into_owned();
            pos += 1 + name_len;
            let len = read_u32_le(raw, pos).ok_or_else(|| bad("truncated length"))? as usize;
            let body = raw
                .get(pos + 4..pos + 4 + len)
                .ok_or_else(|| bad("truncated body"))?;
            pos += 4 + len;
            match name.as_str() {
                "meta" => save.idx_meta = Some(index),
                "game_payload" => save.idx_game_payload = Some(index),
                "ai_groups" => save.idx_ai_groups = Some(index),
                "ai_follow" => save.idx_ai_follow = Some(index),
                _ => {}
            }
            save.segments.push(Segment::new(name, body.to_vec()));
        }
        if pos != raw.len() {
            return Err(bad("trailing bytes after last segment"));
        }
        Ok(save)
    }

    fn build(&self, save: &SaveData) -> Result<Vec<u8>, CoreError> {
        let mut raw = CONTAINER_MAGIC.to_vec();
        raw.extend_from_slice(&(save.segments.len() as u32).to_le_bytes());
        for segment in &save.segments {
            raw.push(segment.name.len() as u8);
            raw.extend_from_slice(segment.name.as_bytes());
            raw.extend_from_slice(&(segment.plain.len() as u32).to_le_bytes());
            raw.extend_from_slice(&segment.plain);
        }
        Ok(raw)
    }

    fn read_meta_fields(&self, save: &SaveData) -> Option<MetaFields> {
        let meta = &save.segments[save.idx_meta?].plain;
        Some(MetaFields {
            hp_percent: read_u32_le(meta, 0)?,
            packed_date: read_u32_le(meta, 4)?,
            packed_time: read_u32_le(meta, 8)?,
            slot: read_u32_le(meta, 12)?,
            mission_code: "mise01".to_string(),
        })
    }
}

fn container(segments: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let save = SaveData {
        segments: segments
            .iter()
            .map(|(name, plain)| Segment::new(*name, plain.clone()))
            .collect(),
        ..SaveData::default()
    };
    TestContainer.build(&save).expect("build container")
}

fn engine() -> Engine {
    Engine::with_mission_codec(Arc::new(TestContainer))
}

fn program_block(var_count: u32, actors: &[&str], frames: &[&str]) -> Vec<u8> {
    let mut block = vec![0u8; 39];
    block[0] = 2;
    block[19..23].copy_from_slice(&var_count.to_le_bytes());
    block[23..27].copy_from_slice(&(frames.len() as u32).to_le_bytes());
    block[27..31].copy_from_slice(&(actors.len() as u32).to_le_bytes());
    block.extend(std::iter::repeat_n(0u8, var_count as usize * 4));
    for name in actors {
        block.extend_from_slice(&(name.len() as u32).to_le_bytes());
        block.extend_from_slice(&[0u8; 4]);
        block.extend_from_slice(name.as_bytes());
    }
    for name in frames {
        block.extend_from_slice(&(name.len() as u16).to_le_bytes());
        block.extend_from_slice(name.as_bytes());
    }
    block
}

fn human_payload(len: usize) -> Vec<u8> {
    let mut payload = vec![0u8; len];
    payload[0] = 3;
    payload[13] = 6;
    payload
}

#[test]
fn mission_parser_runs_before_mr_profile() {
    let body_len = 136 - 4 - 4 - 1 - 1 - 4;
    let raw = container(&[("x", vec![0x11; body_len])]);
    assert_eq!(raw.len(), 136);

    let session = engine().open_bytes(&raw, None).expect("open");
    assert_eq!(session.format(), SaveFormat::Mission);

    let session = Engine::new().open_bytes(&raw, None).expect("open without codec");
    assert_eq!(session.format(), SaveFormat::MrProfile);
}

#[test]
fn buffer_valid_for_two_variants_takes_the_earlier_one() {
    // 84 = 4 + 40*2 = 12 + 12*6
    let session = engine().open_bytes([0u8; 84], None).expect("open");
    assert_eq!(session.format(), SaveFormat::MrTimes);

    let session = engine()
        .open_bytes([0u8; 84], Some(SaveFormat::MrSeg0))
        .expect("forced seg0");
    assert_eq!(session.format(), SaveFormat::MrSeg0);
}

#[test]
fn cascade_failure_lists_every_reason() {
    let err = engine().open_bytes([0u8; 10], None).expect_err("nothing fits");
    assert_eq!(err.code, CoreErrorCode::NoViableCandidate);
    for format in SaveFormat::CASCADE {
        assert!(
            err.message.contains(&format!("{format}: ")),
            "missing {format} in {}",
            err.message
        );
    }
    assert!(err.message.contains("missing MSAV magic"));
    assert!(err.message.contains("1076"));
}

#[test]
fn hinted_failure_keeps_the_variant_code() {
    let err = engine()
        .open_bytes([0u8; 100], Some(SaveFormat::MrProfile))
        .expect_err("wrong size");
    assert_eq!(err.code, CoreErrorCode::SizeMismatch);
    assert!(err.message.starts_with("failed to parse as mr-profile"));
}

#[test]
fn unmodified_output_is_the_input() {
    let raw = container(&[("meta", vec![1; 16]), ("game_payload", vec![9; 20])]);
    let session = engine().open_bytes(&raw, None).expect("open");
    assert_eq!(session.to_bytes_unmodified(), raw);
    assert_eq!(session.to_bytes_modified().expect("rebuild"), raw);
    assert!(!session.is_modified());
}

#[test]
fn snapshot_lists_segments_and_meta() {
    let mut meta = Vec::new();
    for word in [75u32, 0x1942_0301, 0x0000_0C1E, 3] {
        meta.extend_from_slice(&word.to_le_bytes());
    }
    let raw = container(&[("meta", meta), ("game_payload", vec![0; 8])]);
    let session = engine().open_bytes(&raw, None).expect("open");

    let snapshot = session.snapshot();
    assert_eq!(snapshot.raw_size, raw.len());
    let SnapshotDetails::Mission { segments, meta } = snapshot.details else {
        panic!("expected mission details");
    };
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[1].name, "game_payload");
    assert_eq!(segments[1].len, 8);
    let meta = meta.expect("meta fields");
    assert_eq!(meta.hp_percent, 75);
    assert_eq!(meta.slot, 3);
}

#[test]
fn game_payload_is_selected_on_open() {
    let raw = container(&[("meta", vec![0; 16]), ("game_payload", human_payload(66))]);
    let mut session = engine().open_bytes(&raw, None).expect("open");
    assert_eq!(session.selected_segment(), Some(1));

    let layout = session.coord_layout().expect("layout");
    assert_eq!(layout.kind, ActorKind::Human);
    assert!(layout.supports(Capability::HumanCombat));
    assert!(!layout.supports(Capability::HumanHealth));

    session.select_segment(0).expect("select meta");
    assert_eq!(
        session.coord_layout().expect("layout").kind,
        ActorKind::Unknown
    );
    assert_eq!(
        session.select_segment(2).expect_err("out of range").code,
        CoreErrorCode::Overrun
    );
}

#[test]
fn actor_field_edits_go_through_the_container() {
    let raw = container(&[("game_payload", human_payload(229))]);
    let mut session = engine().open_bytes(&raw, None).expect("open");

    session
        .set_actor_field("max_health", FieldValue::F32(200.0))
        .expect("health group present");
    session
        .set_actor_field("position", FieldValue::Vec3([1.0, 2.0, 3.0]))
        .expect("transform present");

    let err = session
        .set_actor_field("strength", FieldValue::F32(1.0))
        .expect_err("properties need 357 bytes");
    assert_eq!(err.code, CoreErrorCode::UnsupportedOperation);
    let err = session
        .set_actor_field("max_health", FieldValue::U32(1))
        .expect_err("kind mismatch");
    assert_eq!(err.code, CoreErrorCode::Rejected);

    let rebuilt = session.to_bytes_modified().expect("rebuild");
    let reopened = engine().open_bytes(&rebuilt, None).expect("reopen");
    let layout = reopened.coord_layout().expect("layout");
    let payload = reopened.selected_payload().expect("payload");
    assert_eq!(
        layout.field("max_health").expect("field").read(payload),
        Some(FieldValue::F32(200.0))
    );
    assert_eq!(
        layout.field("position").expect("field").read(payload),
        Some(FieldValue::Vec3([1.0, 2.0, 3.0]))
    );
}

#[test]
fn program_with_more_actors_wins_the_tie() {
    let mut ai = vec![0xEEu8; 6];
    ai.extend(program_block(5, &["tommy", "paulie"], &["f0"]));
    let mut payload = vec![0xEEu8; 10];
    payload.extend(program_block(
        5,
        &["tommy", "paulie", "sam", "salieri", "frank", "vincenzo", "ralph"],
        &["f0"],
    ));

    let raw = container(&[("ai_groups", ai), ("car_payload", payload)]);
    let mut session = engine().open_bytes(&raw, None).expect("open");

    let location = session.detect_program().expect("program");
    assert_eq!(location.segment, 1);
    assert_eq!(location.segment_name, "car_payload");
    assert_eq!(location.layout.base_off, 10);
    assert_eq!(location.layout.var_count, 5);
    assert_eq!(location.layout.actor_count, 7);

    session.set_program_var(4, 12.5).expect("write var");
    assert_eq!(
        session.program_vars().expect("vars"),
        vec![0.0, 0.0, 0.0, 0.0, 12.5]
    );
    assert_eq!(
        session.set_program_var(5, 1.0).expect_err("past table").code,
        CoreErrorCode::Rejected
    );
}

#[test]
fn session_without_program_reports_none() {
    let raw = container(&[("game_payload", vec![0xEE; 64])]);
    let mut session = engine().open_bytes(&raw, None).expect("open");
    assert!(session.detect_program().is_none());
    assert_eq!(
        session.set_program_var(0, 1.0).expect_err("no block").code,
        CoreErrorCode::NoViableCandidate
    );
}

#[test]
fn replace_segment_changes_the_rebuilt_file() {
    let raw = container(&[("game_payload", vec![1, 2, 3])]);
    let mut session = engine().open_bytes(&raw, None).expect("open");
    session
        .replace_segment(0, vec![4, 5, 6, 7])
        .expect("replace");
    assert!(session.is_modified());

    let rebuilt = session.to_bytes_modified().expect("rebuild");
    assert_ne!(rebuilt, raw);
    let reopened = engine().open_bytes(&rebuilt, None).expect("reopen");
    assert_eq!(reopened.selected_payload(), Some(&[4u8, 5, 6, 7][..]));
    assert_eq!(session.to_bytes_unmodified(), raw);
}

#[test]
fn variant_edits_round_trip() {
    let mut session = engine().open_bytes([0u8; 84], None).expect("mr-times");
    session.set_mr_times_values(1, 61_000, 4).expect("values");
    session.set_mr_times_name(0, "Race 1").expect("name");
    let raw = session.to_bytes_modified().expect("build");
    let reopened = engine().open_bytes(&raw, None).expect("reopen");
    let times = reopened.mr_times().expect("still mr-times");
    assert_eq!(times.records[0].name(), "Race 1");
    assert_eq!(times.records[1].value_a, 61_000);
    assert_eq!(
        session.set_mr_times_values(2, 0, 0).expect_err("two records").code,
        CoreErrorCode::Overrun
    );

    let mut session = engine()
        .open_bytes([0u8; 36], None)
        .expect("mr-seg0");
    let point = MrSeg0Point {
        x: 1.5,
        y: -2.0,
        z: 8.0,
    };
    session.set_mr_seg0_point(1, point).expect("point");
    let raw = session.to_bytes_modified().expect("build");
    assert_eq!(&raw[24..28], &1.5f32.to_le_bytes());

    let mut session = engine().open_bytes([0u8; 136], None).expect("mr-profile");
    session.set_mr_profile_word(33, 0xABCD).expect("last word");
    let raw = session.to_bytes_modified().expect("build");
    assert_eq!(read_u32_le(&raw, 132), Some(0xABCD));
}

#[test]
fn mission_only_operations_reject_other_formats() {
    let mut session = engine().open_bytes([0u8; 136], None).expect("mr-profile");
    assert!(session.coord_layout().is_none());
    assert!(session.detect_program().is_none());
    assert!(session.meta_fields().is_none());
    assert!(session.layout().is_some());
    assert_eq!(
        session.replace_segment(0, Vec::new()).expect_err("no segments").code,
        CoreErrorCode::UnsupportedOperation
    );
    assert_eq!(
        session
            .set_profile_u32(ProfileBlock::Block92, 0, 1)
            .expect_err("not a profile")
            .code,
        CoreErrorCode::UnsupportedOperation
    );
}
