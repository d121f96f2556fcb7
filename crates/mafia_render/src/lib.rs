use std::fmt::Write as _;

use mafia_core::core_api::{Session, SnapshotDetails};
use mafia_core::detect::{
    ActorKind, Capability, CoordLayout, FieldKind, FieldValue, ProgramLocation, ProgramNames,
};
use mafia_core::garage::{CatalogSource, GarageCarCatalogEntry, GarageCatalog};
use mafia_core::layout::{FileLayout, SectionId};
use mafia_core::segment::MetaFields;
use serde_json::{Map as JsonMap, Value as JsonValue};

const LABEL_WIDTH: usize = 16;
const CODE_COL_WIDTH: usize = 26;
const NAME_COL_WIDTH: usize = 34;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    #[default]
    CanonicalV1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRenderOptions {
    pub verbose: bool,
}

/// Program detection result together with the tables read from the
/// winning segment.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramReport {
    pub location: ProgramLocation,
    pub vars: Vec<f32>,
    pub names: Option<ProgramNames>,
}

pub fn render_session_json(session: &Session, style: JsonStyle) -> JsonValue {
    match style {
        JsonStyle::CanonicalV1 => JsonValue::Object(session_json(session)),
    }
}

pub fn render_session_text(session: &Session, options: TextRenderOptions) -> String {
    let snapshot = session.snapshot();
    let mut out = String::new();

    write_label(&mut out, "Format", &snapshot.format.to_string());
    write_label(&mut out, "Size", &format!("{} bytes", snapshot.raw_size));
    if session.is_modified() {
        write_label(&mut out, "Modified", "yes");
    }

    match &snapshot.details {
        SnapshotDetails::Mission { segments, meta } => {
            if let Some(meta) = meta {
                write_label(&mut out, "Mission", &meta.mission_code);
                write_label(&mut out, "Slot", &meta.slot.to_string());
                write_label(&mut out, "Health", &format!("{}%", meta.hp_percent));
                write_label(
                    &mut out,
                    "Saved",
                    &format!("{:08X} {:08X}", meta.packed_date, meta.packed_time),
                );
            }
            writeln!(&mut out).expect("writing to String cannot fail");
            writeln!(&mut out, "Segments:").expect("writing to String cannot fail");
            for segment in segments {
                let marker = if session.selected_segment() == Some(segment.index) {
                    '*'
                } else {
                    ' '
                };
                writeln!(
                    &mut out,
                    " {marker}[{:>3}] {} {:>8} bytes",
                    segment.index,
                    fit_column(&segment.name, NAME_COL_WIDTH),
                    segment.len
                )
                .expect("writing to String cannot fail");
            }
        }
        SnapshotDetails::Profile { blocks } => {
            writeln!(&mut out).expect("writing to String cannot fail");
            for block in blocks {
                writeln!(
                    &mut out,
                    "  {} {:>4} bytes  first word {:08X}",
                    fit_column(block.block.name(), 10),
                    block.len,
                    block.first_word
                )
                .expect("writing to String cannot fail");
            }
        }
        SnapshotDetails::MrProfile { words } => {
            writeln!(&mut out).expect("writing to String cannot fail");
            for (row, chunk) in words.chunks(4).enumerate() {
                let cells: Vec<String> = chunk.iter().map(|w| format!("{w:08X}")).collect();
                writeln!(&mut out, "  {:>2}: {}", row * 4, cells.join(" "))
                    .expect("writing to String cannot fail");
            }
        }
        SnapshotDetails::MrTimes { count, records } => {
            write_label(&mut out, "Count", &count.to_string());
            writeln!(&mut out).expect("writing to String cannot fail");
            for record in records {
                if !options.verbose && record.name.is_empty() && record.value_a == 0 {
                    continue;
                }
                writeln!(
                    &mut out,
                    "  [{:>2}] {} {:>10} {:>10}",
                    record.index,
                    fit_column(&record.name, NAME_COL_WIDTH),
                    record.value_a,
                    record.value_b
                )
                .expect("writing to String cannot fail");
            }
        }
        SnapshotDetails::MrSeg0 { header, points } => {
            write_label(
                &mut out,
                "Header",
                &format!("{} {} {}", header[0], header[1], header[2]),
            );
            writeln!(&mut out).expect("writing to String cannot fail");
            for (index, p) in points.iter().enumerate() {
                writeln!(
                    &mut out,
                    "  [{index:>3}] {:>12.3} {:>12.3} {:>12.3}",
                    p.x, p.y, p.z
                )
                .expect("writing to String cannot fail");
            }
        }
    }

    if options.verbose
        && let Some(layout) = session.layout()
    {
        writeln!(&mut out).expect("writing to String cannot fail");
        writeln!(&mut out, "Layout:").expect("writing to String cannot fail");
        for section in &layout.sections {
            writeln!(
                &mut out,
                "  {} {:>5}..{:<5} {}",
                fit_column(section_name(section.id), 10),
                section.range.start,
                section.range.end,
                if section.encrypted { "encrypted" } else { "plain" }
            )
            .expect("writing to String cannot fail");
        }
    }

    out
}

pub fn render_coord_layout_json(layout: &CoordLayout, payload: &[u8]) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert(
        "kind".to_string(),
        JsonValue::String(actor_kind_name(layout.kind).to_string()),
    );
    out.insert(
        "payload_len".to_string(),
        JsonValue::from(layout.payload_len),
    );

    let groups = layout
        .groups
        .iter()
        .map(|group| {
            let mut g = JsonMap::new();
            g.insert(
                "capability".to_string(),
                JsonValue::String(capability_name(group.capability).to_string()),
            );
            let fields = group
                .fields
                .iter()
                .map(|field| {
                    let mut f = JsonMap::new();
                    f.insert("name".to_string(), JsonValue::String(field.name.to_string()));
                    f.insert("offset".to_string(), JsonValue::from(field.offset));
                    f.insert(
                        "kind".to_string(),
                        JsonValue::String(field_kind_name(field.kind).to_string()),
                    );
                    f.insert(
                        "value".to_string(),
                        field
                            .read(payload)
                            .map(field_value_to_json)
                            .unwrap_or(JsonValue::Null),
                    );
                    JsonValue::Object(f)
                })
                .collect();
            g.insert("fields".to_string(), JsonValue::Array(fields));
            JsonValue::Object(g)
        })
        .collect();
    out.insert("groups".to_string(), JsonValue::Array(groups));
    out.insert(
        "inventory_offset".to_string(),
        match layout.inventory_offset {
            Some(v) => JsonValue::from(v),
            None => JsonValue::Null,
        },
    );
    JsonValue::Object(out)
}

pub fn render_coord_layout_text(
    layout: &CoordLayout,
    payload: &[u8],
    options: TextRenderOptions,
) -> String {
    let mut out = String::new();
    write_label(&mut out, "Actor", actor_kind_name(layout.kind));
    write_label(&mut out, "Payload", &format!("{} bytes", layout.payload_len));
    if let Some(range) = layout.inventory_range() {
        write_label(
            &mut out,
            "Inventory",
            &format!("{}..{}", range.start, range.end),
        );
    }

    for group in &layout.groups {
        writeln!(&mut out).expect("writing to String cannot fail");
        writeln!(&mut out, "[{}]", capability_name(group.capability))
            .expect("writing to String cannot fail");
        for field in group.fields {
            let value = field
                .read(payload)
                .map(format_field_value)
                .unwrap_or_else(|| "-".to_string());
            if options.verbose {
                writeln!(
                    &mut out,
                    "  {} @{:<4} {:<5} {}",
                    fit_column(field.name, 24),
                    field.offset,
                    field_kind_name(field.kind),
                    value
                )
                .expect("writing to String cannot fail");
            } else {
                writeln!(&mut out, "  {} {}", fit_column(field.name, 24), value)
                    .expect("writing to String cannot fail");
            }
        }
    }
    out
}

pub fn render_program_json(report: Option<&ProgramReport>) -> JsonValue {
    let mut out = JsonMap::new();
    let Some(report) = report else {
        out.insert("found".to_string(), JsonValue::Bool(false));
        return JsonValue::Object(out);
    };
    let location = &report.location;
    let layout = &location.layout;

    out.insert("found".to_string(), JsonValue::Bool(true));
    out.insert("segment".to_string(), JsonValue::from(location.segment));
    out.insert(
        "segment_name".to_string(),
        JsonValue::String(location.segment_name.clone()),
    );
    out.insert(
        "is_game_payload".to_string(),
        JsonValue::Bool(location.is_game_payload),
    );
    out.insert("base_off".to_string(), JsonValue::from(layout.base_off));
    out.insert("vars_off".to_string(), JsonValue::from(layout.vars_off));
    out.insert("reg_count".to_string(), JsonValue::from(layout.reg_count));
    out.insert("var_count".to_string(), JsonValue::from(layout.var_count));
    out.insert(
        "actor_count".to_string(),
        JsonValue::from(layout.actor_count),
    );
    out.insert(
        "frame_count".to_string(),
        JsonValue::from(layout.frame_count),
    );
    out.insert("end_off".to_string(), JsonValue::from(layout.end_off));
    out.insert(
        "vars".to_string(),
        JsonValue::Array(report.vars.iter().map(|&v| JsonValue::from(v)).collect()),
    );
    if let Some(names) = &report.names {
        out.insert("actors".to_string(), strings_to_json(&names.actors));
        out.insert("frames".to_string(), strings_to_json(&names.frames));
    }
    JsonValue::Object(out)
}

pub fn render_program_text(report: Option<&ProgramReport>, options: TextRenderOptions) -> String {
    let mut out = String::new();
    let Some(report) = report else {
        writeln!(&mut out, "No program block found.").expect("writing to String cannot fail");
        return out;
    };
    let location = &report.location;
    let layout = &location.layout;

    let segment = if location.is_game_payload {
        format!("{} (game payload)", location.segment_name)
    } else {
        location.segment_name.clone()
    };
    write_label(&mut out, "Segment", &segment);
    write_label(
        &mut out,
        "Block",
        &format!("{}..{}", layout.base_off, layout.end_off),
    );
    write_label(
        &mut out,
        "Counts",
        &format!(
            "{} regs, {} vars, {} actors, {} frames",
            layout.reg_count, layout.var_count, layout.actor_count, layout.frame_count
        ),
    );

    if !report.vars.is_empty() {
        writeln!(&mut out).expect("writing to String cannot fail");
        writeln!(&mut out, "Variables:").expect("writing to String cannot fail");
        for (index, value) in report.vars.iter().enumerate() {
            if !options.verbose && *value == 0.0 {
                continue;
            }
            writeln!(&mut out, "  [{index:>4}] {value}").expect("writing to String cannot fail");
        }
    }

    if options.verbose
        && let Some(names) = &report.names
    {
        writeln!(&mut out).expect("writing to String cannot fail");
        writeln!(&mut out, "Actors:").expect("writing to String cannot fail");
        for name in &names.actors {
            writeln!(&mut out, "  {name}").expect("writing to String cannot fail");
        }
        writeln!(&mut out, "Frames:").expect("writing to String cannot fail");
        for name in &names.frames {
            writeln!(&mut out, "  {name}").expect("writing to String cannot fail");
        }
    }
    out
}

pub fn render_catalog_json(catalog: &GarageCatalog) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert("source".to_string(), catalog_source_json(catalog.source()));
    out.insert("count".to_string(), JsonValue::from(catalog.len()));
    out.insert(
        "cars".to_string(),
        JsonValue::Array(catalog.entries().iter().map(catalog_entry_to_json).collect()),
    );
    JsonValue::Object(out)
}

pub fn render_catalog_text(catalog: &GarageCatalog, options: TextRenderOptions) -> String {
    let mut out = String::new();
    let source = match catalog.source() {
        CatalogSource::File(path) => path.display().to_string(),
        CatalogSource::Embedded => "embedded table".to_string(),
    };
    write_label(&mut out, "Source", &source);
    write_label(&mut out, "Cars", &catalog.len().to_string());
    writeln!(&mut out).expect("writing to String cannot fail");

    for entry in catalog.entries() {
        let mut line = format!(
            "  {:>3} {} {}",
            entry.index,
            fit_column(&entry.code, CODE_COL_WIDTH),
            fit_column(&entry.display_name, NAME_COL_WIDTH)
        );
        if options.verbose {
            line.push_str(&entry.model);
            if entry.masks_known {
                write!(
                    &mut line,
                    "  race={:08X} champ={:08X} free={:08X}",
                    entry.race_mask, entry.champ_mask, entry.freeride_mask
                )
                .expect("writing to String cannot fail");
            }
        }
        writeln!(&mut out, "{}", line.trim_end()).expect("writing to String cannot fail");
    }
    out
}

fn session_json(session: &Session) -> JsonMap<String, JsonValue> {
    let snapshot = session.snapshot();
    let mut out = JsonMap::new();

    out.insert(
        "format".to_string(),
        JsonValue::String(snapshot.format.to_string()),
    );
    out.insert("raw_size".to_string(), JsonValue::from(snapshot.raw_size));
    out.insert(
        "modified".to_string(),
        JsonValue::Bool(session.is_modified()),
    );

    match &snapshot.details {
        SnapshotDetails::Mission { segments, meta } => {
            out.insert(
                "selected_segment".to_string(),
                match session.selected_segment() {
                    Some(v) => JsonValue::from(v),
                    None => JsonValue::Null,
                },
            );
            out.insert(
                "meta".to_string(),
                meta.as_ref().map(meta_to_json).unwrap_or(JsonValue::Null),
            );
            let segments = segments
                .iter()
                .map(|s| {
                    let mut m = JsonMap::new();
                    m.insert("index".to_string(), JsonValue::from(s.index));
                    m.insert("name".to_string(), JsonValue::String(s.name.clone()));
                    m.insert("len".to_string(), JsonValue::from(s.len));
                    JsonValue::Object(m)
                })
                .collect();
            out.insert("segments".to_string(), JsonValue::Array(segments));
        }
        SnapshotDetails::Profile { blocks } => {
            let blocks = blocks
                .iter()
                .map(|b| {
                    let mut m = JsonMap::new();
                    m.insert(
                        "block".to_string(),
                        JsonValue::String(b.block.name().to_string()),
                    );
                    m.insert("len".to_string(), JsonValue::from(b.len));
                    m.insert("first_word".to_string(), JsonValue::from(b.first_word));
                    JsonValue::Object(m)
                })
                .collect();
            out.insert("blocks".to_string(), JsonValue::Array(blocks));
        }
        SnapshotDetails::MrProfile { words } => {
            out.insert(
                "words".to_string(),
                JsonValue::Array(words.iter().map(|&w| JsonValue::from(w)).collect()),
            );
        }
        SnapshotDetails::MrTimes { count, records } => {
            out.insert("count".to_string(), JsonValue::from(*count));
            let records = records
                .iter()
                .map(|r| {
                    let mut m = JsonMap::new();
                    m.insert("index".to_string(), JsonValue::from(r.index));
                    m.insert("name".to_string(), JsonValue::String(r.name.clone()));
                    m.insert("value_a".to_string(), JsonValue::from(r.value_a));
                    m.insert("value_b".to_string(), JsonValue::from(r.value_b));
                    JsonValue::Object(m)
                })
                .collect();
            out.insert("records".to_string(), JsonValue::Array(records));
        }
        SnapshotDetails::MrSeg0 { header, points } => {
            out.insert(
                "header".to_string(),
                JsonValue::Array(header.iter().map(|&h| JsonValue::from(h)).collect()),
            );
            let points = points
                .iter()
                .map(|p| {
                    JsonValue::Array(vec![
                        JsonValue::from(p.x),
                        JsonValue::from(p.y),
                        JsonValue::from(p.z),
                    ])
                })
                .collect();
            out.insert("points".to_string(), JsonValue::Array(points));
        }
    }

    out.insert(
        "layout".to_string(),
        session
            .layout()
            .as_ref()
            .map(layout_to_json)
            .unwrap_or(JsonValue::Null),
    );
    out
}

fn layout_to_json(layout: &FileLayout) -> JsonValue {
    JsonValue::Array(
        layout
            .sections
            .iter()
            .map(|s| {
                let mut m = JsonMap::new();
                m.insert(
                    "section".to_string(),
                    JsonValue::String(section_name(s.id).to_string()),
                );
                m.insert("start".to_string(), JsonValue::from(s.range.start));
                m.insert("end".to_string(), JsonValue::from(s.range.end));
                m.insert("encrypted".to_string(), JsonValue::Bool(s.encrypted));
                JsonValue::Object(m)
            })
            .collect(),
    )
}

fn meta_to_json(meta: &MetaFields) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert(
        "mission_code".to_string(),
        JsonValue::String(meta.mission_code.clone()),
    );
    m.insert("slot".to_string(), JsonValue::from(meta.slot));
    m.insert("hp_percent".to_string(), JsonValue::from(meta.hp_percent));
    m.insert("packed_date".to_string(), JsonValue::from(meta.packed_date));
    m.insert("packed_time".to_string(), JsonValue::from(meta.packed_time));
    JsonValue::Object(m)
}

fn catalog_source_json(source: &CatalogSource) -> JsonValue {
    match source {
        CatalogSource::File(path) => JsonValue::String(path.display().to_string()),
        CatalogSource::Embedded => JsonValue::String("embedded".to_string()),
    }
}

fn catalog_entry_to_json(e: &GarageCarCatalogEntry) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("index".to_string(), JsonValue::from(e.index));
    m.insert("code".to_string(), JsonValue::String(e.code.clone()));
    m.insert("model".to_string(), JsonValue::String(e.model.clone()));
    m.insert("shadow".to_string(), JsonValue::String(e.shadow.clone()));
    m.insert(
        "display_name".to_string(),
        JsonValue::String(e.display_name.clone()),
    );
    if e.masks_known {
        m.insert("race_mask".to_string(), JsonValue::from(e.race_mask));
        m.insert("champ_mask".to_string(), JsonValue::from(e.champ_mask));
        m.insert("freeride_mask".to_string(), JsonValue::from(e.freeride_mask));
    } else {
        m.insert("race_mask".to_string(), JsonValue::Null);
        m.insert("champ_mask".to_string(), JsonValue::Null);
        m.insert("freeride_mask".to_string(), JsonValue::Null);
    }
    JsonValue::Object(m)
}

fn strings_to_json(values: &[String]) -> JsonValue {
    JsonValue::Array(values.iter().cloned().map(JsonValue::String).collect())
}

fn field_value_to_json(value: FieldValue) -> JsonValue {
    let floats = |vs: &[f32]| JsonValue::Array(vs.iter().map(|&v| JsonValue::from(v)).collect());
    match value {
        FieldValue::U8(v) => JsonValue::from(v),
        FieldValue::U32(v) => JsonValue::from(v),
        FieldValue::F32(v) => JsonValue::from(v),
        FieldValue::Vec3(vs) => floats(&vs),
        FieldValue::Quat(vs) => floats(&vs),
    }
}

fn format_field_value(value: FieldValue) -> String {
    let join = |vs: &[f32]| {
        vs.iter()
            .map(|v| format!("{v:.3}"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    match value {
        FieldValue::U8(v) => v.to_string(),
        FieldValue::U32(v) => v.to_string(),
        FieldValue::F32(v) => format!("{v:.3}"),
        FieldValue::Vec3(vs) => format!("({})", join(&vs)),
        FieldValue::Quat(vs) => format!("({})", join(&vs)),
    }
}

fn actor_kind_name(kind: ActorKind) -> &'static str {
    match kind {
        ActorKind::Unknown => "unknown",
        ActorKind::BaseOnly => "base",
        ActorKind::Human => "human",
        ActorKind::Car => "car",
    }
}

fn capability_name(capability: Capability) -> &'static str {
    match capability {
        Capability::Base => "base",
        Capability::HumanTransform => "human_transform",
        Capability::HumanCombat => "human_combat",
        Capability::HumanHealth => "human_health",
        Capability::HumanProperties => "human_properties",
        Capability::HumanInventory => "human_inventory",
        Capability::CarTransform => "car_transform",
        Capability::CarEngine => "car_engine",
        Capability::CarGears => "car_gears",
        Capability::CarEngineFlags => "car_engine_flags",
        Capability::CarOdometer => "car_odometer",
    }
}

fn field_kind_name(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::U8 => "u8",
        FieldKind::U32 => "u32",
        FieldKind::F32 => "f32",
        FieldKind::Vec3 => "vec3",
        FieldKind::Quat => "quat",
    }
}

fn section_name(id: SectionId) -> &'static str {
    match id {
        SectionId::FileHeader => "header",
        SectionId::Core => "core",
        SectionId::Block720 => "block720",
        SectionId::Block92 => "block92",
        SectionId::Block156 => "block156",
        SectionId::Words => "words",
        SectionId::Count => "count",
        SectionId::Headers => "headers",
        SectionId::Records => "records",
        SectionId::Points => "points",
    }
}

fn write_label(out: &mut String, label: &str, value: &str) {
    writeln!(out, "{:>width$}: {value}", label, width = LABEL_WIDTH)
        .expect("writing to String cannot fail");
}

fn fit_column(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return format!("{value:<width$}");
    }
    if width <= 3 {
        return value.chars().take(width).collect();
    }

    let mut out = String::with_capacity(width);
    for ch in value.chars().take(width - 3) {
        out.push(ch);
    }
    out.push_str("...");
    out
}
