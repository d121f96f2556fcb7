//! Field layout detection for actor payload blobs.
//!
//! A payload starts with a 13-byte actor header (marker byte 3), then a
//! subtype byte that tells humans (6) from cars (9). Which optional field
//! groups exist depends only on how long the blob is; each group is listed
//! in a size-gate table and unlocked independently of the others.

use serde::Serialize;

use crate::core_api::{CoreError, CoreErrorCode};
use crate::reader::{read_f32_le, read_u32_le, write_f32_le, write_u32_le};

use super::inventory::{HUMAN_INVENTORY_SIZE, find_human_inventory_offset};

pub const ACTOR_MARKER: u8 = 3;
pub const SUBTYPE_OFFSET: usize = 13;
pub const SUBTYPE_HUMAN: u8 = 6;
pub const SUBTYPE_CAR: u8 = 9;

const BASE_MIN_LEN: usize = 13;
const HUMAN_MIN_LEN: usize = 42;
const CAR_MIN_LEN: usize = 18;

pub const HUMAN_HEALTH_OFFSET: usize = 221;
pub const HUMAN_MAX_HEALTH_OFFSET: usize = 225;
pub const HUMAN_PROPS_CURRENT_OFFSET: usize = 229;
pub const HUMAN_PROPS_INIT_OFFSET: usize = 293;
pub const HUMAN_PROPERTY_COUNT: usize = 16;

pub const CAR_ENGINE_NORM_OFFSET: usize = 137;
pub const CAR_ENGINE_CALC_OFFSET: usize = 141;
pub const CAR_FLOW_OFFSET: usize = 211;
pub const CAR_SPEED_LIMIT_OFFSET: usize = 215;
pub const CAR_LAST_GEAR_OFFSET: usize = 245;
pub const CAR_GEAR_OFFSET: usize = 249;
pub const CAR_GEARBOX_FLAG_OFFSET: usize = 273;
pub const CAR_DISABLE_ENGINE_OFFSET: usize = 277;
pub const CAR_ENGINE_ON_OFFSET: usize = 298;
pub const CAR_IS_ENGINE_ON_OFFSET: usize = 303;
pub const CAR_FUEL_OFFSET: usize = 304;
pub const CAR_ODOMETER_OFFSET: usize = 345;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActorKind {
    Unknown,
    BaseOnly,
    Human,
    Car,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Capability {
    Base,
    HumanTransform,
    HumanCombat,
    HumanHealth,
    HumanProperties,
    HumanInventory,
    CarTransform,
    CarEngine,
    CarGears,
    CarEngineFlags,
    CarOdometer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldKind {
    U8,
    U32,
    F32,
    Vec3,
    Quat,
}

impl FieldKind {
    pub fn width(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U32 | Self::F32 => 4,
            Self::Vec3 => 12,
            Self::Quat => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum FieldValue {
    U8(u8),
    U32(u32),
    F32(f32),
    Vec3([f32; 3]),
    Quat([f32; 4]),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::U8(_) => FieldKind::U8,
            Self::U32(_) => FieldKind::U32,
            Self::F32(_) => FieldKind::F32,
            Self::Vec3(_) => FieldKind::Vec3,
            Self::Quat(_) => FieldKind::Quat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn new(name: &'static str, offset: usize, kind: FieldKind) -> Self {
        Self { name, offset, kind }
    }

    pub fn end(&self) -> usize {
        self.offset + self.kind.width()
    }

    pub fn read(&self, payload: &[u8]) -> Option<FieldValue> {
        let floats = |n: usize| -> Option<Vec<f32>> {
            (0..n)
                .map(|i| read_f32_le(payload, self.offset + i * 4))
                .collect()
        };
        Some(match self.kind {
            FieldKind::U8 => FieldValue::U8(*payload.get(self.offset)?),
            FieldKind::U32 => FieldValue::U32(read_u32_le(payload, self.offset)?),
            FieldKind::F32 => FieldValue::F32(read_f32_le(payload, self.offset)?),
            FieldKind::Vec3 => FieldValue::Vec3(floats(3)?.try_into().ok()?),
            FieldKind::Quat => FieldValue::Quat(floats(4)?.try_into().ok()?),
        })
    }

    /// Writes `value` into `payload`. Nothing is modified on error.
    pub fn write(&self, payload: &mut [u8], value: FieldValue) -> Result<(), CoreError> {
        if value.kind() != self.kind {
            return Err(CoreError::new(
                CoreErrorCode::Rejected,
                format!(
                    "field {} is {:?}, got a {:?} value",
                    self.name,
                    self.kind,
                    value.kind()
                ),
            ));
        }
        if self.end() > payload.len() {
            return Err(CoreError::overrun(format!(
                "field {} ({}..{}) is outside a {}-byte payload",
                self.name,
                self.offset,
                self.end(),
                payload.len()
            )));
        }
        match value {
            FieldValue::U8(v) => payload[self.offset] = v,
            FieldValue::U32(v) => {
                write_u32_le(payload, self.offset, v);
            }
            FieldValue::F32(v) => {
                write_f32_le(payload, self.offset, v);
            }
            FieldValue::Vec3(vs) => {
                for (i, v) in vs.into_iter().enumerate() {
                    write_f32_le(payload, self.offset + i * 4, v);
                }
            }
            FieldValue::Quat(vs) => {
                for (i, v) in vs.into_iter().enumerate() {
                    write_f32_le(payload, self.offset + i * 4, v);
                }
            }
        }
        Ok(())
    }
}

struct SizeGate {
    min_len: usize,
    capability: Capability,
    fields: &'static [FieldSpec],
}

use FieldKind::{F32, Quat, U8, U32, Vec3};

static BASE_FIELDS: [FieldSpec; 5] = [
    FieldSpec::new("state", 1, U32),
    FieldSpec::new("id", 5, U32),
    FieldSpec::new("active", 9, U8),
    FieldSpec::new("remove", 10, U8),
    FieldSpec::new("frame_flag", 11, U8),
];

static HUMAN_TRANSFORM_FIELDS: [FieldSpec; 3] = [
    FieldSpec::new("position", 14, Vec3),
    FieldSpec::new("direction", 26, Vec3),
    FieldSpec::new("animation_id", 38, U32),
];

static HUMAN_COMBAT_FIELDS: [FieldSpec; 4] = [
    FieldSpec::new("seat", 42, U32),
    FieldSpec::new("crouch", 46, U32),
    FieldSpec::new("aim", 50, U32),
    FieldSpec::new("shoot_target", 54, Vec3),
];

static HUMAN_HEALTH_FIELDS: [FieldSpec; 2] = [
    FieldSpec::new("current_health", HUMAN_HEALTH_OFFSET, F32),
    FieldSpec::new("max_health", HUMAN_MAX_HEALTH_OFFSET, F32),
];

const fn prop(name: &'static str, slot: usize, initial: bool) -> FieldSpec {
    let base = if initial {
        HUMAN_PROPS_INIT_OFFSET
    } else {
        HUMAN_PROPS_CURRENT_OFFSET
    };
    FieldSpec::new(name, base + slot * 4, F32)
}

#[rustfmt::skip]
static HUMAN_PROPERTY_FIELDS: [FieldSpec; HUMAN_PROPERTY_COUNT * 2] = [
    prop("strength", 0, false),       prop("strength_initial", 0, true),
    prop("health", 1, false),         prop("health_initial", 1, true),
    prop("health_hand_l", 2, false),  prop("health_hand_l_initial", 2, true),
    prop("health_hand_r", 3, false),  prop("health_hand_r_initial", 3, true),
    prop("health_leg_l", 4, false),   prop("health_leg_l_initial", 4, true),
    prop("health_leg_r", 5, false),   prop("health_leg_r_initial", 5, true),
    prop("reactions", 6, false),      prop("reactions_initial", 6, true),
    prop("speed", 7, false),          prop("speed_initial", 7, true),
    prop("aggressivity", 8, false),   prop("aggressivity_initial", 8, true),
    prop("intelligence", 9, false),   prop("intelligence_initial", 9, true),
    prop("shooting", 10, false),      prop("shooting_initial", 10, true),
    prop("sight", 11, false),         prop("sight_initial", 11, true),
    prop("hearing", 12, false),       prop("hearing_initial", 12, true),
    prop("driving", 13, false),       prop("driving_initial", 13, true),
    prop("mass", 14, false),          prop("mass_initial", 14, true),
    prop("morale", 15, false),        prop("morale_initial", 15, true),
];

static CAR_TRANSFORM_FIELDS: [FieldSpec; 2] = [
    FieldSpec::new("position", 21, Vec3),
    FieldSpec::new("rotation", 33, Quat),
];

static CAR_ENGINE_FIELDS: [FieldSpec; 4] = [
    FieldSpec::new("fuel", CAR_FUEL_OFFSET, F32),
    FieldSpec::new("flow", CAR_FLOW_OFFSET, F32),
    FieldSpec::new("engine_norm", CAR_ENGINE_NORM_OFFSET, F32),
    FieldSpec::new("engine_calc", CAR_ENGINE_CALC_OFFSET, F32),
];

static CAR_GEAR_FIELDS: [FieldSpec; 3] = [
    FieldSpec::new("speed_limit", CAR_SPEED_LIMIT_OFFSET, F32),
    FieldSpec::new("last_gear", CAR_LAST_GEAR_OFFSET, U32),
    FieldSpec::new("gear", CAR_GEAR_OFFSET, U32),
];

static CAR_ENGINE_FLAG_FIELDS: [FieldSpec; 4] = [
    FieldSpec::new("gearbox_flag", CAR_GEARBOX_FLAG_OFFSET, U32),
    FieldSpec::new("disable_engine", CAR_DISABLE_ENGINE_OFFSET, U32),
    FieldSpec::new("engine_on", CAR_ENGINE_ON_OFFSET, U8),
    FieldSpec::new("is_engine_on", CAR_IS_ENGINE_ON_OFFSET, U8),
];

static CAR_ODOMETER_FIELDS: [FieldSpec; 1] = [FieldSpec::new("odometer", CAR_ODOMETER_OFFSET, F32)];

static BASE_GATES: [SizeGate; 1] = [SizeGate {
    min_len: BASE_MIN_LEN,
    capability: Capability::Base,
    fields: &BASE_FIELDS,
}];

static HUMAN_GATES: [SizeGate; 4] = [
    SizeGate {
        min_len: HUMAN_MIN_LEN,
        capability: Capability::HumanTransform,
        fields: &HUMAN_TRANSFORM_FIELDS,
    },
    SizeGate {
        min_len: 66,
        capability: Capability::HumanCombat,
        fields: &HUMAN_COMBAT_FIELDS,
    },
    SizeGate {
        min_len: HUMAN_MAX_HEALTH_OFFSET + 4,
        capability: Capability::HumanHealth,
        fields: &HUMAN_HEALTH_FIELDS,
    },
    SizeGate {
        min_len: HUMAN_PROPS_INIT_OFFSET + HUMAN_PROPERTY_COUNT * 4,
        capability: Capability::HumanProperties,
        fields: &HUMAN_PROPERTY_FIELDS,
    },
];

static CAR_GATES: [SizeGate; 5] = [
    SizeGate {
        min_len: 49,
        capability: Capability::CarTransform,
        fields: &CAR_TRANSFORM_FIELDS,
    },
    // strictly longer than the fuel word's end
    SizeGate {
        min_len: CAR_FUEL_OFFSET + 4 + 1,
        capability: Capability::CarEngine,
        fields: &CAR_ENGINE_FIELDS,
    },
    SizeGate {
        min_len: 253,
        capability: Capability::CarGears,
        fields: &CAR_GEAR_FIELDS,
    },
    SizeGate {
        min_len: 304,
        capability: Capability::CarEngineFlags,
        fields: &CAR_ENGINE_FLAG_FIELDS,
    },
    SizeGate {
        min_len: CAR_ODOMETER_OFFSET + 4,
        capability: Capability::CarOdometer,
        fields: &CAR_ODOMETER_FIELDS,
    },
];

static NO_FIELDS: [FieldSpec; 0] = [];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldGroup {
    pub capability: Capability,
    pub fields: &'static [FieldSpec],
}

/// What a given payload supports. Recomputed from the bytes on every call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordLayout {
    pub kind: ActorKind,
    pub payload_len: usize,
    pub groups: Vec<FieldGroup>,
    pub inventory_offset: Option<usize>,
}

impl CoordLayout {
    pub fn supports(&self, capability: Capability) -> bool {
        self.groups.iter().any(|g| g.capability == capability)
    }

    pub fn fields(&self, capability: Capability) -> Option<&'static [FieldSpec]> {
        self.groups
            .iter()
            .find(|g| g.capability == capability)
            .map(|g| g.fields)
    }

    /// Looks a field up by name. Human and car share names such as
    /// `position`, but a layout only ever holds one subtype.
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.groups
            .iter()
            .flat_map(|g| g.fields.iter())
            .find(|f| f.name == name)
    }

    pub fn inventory_range(&self) -> Option<std::ops::Range<usize>> {
        self.inventory_offset
            .map(|start| start..start + HUMAN_INVENTORY_SIZE)
    }
}

fn unlock(groups: &mut Vec<FieldGroup>, gates: &[SizeGate], len: usize) {
    groups.extend(
        gates
            .iter()
            .filter(|gate| len >= gate.min_len)
            .map(|gate| FieldGroup {
                capability: gate.capability,
                fields: gate.fields,
            }),
    );
}

pub fn detect_coord_layout(payload: &[u8]) -> CoordLayout {
    let len = payload.len();
    let mut layout = CoordLayout {
        kind: ActorKind::Unknown,
        payload_len: len,
        groups: Vec::new(),
        inventory_offset: None,
    };

    if len < BASE_MIN_LEN || payload[0] != ACTOR_MARKER {
        return layout;
    }
    unlock(&mut layout.groups, &BASE_GATES, len);
    layout.kind = ActorKind::BaseOnly;

    let subtype = payload.get(SUBTYPE_OFFSET).copied();
    if len >= HUMAN_MIN_LEN && subtype == Some(SUBTYPE_HUMAN) {
        layout.kind = ActorKind::Human;
        unlock(&mut layout.groups, &HUMAN_GATES, len);
        layout.inventory_offset = find_human_inventory_offset(payload);
        if layout.inventory_offset.is_some() {
            layout.groups.push(FieldGroup {
                capability: Capability::HumanInventory,
                fields: &NO_FIELDS,
            });
        }
    } else if len >= CAR_MIN_LEN && subtype == Some(SUBTYPE_CAR) {
        layout.kind = ActorKind::Car;
        unlock(&mut layout.groups, &CAR_GATES, len);
    }

    layout
}
