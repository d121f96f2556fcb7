//! Interface to the mission-save segment container.
//!
//! The container format itself lives outside this crate; callers plug in a
//! [`MissionCodec`] and the core works on the decoded [`SaveData`].

use serde::{Deserialize, Serialize};

use crate::core_api::CoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    pub plain: Vec<u8>,
}

impl Segment {
    pub fn new(name: impl Into<String>, plain: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            plain,
        }
    }
}

/// Decoded mission save. Named indices point into `segments`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveData {
    pub segments: Vec<Segment>,
    pub idx_meta: Option<usize>,
    pub idx_info: Option<usize>,
    pub idx_game_payload: Option<usize>,
    pub idx_ai_groups: Option<usize>,
    pub idx_ai_follow: Option<usize>,
}

impl SaveData {
    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn find(&self, name: &str) -> Option<(usize, &Segment)> {
        self.segments
            .iter()
            .enumerate()
            .find(|(_, s)| s.name == name)
    }

    pub fn game_payload(&self) -> Option<&Segment> {
        self.idx_game_payload.and_then(|i| self.segments.get(i))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaFields {
    pub hp_percent: u32,
    pub packed_date: u32,
    pub packed_time: u32,
    pub slot: u32,
    pub mission_code: String,
}

/// Parser/builder for the mission-save container.
pub trait MissionCodec: std::fmt::Debug {
    fn parse(&self, raw: &[u8]) -> Result<SaveData, CoreError>;

    fn build(&self, save: &SaveData) -> Result<Vec<u8>, CoreError>;

    fn read_meta_fields(&self, save: &SaveData) -> Option<MetaFields>;
}
