use std::fmt;

use serde::{Deserialize, Serialize};

use crate::profile::ProfileBlock;
use crate::segment::MetaFields;
use crate::variants::MrSeg0Point;

/// Save variants in the order the loader tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveFormat {
    Mission,
    Profile,
    MrProfile,
    MrTimes,
    MrSeg0,
}

impl SaveFormat {
    pub const CASCADE: [SaveFormat; 5] = [
        SaveFormat::Mission,
        SaveFormat::Profile,
        SaveFormat::MrProfile,
        SaveFormat::MrTimes,
        SaveFormat::MrSeg0,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mission => "mission",
            Self::Profile => "profile",
            Self::MrProfile => "mr-profile",
            Self::MrTimes => "mr-times",
            Self::MrSeg0 => "mr-seg0",
        }
    }
}

impl fmt::Display for SaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentEntry {
    pub index: usize,
    pub name: String,
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockEntry {
    pub block: ProfileBlock,
    pub len: usize,
    pub first_word: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimesEntry {
    pub index: usize,
    pub name: String,
    pub value_a: u32,
    pub value_b: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SnapshotDetails {
    Mission {
        segments: Vec<SegmentEntry>,
        meta: Option<MetaFields>,
    },
    Profile {
        blocks: Vec<BlockEntry>,
    },
    MrProfile {
        words: Vec<u32>,
    },
    MrTimes {
        count: u32,
        records: Vec<TimesEntry>,
    },
    MrSeg0 {
        header: [u32; 3],
        points: Vec<MrSeg0Point>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format: SaveFormat,
    pub raw_size: usize,
    pub details: SnapshotDetails,
}
