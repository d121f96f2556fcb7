use std::sync::Arc;

use tracing::debug;

use crate::detect::{
    CoordLayout, FieldValue, ProgramLocation, collect_program_candidates, detect_coord_layout,
    detect_program, read_program_vars, write_program_var,
};
use crate::layout::FileLayout;
use crate::profile::{ProfileBlock, ProfileSaveData};
use crate::segment::{MetaFields, MissionCodec, SaveData};
use crate::variants::{MrProfileSaveData, MrSeg0Point, MrSeg0SaveData, MrTimesSaveData};

use super::error::{CoreError, CoreErrorCode};
use super::types::{
    BlockEntry, SaveFormat, SegmentEntry, Snapshot, SnapshotDetails, TimesEntry,
};

/// Entry point for loading saves. The mission container is optional: without
/// a codec the cascade skips straight past it.
#[derive(Debug, Default, Clone)]
pub struct Engine {
    mission: Option<Arc<dyn MissionCodec>>,
}

#[derive(Debug, Clone)]
enum LoadedDocument {
    Mission(Box<SaveData>),
    Profile(Box<ProfileSaveData>),
    MrProfile(MrProfileSaveData),
    MrTimes(MrTimesSaveData),
    MrSeg0(MrSeg0SaveData),
}

impl LoadedDocument {
    fn format(&self) -> SaveFormat {
        match self {
            Self::Mission(_) => SaveFormat::Mission,
            Self::Profile(_) => SaveFormat::Profile,
            Self::MrProfile(_) => SaveFormat::MrProfile,
            Self::MrTimes(_) => SaveFormat::MrTimes,
            Self::MrSeg0(_) => SaveFormat::MrSeg0,
        }
    }
}

/// One loaded file plus everything the editor tracks about it.
#[derive(Debug, Clone)]
pub struct Session {
    document: LoadedDocument,
    original: Vec<u8>,
    mission: Option<Arc<dyn MissionCodec>>,
    selected_segment: Option<usize>,
    modified: bool,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mission_codec(codec: Arc<dyn MissionCodec>) -> Self {
        Self {
            mission: Some(codec),
        }
    }

    pub fn has_mission_codec(&self) -> bool {
        self.mission.is_some()
    }

    /// Parses `bytes` as `hint`, or runs the full cascade when no hint is
    /// given. The first format that parses wins.
    pub fn open_bytes<B: AsRef<[u8]>>(
        &self,
        bytes: B,
        hint: Option<SaveFormat>,
    ) -> Result<Session, CoreError> {
        let bytes = bytes.as_ref();

        if let Some(format) = hint {
            let document = self.parse_as(format, bytes).map_err(|e| {
                CoreError::new(e.code, format!("failed to parse as {format}: {}", e.message))
            })?;
            return Ok(self.session(document, bytes));
        }

        let mut failures = Vec::with_capacity(SaveFormat::CASCADE.len());
        for format in SaveFormat::CASCADE {
            match self.parse_as(format, bytes) {
                Ok(document) => {
                    debug!(%format, len = bytes.len(), "save format accepted");
                    return Ok(self.session(document, bytes));
                }
                Err(e) => {
                    debug!(%format, error = %e, "save format rejected");
                    failures.push(format!("{format}: {}", e.message));
                }
            }
        }

        Err(CoreError::new(
            CoreErrorCode::NoViableCandidate,
            format!("no save format matched ({})", failures.join("; ")),
        ))
    }

    fn parse_as(&self, format: SaveFormat, bytes: &[u8]) -> Result<LoadedDocument, CoreError> {
        Ok(match format {
            SaveFormat::Mission => {
                let Some(codec) = &self.mission else {
                    return Err(CoreError::new(
                        CoreErrorCode::UnsupportedOperation,
                        "no mission container codec configured",
                    ));
                };
                LoadedDocument::Mission(Box::new(codec.parse(bytes)?))
            }
            SaveFormat::Profile => LoadedDocument::Profile(Box::new(ProfileSaveData::parse(bytes)?)),
            SaveFormat::MrProfile => LoadedDocument::MrProfile(MrProfileSaveData::parse(bytes)?),
            SaveFormat::MrTimes => LoadedDocument::MrTimes(MrTimesSaveData::parse(bytes)?),
            SaveFormat::MrSeg0 => LoadedDocument::MrSeg0(MrSeg0SaveData::parse(bytes)?),
        })
    }

    fn session(&self, document: LoadedDocument, bytes: &[u8]) -> Session {
        let selected_segment = match &document {
            LoadedDocument::Mission(save) => save.idx_game_payload,
            _ => None,
        };
        Session {
            document,
            original: bytes.to_vec(),
            mission: self.mission.clone(),
            selected_segment,
            modified: false,
        }
    }
}

impl Session {
    pub fn format(&self) -> SaveFormat {
        self.document.format()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn original_bytes(&self) -> &[u8] {
        &self.original
    }

    pub fn mission(&self) -> Option<&SaveData> {
        match &self.document {
            LoadedDocument::Mission(save) => Some(&**save),
            _ => None,
        }
    }

    pub fn profile(&self) -> Option<&ProfileSaveData> {
        match &self.document {
            LoadedDocument::Profile(doc) => Some(&**doc),
            _ => None,
        }
    }

    pub fn mr_profile(&self) -> Option<&MrProfileSaveData> {
        match &self.document {
            LoadedDocument::MrProfile(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn mr_times(&self) -> Option<&MrTimesSaveData> {
        match &self.document {
            LoadedDocument::MrTimes(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn mr_seg0(&self) -> Option<&MrSeg0SaveData> {
        match &self.document {
            LoadedDocument::MrSeg0(doc) => Some(doc),
            _ => None,
        }
    }

    /// Summary of the current (possibly edited) document.
    pub fn snapshot(&self) -> Snapshot {
        let details = match &self.document {
            LoadedDocument::Mission(save) => SnapshotDetails::Mission {
                segments: save
                    .segments
                    .iter()
                    .enumerate()
                    .map(|(index, s)| SegmentEntry {
                        index,
                        name: s.name.clone(),
                        len: s.plain.len(),
                    })
                    .collect(),
                meta: self.meta_fields(),
            },
            LoadedDocument::Profile(doc) => SnapshotDetails::Profile {
                blocks: ProfileBlock::ALL
                    .iter()
                    .map(|&block| BlockEntry {
                        block,
                        len: doc.block(block).len(),
                        first_word: doc.u32_at(block, 0).unwrap_or_default(),
                    })
                    .collect(),
            },
            LoadedDocument::MrProfile(doc) => SnapshotDetails::MrProfile {
                words: doc.words.clone(),
            },
            LoadedDocument::MrTimes(doc) => SnapshotDetails::MrTimes {
                count: doc.count,
                records: doc
                    .records
                    .iter()
                    .enumerate()
                    .map(|(index, r)| TimesEntry {
                        index,
                        name: r.name(),
                        value_a: r.value_a,
                        value_b: r.value_b,
                    })
                    .collect(),
            },
            LoadedDocument::MrSeg0(doc) => SnapshotDetails::MrSeg0 {
                header: [doc.header_a, doc.header_b, doc.header_c],
                points: doc.points.clone(),
            },
        };

        Snapshot {
            format: self.format(),
            raw_size: self.original.len(),
            details,
        }
    }

    /// Byte layout of the on-disk file. Mission saves are laid out by their
    /// container codec and report none.
    pub fn layout(&self) -> Option<FileLayout> {
        match &self.document {
            LoadedDocument::Mission(_) => None,
            LoadedDocument::Profile(_) => Some(ProfileSaveData::layout()),
            LoadedDocument::MrProfile(_) => Some(MrProfileSaveData::layout()),
            LoadedDocument::MrTimes(doc) => Some(doc.layout()),
            LoadedDocument::MrSeg0(doc) => Some(doc.layout()),
        }
    }

    pub fn to_bytes_unmodified(&self) -> Vec<u8> {
        self.original.clone()
    }

    pub fn to_bytes_modified(&self) -> Result<Vec<u8>, CoreError> {
        match &self.document {
            LoadedDocument::Mission(save) => self.mission_codec()?.build(save),
            LoadedDocument::Profile(doc) => doc.build(),
            LoadedDocument::MrProfile(doc) => doc.build(),
            LoadedDocument::MrTimes(doc) => doc.build(),
            LoadedDocument::MrSeg0(doc) => doc.build(),
        }
    }

    pub fn set_mr_profile_word(&mut self, index: usize, value: u32) -> Result<(), CoreError> {
        let loaded = self.format();
        let LoadedDocument::MrProfile(doc) = &mut self.document else {
            return Err(wrong_format("mr-profile word", loaded));
        };
        let slot = doc.words.get_mut(index).ok_or_else(|| {
            CoreError::overrun(format!("mr-profile word {index} out of range"))
        })?;
        *slot = value;
        self.modified = true;
        Ok(())
    }

    pub fn set_mr_times_values(
        &mut self,
        index: usize,
        value_a: u32,
        value_b: u32,
    ) -> Result<(), CoreError> {
        let loaded = self.format();
        let LoadedDocument::MrTimes(doc) = &mut self.document else {
            return Err(wrong_format("mr-times values", loaded));
        };
        let record = doc.records.get_mut(index).ok_or_else(|| {
            CoreError::overrun(format!("mr-times record {index} out of range"))
        })?;
        record.value_a = value_a;
        record.value_b = value_b;
        self.modified = true;
        Ok(())
    }

    pub fn set_mr_times_name(&mut self, index: usize, name: &str) -> Result<(), CoreError> {
        let loaded = self.format();
        let LoadedDocument::MrTimes(doc) = &mut self.document else {
            return Err(wrong_format("mr-times name", loaded));
        };
        let record = doc.records.get_mut(index).ok_or_else(|| {
            CoreError::overrun(format!("mr-times record {index} out of range"))
        })?;
        record.set_name(name)?;
        self.modified = true;
        Ok(())
    }

    pub fn set_mr_seg0_point(&mut self, index: usize, point: MrSeg0Point) -> Result<(), CoreError> {
        let loaded = self.format();
        let LoadedDocument::MrSeg0(doc) = &mut self.document else {
            return Err(wrong_format("mr-seg0 point", loaded));
        };
        let slot = doc.points.get_mut(index).ok_or_else(|| {
            CoreError::overrun(format!("mr-seg0 point {index} out of range"))
        })?;
        *slot = point;
        self.modified = true;
        Ok(())
    }

    pub fn set_profile_u32(
        &mut self,
        block: ProfileBlock,
        offset: usize,
        value: u32,
    ) -> Result<(), CoreError> {
        let loaded = self.format();
        let LoadedDocument::Profile(doc) = &mut self.document else {
            return Err(wrong_format("profile word", loaded));
        };
        doc.set_u32_at(block, offset, value)?;
        self.modified = true;
        Ok(())
    }

    /// Swaps a mission segment's plaintext. The container codec decides at
    /// build time whether the new length is acceptable.
    pub fn replace_segment(&mut self, index: usize, plain: Vec<u8>) -> Result<(), CoreError> {
        let save = self.mission_mut("segment replacement")?;
        let segment = save
            .segments
            .get_mut(index)
            .ok_or_else(|| CoreError::overrun(format!("segment {index} out of range")))?;
        segment.plain = plain;
        self.modified = true;
        Ok(())
    }

    pub fn selected_segment(&self) -> Option<usize> {
        self.selected_segment
    }

    pub fn select_segment(&mut self, index: usize) -> Result<(), CoreError> {
        let save = self.mission().ok_or_else(|| {
            wrong_format("segment selection", self.document.format())
        })?;
        if index >= save.segments.len() {
            return Err(CoreError::overrun(format!(
                "segment {index} out of range ({} segments)",
                save.segments.len()
            )));
        }
        self.selected_segment = Some(index);
        Ok(())
    }

    pub fn selected_payload(&self) -> Option<&[u8]> {
        let save = self.mission()?;
        save.segment(self.selected_segment?).map(|s| s.plain.as_slice())
    }

    /// Layout of the selected segment, recomputed from its current bytes.
    pub fn coord_layout(&self) -> Option<CoordLayout> {
        self.selected_payload().map(detect_coord_layout)
    }

    pub fn set_actor_field(&mut self, name: &str, value: FieldValue) -> Result<(), CoreError> {
        let layout = self.coord_layout().ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::UnsupportedOperation,
                "no actor segment selected",
            )
        })?;
        let spec = layout.field(name).ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::UnsupportedOperation,
                format!("field {name} is not available for this {:?} payload", layout.kind),
            )
        })?;
        let index = self.selected_segment.unwrap_or_default();
        let save = self.mission_mut("actor field edit")?;
        spec.write(&mut save.segments[index].plain, value)?;
        self.modified = true;
        Ok(())
    }

    pub fn detect_program(&self) -> Option<ProgramLocation> {
        detect_program(&collect_program_candidates(self.mission()?))
    }

    pub fn program_vars(&self) -> Option<Vec<f32>> {
        let location = self.detect_program()?;
        let segment = self.mission()?.segment(location.segment)?;
        read_program_vars(&segment.plain, &location.layout)
    }

    /// Detection runs again on the current bytes before writing.
    pub fn set_program_var(&mut self, index: usize, value: f32) -> Result<(), CoreError> {
        let location = self.detect_program().ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::NoViableCandidate,
                "no program block found in the candidate segments",
            )
        })?;
        let save = self.mission_mut("program variable edit")?;
        write_program_var(
            &mut save.segments[location.segment].plain,
            &location.layout,
            index,
            value,
        )?;
        self.modified = true;
        Ok(())
    }

    pub fn meta_fields(&self) -> Option<MetaFields> {
        let save = self.mission()?;
        self.mission.as_ref()?.read_meta_fields(save)
    }

    fn mission_codec(&self) -> Result<&Arc<dyn MissionCodec>, CoreError> {
        self.mission.as_ref().ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::UnsupportedOperation,
                "no mission container codec configured",
            )
        })
    }

    fn mission_mut(&mut self, what: &str) -> Result<&mut SaveData, CoreError> {
        match &mut self.document {
            LoadedDocument::Mission(save) => Ok(&mut **save),
            other => Err(wrong_format(what, other.format())),
        }
    }
}

fn wrong_format(what: &str, loaded: SaveFormat) -> CoreError {
    CoreError::new(
        CoreErrorCode::UnsupportedOperation,
        format!("{what} is not available for a {loaded} save"),
    )
}
