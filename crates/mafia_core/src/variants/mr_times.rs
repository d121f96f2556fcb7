use std::io::Cursor;

use encoding_rs::WINDOWS_1252;
use serde::{Deserialize, Serialize};

use crate::core_api::{CoreError, CoreErrorCode};
use crate::layout::{FileLayout, SectionId};
use crate::reader::LittleEndianReader;

use super::truncated;

pub const MR_TIMES_NAME_SIZE: usize = 32;
pub const MR_TIMES_RECORD_SIZE: usize = MR_TIMES_NAME_SIZE + 8;
const COUNT_SIZE: usize = 4;
const MIN_FILE_SIZE: usize = COUNT_SIZE + MR_TIMES_RECORD_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MrTimesRecord {
    pub name_raw: [u8; MR_TIMES_NAME_SIZE],
    pub value_a: u32,
    pub value_b: u32,
}

impl MrTimesRecord {
    /// Name up to the first NUL, decoded as Windows-1252.
    pub fn name(&self) -> String {
        let end = self
            .name_raw
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MR_TIMES_NAME_SIZE);
        WINDOWS_1252.decode(&self.name_raw[..end]).0.into_owned()
    }

    /// Replaces the name, zero padding the rest of the field. At least one
    /// terminating NUL is kept.
    pub fn set_name(&mut self, name: &str) -> Result<(), CoreError> {
        let (encoded, _, had_errors) = WINDOWS_1252.encode(name);
        if had_errors {
            return Err(CoreError::new(
                CoreErrorCode::Rejected,
                format!("name {name:?} is not representable in Windows-1252"),
            ));
        }
        if encoded.len() >= MR_TIMES_NAME_SIZE {
            return Err(CoreError::new(
                CoreErrorCode::Rejected,
                format!(
                    "name {name:?} is {} bytes, at most {} fit",
                    encoded.len(),
                    MR_TIMES_NAME_SIZE - 1
                ),
            ));
        }
        self.name_raw = [0u8; MR_TIMES_NAME_SIZE];
        self.name_raw[..encoded.len()].copy_from_slice(&encoded);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrTimesSaveData {
    pub count: u32,
    pub records: Vec<MrTimesRecord>,
}

impl MrTimesSaveData {
    pub fn parse(raw: &[u8]) -> Result<Self, CoreError> {
        if raw.len() < MIN_FILE_SIZE || (raw.len() - COUNT_SIZE) % MR_TIMES_RECORD_SIZE != 0 {
            return Err(CoreError::size_mismatch(format!(
                "mrtimes save has unexpected size {} (expected 4 + 40*n, n >= 1)",
                raw.len()
            )));
        }

        let record_count = (raw.len() - COUNT_SIZE) / MR_TIMES_RECORD_SIZE;
        let mut r = LittleEndianReader::new(Cursor::new(raw));
        let count = r.read_u32().map_err(|e| truncated("mrtimes count", e))?;
        let mut records = Vec::with_capacity(record_count);
        for _ in 0..record_count {
            records.push(MrTimesRecord {
                name_raw: r.read_array().map_err(|e| truncated("mrtimes record", e))?,
                value_a: r.read_u32().map_err(|e| truncated("mrtimes record", e))?,
                value_b: r.read_u32().map_err(|e| truncated("mrtimes record", e))?,
            });
        }

        Ok(Self { count, records })
    }

    pub fn build(&self) -> Result<Vec<u8>, CoreError> {
        if self.records.is_empty() {
            return Err(CoreError::size_mismatch(
                "mrtimes save must contain at least one record",
            ));
        }

        let mut out = Vec::with_capacity(COUNT_SIZE + self.records.len() * MR_TIMES_RECORD_SIZE);
        out.extend_from_slice(&self.count.to_le_bytes());
        for rec in &self.records {
            out.extend_from_slice(&rec.name_raw);
            out.extend_from_slice(&rec.value_a.to_le_bytes());
            out.extend_from_slice(&rec.value_b.to_le_bytes());
        }
        Ok(out)
    }

    pub fn layout(&self) -> FileLayout {
        FileLayout::sequential(&[
            (SectionId::Count, COUNT_SIZE, false),
            (
                SectionId::Records,
                self.records.len() * MR_TIMES_RECORD_SIZE,
                false,
            ),
        ])
    }
}
