use std::io::Cursor;

use crate::core_api::CoreError;
use crate::layout::{FileLayout, SectionId};
use crate::reader::LittleEndianReader;

use super::truncated;

pub const MR_PROFILE_WORD_COUNT: usize = 34;
pub const MR_PROFILE_FILE_SIZE: usize = MR_PROFILE_WORD_COUNT * 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrProfileSaveData {
    pub words: Vec<u32>,
}

impl MrProfileSaveData {
    pub fn parse(raw: &[u8]) -> Result<Self, CoreError> {
        if raw.len() != MR_PROFILE_FILE_SIZE {
            return Err(CoreError::size_mismatch(format!(
                "mr profile save must be exactly {MR_PROFILE_FILE_SIZE} bytes, got {}",
                raw.len()
            )));
        }

        let mut r = LittleEndianReader::new(Cursor::new(raw));
        let words = r
            .read_u32_vec(MR_PROFILE_WORD_COUNT)
            .map_err(|e| truncated("mr profile", e))?;
        Ok(Self { words })
    }

    pub fn build(&self) -> Result<Vec<u8>, CoreError> {
        if self.words.len() != MR_PROFILE_WORD_COUNT {
            return Err(CoreError::size_mismatch(format!(
                "mr profile save expects exactly {MR_PROFILE_WORD_COUNT} u32 values, got {}",
                self.words.len()
            )));
        }
        Ok(self.words.iter().flat_map(|w| w.to_le_bytes()).collect())
    }

    pub fn layout() -> FileLayout {
        FileLayout::sequential(&[(SectionId::Words, MR_PROFILE_FILE_SIZE, false)])
    }
}
