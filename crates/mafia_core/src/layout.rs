use serde::{Deserialize, Serialize};

use crate::core_api::{CoreError, CoreErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn new(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionId {
    FileHeader,
    Core,
    Block720,
    Block92,
    Block156,
    Words,
    Count,
    Headers,
    Records,
    Points,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionLayout {
    pub id: SectionId,
    pub range: ByteRange,
    pub encrypted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLayout {
    pub file_len: usize,
    pub sections: Vec<SectionLayout>,
}

impl FileLayout {
    /// Builds a layout from consecutive `(id, len, encrypted)` sections.
    pub fn sequential(parts: &[(SectionId, usize, bool)]) -> Self {
        let mut sections = Vec::with_capacity(parts.len());
        let mut cursor = 0usize;
        for &(id, len, encrypted) in parts {
            sections.push(SectionLayout {
                id,
                range: ByteRange::new(cursor, len),
                encrypted,
            });
            cursor += len;
        }
        Self {
            file_len: cursor,
            sections,
        }
    }

    pub fn section(&self, id: SectionId) -> Option<&SectionLayout> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let Some(first) = self.sections.first() else {
            return Err(CoreError::new(
                CoreErrorCode::Overrun,
                "file layout must contain at least one section",
            ));
        };

        if first.range.start != 0 {
            return Err(CoreError::overrun("layout does not start at byte 0"));
        }

        let mut expected = 0usize;
        for section in &self.sections {
            if section.range.start != expected {
                return Err(CoreError::overrun(format!(
                    "layout gap/overlap around section {:?}: expected start {}, got {}",
                    section.id, expected, section.range.start
                )));
            }
            if section.range.end < section.range.start {
                return Err(CoreError::overrun(format!(
                    "invalid section range {:?}: {}..{}",
                    section.id, section.range.start, section.range.end
                )));
            }
            expected = section.range.end;
        }

        if expected != self.file_len {
            return Err(CoreError::overrun(format!(
                "layout does not cover file: ended at {}, file length {}",
                expected, self.file_len
            )));
        }

        Ok(())
    }
}
