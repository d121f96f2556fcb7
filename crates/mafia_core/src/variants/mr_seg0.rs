use std::io::Cursor;

use serde::{Deserialize, Serialize};

use crate::core_api::CoreError;
use crate::layout::{FileLayout, SectionId};
use crate::reader::LittleEndianReader;

use super::truncated;

const HEADER_SIZE: usize = 12;
const POINT_SIZE: usize = 12;
const MIN_FILE_SIZE: usize = HEADER_SIZE + POINT_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MrSeg0Point {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MrSeg0SaveData {
    pub header_a: u32,
    pub header_b: u32,
    pub header_c: u32,
    pub points: Vec<MrSeg0Point>,
}

impl MrSeg0SaveData {
    pub fn parse(raw: &[u8]) -> Result<Self, CoreError> {
        if raw.len() < MIN_FILE_SIZE || (raw.len() - HEADER_SIZE) % POINT_SIZE != 0 {
            return Err(CoreError::size_mismatch(format!(
                "mrseg0 save has unexpected size {} (expected 12 + 12*n, n >= 1)",
                raw.len()
            )));
        }

        let point_count = (raw.len() - HEADER_SIZE) / POINT_SIZE;
        let mut r = LittleEndianReader::new(Cursor::new(raw));
        let header = r
            .read_u32_vec(3)
            .map_err(|e| truncated("mrseg0 header", e))?;
        let mut points = Vec::with_capacity(point_count);
        for _ in 0..point_count {
            points.push(MrSeg0Point {
                x: r.read_f32().map_err(|e| truncated("mrseg0 point", e))?,
                y: r.read_f32().map_err(|e| truncated("mrseg0 point", e))?,
                z: r.read_f32().map_err(|e| truncated("mrseg0 point", e))?,
            });
        }

        Ok(Self {
            header_a: header[0],
            header_b: header[1],
            header_c: header[2],
            points,
        })
    }

    pub fn build(&self) -> Result<Vec<u8>, CoreError> {
        if self.points.is_empty() {
            return Err(CoreError::size_mismatch(
                "mrseg0 save must contain at least one point",
            ));
        }

        let mut out = Vec::with_capacity(HEADER_SIZE + self.points.len() * POINT_SIZE);
        for word in [self.header_a, self.header_b, self.header_c] {
            out.extend_from_slice(&word.to_le_bytes());
        }
        for p in &self.points {
            for v in [p.x, p.y, p.z] {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        Ok(out)
    }

    pub fn layout(&self) -> FileLayout {
        FileLayout::sequential(&[
            (SectionId::Headers, HEADER_SIZE, false),
            (SectionId::Points, self.points.len() * POINT_SIZE, false),
        ])
    }
}
