//! Locates the embedded script program block inside segment payloads.
//!
//! There is no index pointing at the block, so every offset holding the
//! marker byte is tried as a sub-header and validated by walking the
//! register, variable, actor and frame tables that must follow it.

use std::cmp::Ordering;

use encoding_rs::WINDOWS_1252;
use serde::Serialize;
use tracing::debug;

use crate::core_api::{CoreError, CoreErrorCode};
use crate::reader::{read_f32_le, read_u16_le, read_u32_le, write_f32_le};
use crate::segment::SaveData;

pub const PROGRAM_MARKER: u8 = 2;
const SUB_HEADER_SIZE: usize = 39;
const REG_COUNT_OFFSET: usize = 17;
const VAR_COUNT_OFFSET: usize = 19;
const FRAME_COUNT_OFFSET: usize = 23;
const ACTOR_COUNT_OFFSET: usize = 27;

const MAX_REG_COUNT: u16 = 4096;
const MAX_VAR_COUNT: u32 = 8192;
const MAX_FRAME_COUNT: u32 = 2048;
const MAX_ACTOR_COUNT: u32 = 2048;
const MAX_ACTOR_NAME_LEN: u32 = 1024;
const ACTOR_ENTRY_HEADER: usize = 8;
const FRAME_NAME_PREFIX: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgramLayout {
    pub base_off: usize,
    pub vars_off: usize,
    pub reg_count: u16,
    pub var_count: u32,
    pub frame_count: u32,
    pub actor_count: u32,
    pub actors_off: usize,
    pub frames_off: usize,
    pub end_off: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ProgramCandidate<'a> {
    /// Caller-chosen identifier, usually the segment index.
    pub segment: usize,
    pub name: &'a str,
    pub bytes: &'a [u8],
    pub is_game_payload: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramLocation {
    pub segment: usize,
    pub segment_name: String,
    pub is_game_payload: bool,
    pub layout: ProgramLayout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramNames {
    pub actors: Vec<String>,
    pub frames: Vec<String>,
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn advance(&mut self, n: usize) -> Option<()> {
        let next = self.pos.checked_add(n)?;
        if next > self.bytes.len() {
            return None;
        }
        self.pos = next;
        Some(())
    }
}

/// Tries to read a program block whose marker sits at `offset`.
pub fn parse_program_at(bytes: &[u8], offset: usize) -> Option<ProgramLayout> {
    if bytes.get(offset) != Some(&PROGRAM_MARKER) {
        return None;
    }
    let reg_count = read_u16_le(bytes, offset.checked_add(REG_COUNT_OFFSET)?)?;
    let var_count = read_u32_le(bytes, offset + VAR_COUNT_OFFSET)?;
    let frame_count = read_u32_le(bytes, offset + FRAME_COUNT_OFFSET)?;
    let actor_count = read_u32_le(bytes, offset + ACTOR_COUNT_OFFSET)?;
    if reg_count > MAX_REG_COUNT
        || var_count > MAX_VAR_COUNT
        || frame_count > MAX_FRAME_COUNT
        || actor_count > MAX_ACTOR_COUNT
    {
        return None;
    }

    let mut cur = Cursor { bytes, pos: offset };
    cur.advance(SUB_HEADER_SIZE)?;
    cur.advance(reg_count as usize * 2)?;
    let vars_off = cur.pos;
    cur.advance(var_count as usize * 4)?;

    let actors_off = cur.pos;
    for _ in 0..actor_count {
        let name_len = read_u32_le(bytes, cur.pos)?;
        if name_len > MAX_ACTOR_NAME_LEN {
            return None;
        }
        cur.advance(ACTOR_ENTRY_HEADER)?;
        cur.advance(name_len as usize)?;
    }

    let frames_off = cur.pos;
    for _ in 0..frame_count {
        let name_len = read_u16_le(bytes, cur.pos)?;
        cur.advance(FRAME_NAME_PREFIX)?;
        cur.advance(name_len as usize)?;
    }

    Some(ProgramLayout {
        base_off: offset,
        vars_off,
        reg_count,
        var_count,
        frame_count,
        actor_count,
        actors_off,
        frames_off,
        end_off: cur.pos,
    })
}

/// Every structurally valid program block in `bytes`, in offset order.
pub fn scan_program_blocks(bytes: &[u8]) -> Vec<ProgramLayout> {
    bytes
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b == PROGRAM_MARKER)
        .filter_map(|(offset, _)| parse_program_at(bytes, offset))
        .collect()
}

/// Candidate ordering: any variables beat none, then more variables, more
/// actors, more frames, and finally the game payload segment wins.
fn rank(a: &ProgramLocation, b: &ProgramLocation) -> Ordering {
    (a.layout.var_count > 0)
        .cmp(&(b.layout.var_count > 0))
        .then(a.layout.var_count.cmp(&b.layout.var_count))
        .then(a.layout.actor_count.cmp(&b.layout.actor_count))
        .then(a.layout.frame_count.cmp(&b.layout.frame_count))
        .then(a.is_game_payload.cmp(&b.is_game_payload))
}

pub fn detect_program(candidates: &[ProgramCandidate<'_>]) -> Option<ProgramLocation> {
    candidates
        .iter()
        .flat_map(|candidate| {
            scan_program_blocks(candidate.bytes)
                .into_iter()
                .map(move |layout| ProgramLocation {
                    segment: candidate.segment,
                    segment_name: candidate.name.to_string(),
                    is_game_payload: candidate.is_game_payload,
                    layout,
                })
        })
        .fold(None, |best: Option<ProgramLocation>, next| match best {
            Some(current) if rank(&next, &current) != Ordering::Greater => Some(current),
            _ => {
                debug!(
                    segment = %next.segment_name,
                    offset = next.layout.base_off,
                    vars = next.layout.var_count,
                    actors = next.layout.actor_count,
                    "program candidate takes the lead"
                );
                Some(next)
            }
        })
}

/// Game payload first, then the AI segments, then any segment whose name
/// mentions a payload.
pub fn collect_program_candidates(save: &SaveData) -> Vec<ProgramCandidate<'_>> {
    let mut picked: Vec<usize> = Vec::new();
    for index in [save.idx_game_payload, save.idx_ai_groups, save.idx_ai_follow]
        .into_iter()
        .flatten()
    {
        if index < save.segments.len() && !picked.contains(&index) {
            picked.push(index);
        }
    }
    for (index, segment) in save.segments.iter().enumerate() {
        if segment.name.to_ascii_lowercase().contains("payload") && !picked.contains(&index) {
            picked.push(index);
        }
    }

    picked
        .into_iter()
        .map(|index| ProgramCandidate {
            segment: index,
            name: &save.segments[index].name,
            bytes: &save.segments[index].plain,
            is_game_payload: save.idx_game_payload == Some(index),
        })
        .collect()
}

pub fn read_program_vars(bytes: &[u8], layout: &ProgramLayout) -> Option<Vec<f32>> {
    (0..layout.var_count as usize)
        .map(|i| read_f32_le(bytes, layout.vars_off + i * 4))
        .collect()
}

pub fn write_program_var(
    bytes: &mut [u8],
    layout: &ProgramLayout,
    index: usize,
    value: f32,
) -> Result<(), CoreError> {
    if index >= layout.var_count as usize {
        return Err(CoreError::new(
            CoreErrorCode::Rejected,
            format!(
                "program variable {index} out of range (block has {})",
                layout.var_count
            ),
        ));
    }
    if !write_f32_le(bytes, layout.vars_off + index * 4, value) {
        return Err(CoreError::overrun(format!(
            "program variable {index} lies outside the segment"
        )));
    }
    Ok(())
}

pub fn read_program_names(bytes: &[u8], layout: &ProgramLayout) -> Option<ProgramNames> {
    let decode = |raw: &[u8]| {
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        WINDOWS_1252.decode(&raw[..end]).0.into_owned()
    };

    let mut pos = layout.actors_off;
    let mut actors = Vec::with_capacity(layout.actor_count as usize);
    for _ in 0..layout.actor_count {
        let len = read_u32_le(bytes, pos)? as usize;
        let start = pos + ACTOR_ENTRY_HEADER;
        actors.push(decode(bytes.get(start..start + len)?));
        pos = start + len;
    }

    let mut frames = Vec::with_capacity(layout.frame_count as usize);
    for _ in 0..layout.frame_count {
        let len = read_u16_le(bytes, pos)? as usize;
        let start = pos + FRAME_NAME_PREFIX;
        frames.push(decode(bytes.get(start..start + len)?));
        pos = start + len;
    }

    Some(ProgramNames { actors, frames })
}
