//! Encrypted profile save (`forP`, version 1).
//!
//! A 24-byte clear header followed by four blocks encrypted under one
//! continuing cipher state, always in the order core, 720, 92, 156.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cipher::{CipherState, decrypt_in_place, encrypt_in_place};
use crate::core_api::{CoreError, CoreErrorCode};
use crate::layout::{FileLayout, SectionId};
use crate::reader::{read_u32_le, write_u32_le};

pub const FILE_HEADER_SIZE: usize = 24;
pub const CORE_SIZE: usize = 84;
pub const BLOCK720_SIZE: usize = 720;
pub const BLOCK92_SIZE: usize = 92;
pub const BLOCK156_SIZE: usize = 156;
pub const PROFILE_FILE_SIZE: usize =
    FILE_HEADER_SIZE + CORE_SIZE + BLOCK720_SIZE + BLOCK92_SIZE + BLOCK156_SIZE;

pub const MAGIC_FORP: u32 = 0x5072_6F66;
pub const VERSION_1: u32 = 1;

const HEADER_VERSION_OFFSET: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileBlock {
    Core,
    Block720,
    Block92,
    Block156,
}

impl ProfileBlock {
    pub const ALL: [ProfileBlock; 4] = [
        ProfileBlock::Core,
        ProfileBlock::Block720,
        ProfileBlock::Block92,
        ProfileBlock::Block156,
    ];

    pub fn size(self) -> usize {
        match self {
            Self::Core => CORE_SIZE,
            Self::Block720 => BLOCK720_SIZE,
            Self::Block92 => BLOCK92_SIZE,
            Self::Block156 => BLOCK156_SIZE,
        }
    }

    fn section_id(self) -> SectionId {
        match self {
            Self::Core => SectionId::Core,
            Self::Block720 => SectionId::Block720,
            Self::Block92 => SectionId::Block92,
            Self::Block156 => SectionId::Block156,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Block720 => "block720",
            Self::Block92 => "block92",
            Self::Block156 => "block156",
        }
    }
}

/// Decrypted profile contents. Blocks are plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSaveData {
    pub file_header: [u8; FILE_HEADER_SIZE],
    pub core: Vec<u8>,
    pub block720: Vec<u8>,
    pub block92: Vec<u8>,
    pub block156: Vec<u8>,
}

impl ProfileSaveData {
    pub fn parse(raw: &[u8]) -> Result<Self, CoreError> {
        if raw.len() != PROFILE_FILE_SIZE {
            return Err(CoreError::size_mismatch(format!(
                "unexpected profile size {}, expected {PROFILE_FILE_SIZE}",
                raw.len()
            )));
        }

        let mut file_header = [0u8; FILE_HEADER_SIZE];
        file_header.copy_from_slice(&raw[..FILE_HEADER_SIZE]);

        let mut cursor = FILE_HEADER_SIZE;
        let mut state = CipherState::seeded();
        let mut next_block = |size: usize| {
            let mut block = raw[cursor..cursor + size].to_vec();
            decrypt_in_place(&mut block, &mut state);
            cursor += size;
            block
        };
        let core = next_block(CORE_SIZE);
        let block720 = next_block(BLOCK720_SIZE);
        let block92 = next_block(BLOCK92_SIZE);
        let block156 = next_block(BLOCK156_SIZE);

        if read_u32_le(&file_header, 0) != Some(MAGIC_FORP)
            || read_u32_le(&file_header, HEADER_VERSION_OFFSET) != Some(VERSION_1)
        {
            return Err(CoreError::new(
                CoreErrorCode::Integrity,
                "invalid profile file header (expected forP/version 1)",
            ));
        }
        if read_u32_le(&core, 0) != Some(MAGIC_FORP) || read_u32_le(&core, 4) != Some(VERSION_1)
        {
            return Err(CoreError::new(
                CoreErrorCode::Integrity,
                "invalid decrypted core block (forP/version 1 mismatch)",
            ));
        }

        debug!("parsed profile save");
        Ok(Self {
            file_header,
            core,
            block720,
            block92,
            block156,
        })
    }

    pub fn build(&self) -> Result<Vec<u8>, CoreError> {
        for block in ProfileBlock::ALL {
            let len = self.block(block).len();
            if len != block.size() {
                return Err(CoreError::size_mismatch(format!(
                    "profile {} is {len} bytes, expected {}",
                    block.name(),
                    block.size()
                )));
            }
        }

        let mut raw = Vec::with_capacity(PROFILE_FILE_SIZE);
        raw.extend_from_slice(&self.file_header);

        let mut state = CipherState::seeded();
        for block in ProfileBlock::ALL {
            let start = raw.len();
            raw.extend_from_slice(self.block(block));
            encrypt_in_place(&mut raw[start..], &mut state);
        }
        Ok(raw)
    }

    pub fn block(&self, block: ProfileBlock) -> &[u8] {
        match block {
            ProfileBlock::Core => &self.core,
            ProfileBlock::Block720 => &self.block720,
            ProfileBlock::Block92 => &self.block92,
            ProfileBlock::Block156 => &self.block156,
        }
    }

    pub fn block_mut(&mut self, block: ProfileBlock) -> &mut Vec<u8> {
        match block {
            ProfileBlock::Core => &mut self.core,
            ProfileBlock::Block720 => &mut self.block720,
            ProfileBlock::Block92 => &mut self.block92,
            ProfileBlock::Block156 => &mut self.block156,
        }
    }

    pub fn u32_at(&self, block: ProfileBlock, offset: usize) -> Option<u32> {
        read_u32_le(self.block(block), offset)
    }

    pub fn set_u32_at(
        &mut self,
        block: ProfileBlock,
        offset: usize,
        value: u32,
    ) -> Result<(), CoreError> {
        if block == ProfileBlock::Core && offset < 8 {
            return Err(CoreError::new(
                CoreErrorCode::UnsupportedOperation,
                "core magic/version words are not editable",
            ));
        }
        if !write_u32_le(self.block_mut(block), offset, value) {
            return Err(CoreError::overrun(format!(
                "offset {offset} is outside profile {} ({} bytes)",
                block.name(),
                block.size()
            )));
        }
        Ok(())
    }

    pub fn layout() -> FileLayout {
        let mut parts = vec![(SectionId::FileHeader, FILE_HEADER_SIZE, false)];
        parts.extend(
            ProfileBlock::ALL
                .iter()
                .map(|b| (b.section_id(), b.size(), true)),
        );
        FileLayout::sequential(&parts)
    }
}
