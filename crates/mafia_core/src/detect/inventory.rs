use tracing::debug;

use crate::reader::read_u32_le;

/// End of the actor header plus the fixed 382-byte human block.
pub const HUMAN_BLOCK_END: usize = 13 + 382;
pub const HUMAN_INVENTORY_SIZE: usize = 196;

const NAMED_CHUNK_COUNT: usize = 2;
const NAMED_CHUNK_HEADER: usize = 8;
const MAX_CHUNK_NAME_LEN: u32 = 1024;

/// Walks the two length-prefixed chunks that follow the fixed human block and
/// returns where the inventory starts, if a whole inventory fits after them.
pub fn find_human_inventory_offset(payload: &[u8]) -> Option<usize> {
    let mut cursor = HUMAN_BLOCK_END;
    for chunk in 0..NAMED_CHUNK_COUNT {
        let name_len = read_u32_le(payload, cursor)?;
        if name_len > MAX_CHUNK_NAME_LEN {
            debug!(chunk, name_len, "human chunk name length out of range");
            return None;
        }
        cursor = cursor.checked_add(name_len as usize + NAMED_CHUNK_HEADER)?;
        if cursor > payload.len() {
            debug!(chunk, cursor, len = payload.len(), "human chunk overruns payload");
            return None;
        }
    }

    if payload.len() - cursor < HUMAN_INVENTORY_SIZE {
        return None;
    }
    Some(cursor)
}
