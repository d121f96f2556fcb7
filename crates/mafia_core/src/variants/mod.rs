//! Unencrypted companion files: `mrprofile`, `mrtimes` and `mrseg0`.
//!
//! All three are plain little-endian records with strict size checks.

pub mod mr_profile;
pub mod mr_seg0;
pub mod mr_times;

use std::io;

use crate::core_api::{CoreError, CoreErrorCode};

pub use mr_profile::{MR_PROFILE_FILE_SIZE, MR_PROFILE_WORD_COUNT, MrProfileSaveData};
pub use mr_seg0::{MrSeg0Point, MrSeg0SaveData};
pub use mr_times::{MrTimesRecord, MrTimesSaveData};

fn truncated(what: &str, e: io::Error) -> CoreError {
    CoreError::new(CoreErrorCode::Overrun, format!("{what} truncated: {e}"))
}
