//! Save codecs and binary layout detectors for Mafia (2002) save files.

pub mod cipher;
pub mod core_api;
pub mod detect;
pub mod garage;
pub mod layout;
pub mod profile;
pub mod reader;
pub mod segment;
pub mod variants;
