//! Car catalog used by the garage editor.
//!
//! The catalog file has no published format. Two readers are tried: a fixed
//! 168-byte record table, then a scan over printable ASCII runs. When neither
//! yields enough cars the embedded table is used instead.

mod embedded;

use std::fs;
use std::path::{Path, PathBuf};

use encoding_rs::WINDOWS_1252;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core_api::{CoreError, CoreErrorCode};
use crate::reader::read_u32_le;

pub use embedded::embedded_catalog;

pub const CATALOG_RECORD_SIZE: usize = 168;
pub const MIN_CATALOG_ENTRIES: usize = 20;

const TEXT_FIELD_SIZE: usize = 32;
const CODE_OFFSET: usize = 0;
const MODEL_OFFSET: usize = 32;
const SHADOW_OFFSET: usize = 64;
const NAME_OFFSET: usize = 96;
const RACE_MASK_OFFSET: usize = 132;
const CHAMP_MASK_OFFSET: usize = 136;
const FREERIDE_MASK_OFFSET: usize = 160;

const MIN_RUN_LEN: usize = 4;
const RUN_WINDOW: usize = 4;

const CATALOG_SEARCH_PATHS: &[&[&str]] = &[
    &["tables", "carindex.def"],
    &["data", "tables", "carindex.def"],
    &["carindex.def"],
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarageCarCatalogEntry {
    pub index: u32,
    pub code: String,
    pub model: String,
    pub shadow: String,
    pub display_name: String,
    pub race_mask: u32,
    pub champ_mask: u32,
    pub freeride_mask: u32,
    pub masks_known: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogSource {
    File(PathBuf),
    Embedded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GarageCatalog {
    source: CatalogSource,
    entries: Vec<GarageCarCatalogEntry>,
}

impl GarageCatalog {
    /// Searches the usual locations under `game_dir` and falls back to the
    /// embedded table when nothing usable is found.
    pub fn load(game_dir: Option<&Path>) -> Self {
        if let Some(dir) = game_dir {
            for parts in CATALOG_SEARCH_PATHS {
                let Some(path) = resolve_case_insensitive_path(dir, parts) else {
                    continue;
                };
                match Self::from_file(&path) {
                    Ok(catalog) => return catalog,
                    Err(e) => debug!(path = %path.display(), error = %e, "catalog candidate rejected"),
                }
            }
        }
        warn!("no usable garage catalog found, using embedded table");
        Self::embedded()
    }

    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let bytes = fs::read(path).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to read {}: {e}", path.display()),
            )
        })?;
        Ok(Self {
            source: CatalogSource::File(path.to_path_buf()),
            entries: parse_garage_catalog(&bytes)?,
        })
    }

    pub fn embedded() -> Self {
        Self {
            source: CatalogSource::Embedded,
            entries: embedded_catalog(),
        }
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    pub fn entries(&self) -> &[GarageCarCatalogEntry] {
        &self.entries
    }

    pub fn find_by_code(&self, code: &str) -> Option<&GarageCarCatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.code.eq_ignore_ascii_case(code))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parses a catalog file, trying the fixed-record layout before the
/// ASCII-run scan.
pub fn parse_garage_catalog(bytes: &[u8]) -> Result<Vec<GarageCarCatalogEntry>, CoreError> {
    let fixed_err = match parse_fixed_records(bytes) {
        Ok(entries) => {
            debug!(count = entries.len(), "garage catalog read as fixed records");
            return Ok(entries);
        }
        Err(e) => e,
    };
    match parse_ascii_runs(bytes) {
        Ok(entries) => {
            debug!(count = entries.len(), "garage catalog read from ASCII runs");
            Ok(entries)
        }
        Err(runs_err) => Err(CoreError::new(
            CoreErrorCode::NoViableCandidate,
            format!(
                "garage catalog unreadable: fixed records: {}; ascii runs: {}",
                fixed_err.message, runs_err.message
            ),
        )),
    }
}

fn parse_fixed_records(bytes: &[u8]) -> Result<Vec<GarageCarCatalogEntry>, CoreError> {
    if bytes.is_empty() || bytes.len() % CATALOG_RECORD_SIZE != 0 {
        return Err(CoreError::size_mismatch(format!(
            "{} bytes is not a whole number of {CATALOG_RECORD_SIZE}-byte records",
            bytes.len()
        )));
    }
    let record_count = bytes.len() / CATALOG_RECORD_SIZE;
    if record_count < MIN_CATALOG_ENTRIES {
        return Err(CoreError::size_mismatch(format!(
            "{record_count} records, need at least {MIN_CATALOG_ENTRIES}"
        )));
    }

    let mut entries = Vec::new();
    for (index, record) in bytes.chunks_exact(CATALOG_RECORD_SIZE).enumerate() {
        let code = text_field(record, CODE_OFFSET);
        let model = text_field(record, MODEL_OFFSET);
        let shadow = text_field(record, SHADOW_OFFSET);
        let name = text_field(record, NAME_OFFSET);
        if !matches_car_tuple(code, model, shadow, name) {
            continue;
        }
        entries.push(GarageCarCatalogEntry {
            index: index as u32,
            code: decode_ansi(code),
            model: decode_ansi(model),
            shadow: decode_ansi(shadow),
            display_name: decode_ansi(name),
            race_mask: read_u32_le(record, RACE_MASK_OFFSET).unwrap_or_default(),
            champ_mask: read_u32_le(record, CHAMP_MASK_OFFSET).unwrap_or_default(),
            freeride_mask: read_u32_le(record, FREERIDE_MASK_OFFSET).unwrap_or_default(),
            masks_known: true,
        });
    }

    if entries.len() < MIN_CATALOG_ENTRIES {
        return Err(CoreError::new(
            CoreErrorCode::Rejected,
            format!(
                "only {} of {record_count} records passed validation, need {MIN_CATALOG_ENTRIES}",
                entries.len()
            ),
        ));
    }
    Ok(entries)
}

fn parse_ascii_runs(bytes: &[u8]) -> Result<Vec<GarageCarCatalogEntry>, CoreError> {
    let runs = printable_runs(bytes);
    let mut entries = Vec::new();
    let mut i = 0usize;
    while i + RUN_WINDOW <= runs.len() {
        let (code, model, shadow, name) = (runs[i], runs[i + 1], runs[i + 2], runs[i + 3]);
        if matches_car_tuple(code, model, shadow, name) {
            entries.push(GarageCarCatalogEntry {
                index: entries.len() as u32,
                code: decode_ansi(code),
                model: decode_ansi(model),
                shadow: decode_ansi(shadow),
                display_name: decode_ansi(name),
                race_mask: 0,
                champ_mask: 0,
                freeride_mask: 0,
                masks_known: false,
            });
            i += RUN_WINDOW;
        } else {
            i += 1;
        }
    }

    if entries.len() < MIN_CATALOG_ENTRIES {
        return Err(CoreError::new(
            CoreErrorCode::Rejected,
            format!(
                "found {} car tuples in {} text runs, need {MIN_CATALOG_ENTRIES}",
                entries.len(),
                runs.len()
            ),
        ));
    }
    Ok(entries)
}

/// Maximal runs of printable ASCII at least `MIN_RUN_LEN` long.
fn printable_runs(bytes: &[u8]) -> Vec<&[u8]> {
    bytes
        .split(|b| !(0x20..=0x7E).contains(b))
        .filter(|run| run.len() >= MIN_RUN_LEN)
        .collect()
}

/// Bytes of a fixed text field up to its first NUL.
fn text_field(record: &[u8], offset: usize) -> &[u8] {
    let field = &record[offset..offset + TEXT_FIELD_SIZE];
    let end = field.iter().position(|&b| b == 0).unwrap_or(TEXT_FIELD_SIZE);
    &field[..end]
}

fn decode_ansi(raw: &[u8]) -> String {
    WINDOWS_1252.decode(raw).0.into_owned()
}

fn matches_car_tuple(code: &[u8], model: &[u8], shadow: &[u8], name: &[u8]) -> bool {
    is_car_code(code) && is_i3d_path(model) && is_i3d_path(shadow) && is_display_name(name)
}

fn is_car_code(raw: &[u8]) -> bool {
    (3..=24).contains(&raw.len()) && raw.iter().all(|&b| b.is_ascii_alphanumeric() || b == b'_')
}

fn is_i3d_path(raw: &[u8]) -> bool {
    const SUFFIX: &[u8] = b".i3d";
    raw.len() > SUFFIX.len() && raw[raw.len() - SUFFIX.len()..].eq_ignore_ascii_case(SUFFIX)
}

fn is_display_name(raw: &[u8]) -> bool {
    (3..=64).contains(&raw.len())
        && raw.iter().all(|&b| {
            b.is_ascii_alphabetic() || matches!(b, b' ' | b'-' | b'.' | b'\'') || b >= 0x80
        })
}

fn resolve_case_insensitive_path(base: &Path, parts: &[&str]) -> Option<PathBuf> {
    let mut current = base.to_path_buf();
    for part in parts {
        current = resolve_case_insensitive_component(&current, part)?;
    }
    current.is_file().then_some(current)
}

fn resolve_case_insensitive_component(base: &Path, part: &str) -> Option<PathBuf> {
    let direct = base.join(part);
    if direct.exists() {
        return Some(direct);
    }

    let entries = fs::read_dir(base).ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        if name.to_string_lossy().eq_ignore_ascii_case(part) {
            return Some(entry.path());
        }
    }
    None
}
