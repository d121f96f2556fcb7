//! Structural detectors for untyped segment payloads.

pub mod coord_layout;
pub mod inventory;
pub mod program;

pub use coord_layout::{
    ActorKind, Capability, CoordLayout, FieldGroup, FieldKind, FieldSpec, FieldValue,
    detect_coord_layout,
};
pub use inventory::{HUMAN_INVENTORY_SIZE, find_human_inventory_offset};
pub use program::{
    ProgramCandidate, ProgramLayout, ProgramLocation, ProgramNames, collect_program_candidates,
    detect_program, read_program_names, read_program_vars, scan_program_blocks,
    write_program_var,
};
