mod barcode;
mod base_mask;

pub mod error;
pub mod flowcell;
pub mod machine;
pub mod manage;
pub mod run_info;
pub mod sample_sheet;
pub mod track;

pub use barcode::{normalize_lane, reverse_complement, BarcodeLengths};
pub use base_mask::build_base_mask;
