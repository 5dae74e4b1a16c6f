//! Error type shared by the flowcell preparation pipeline. Missing raw data
//! is deliberately not represented here: a run that has not finished
//! sequencing is reported as "not ready" by the orchestration layer, while
//! these variants abort preparation of the current flowcell only.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrepError {
    /// Something in the facility configuration does not line up, e.g. a
    /// storage root that does not exist for the machine.
    #[error("configuration error: {0}")]
    Config(String),

    /// A track references a library id with no entry in the lookup.
    #[error("track {track_id} references unknown library {library_id}")]
    UnknownLibrary { track_id: u64, library_id: u64 },

    /// A track references a barcode id with no entry in the lookup.
    #[error("track {track_id} references unknown barcode {barcode_id}")]
    UnknownBarcode { track_id: u64, barcode_id: u64 },

    #[error("could not parse {}: {message}", path.display())]
    RunInfo { path: PathBuf, message: String },

    #[error("error reading track table: {0}")]
    TrackTable(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
