//! Orchestrates flowcell preparation: discovers run directories on a
//! machine's storage, checks run completion, loads the track assignment
//! table and writes the sample sheets and demux job configs.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use itertools::Itertools;
use log::{info, warn};
use serde::Deserialize;

use crate::error::PrepError;
use crate::flowcell::IlluminaFlowcell;
use crate::machine::{Machine, Platform};
use crate::run_info::parse_run_info;
use crate::sample_sheet::SampleSheet;
use crate::track::{assign_lanes, BarcodeInfo, LaneMap, LibraryInfo, TrackRecord};

/// Track statuses accepted for demultiplexing: fresh, on sequencer, finished.
pub const DEFAULT_TRACK_STATUS: &[u32] = &[1, 2, 3];

/// One row of the track assignment table.
#[derive(Debug, Deserialize)]
struct TrackRow {
    track_id: u64,
    library_id: u64,
    lane: u32,
    status: u32,
    barcode_id: Option<u64>,
    client: String,
    sample: String,
    barcode_name: String,
    barcode: String,
    barcode2: String,
}

/// The track assignment of one flowcell, with library and barcode lookups
/// resolved eagerly so the core pipeline never touches the source again.
#[derive(Debug)]
pub struct TrackTable {
    records: Vec<TrackRecord>,
    libraries: HashMap<u64, LibraryInfo>,
    barcodes: HashMap<u64, BarcodeInfo>,
}

impl TrackTable {
    /// Loads the assignment table from a CSV file with columns
    /// `track_id,library_id,lane,status,barcode_id,client,sample,
    /// barcode_name,barcode,barcode2`. An empty `barcode_id` means no
    /// barcode was assigned.
    pub fn from_csv(path: &Path) -> Result<TrackTable, PrepError> {
        let mut reader = csv::Reader::from_path(path)?;

        let mut records = Vec::new();
        let mut libraries = HashMap::new();
        let mut barcodes = HashMap::new();

        for row in reader.deserialize() {
            let row: TrackRow = row?;

            records.push(TrackRecord {
                track_id: row.track_id,
                library_id: row.library_id,
                lane: row.lane,
                status: row.status,
                barcode_id: row.barcode_id,
            });
            libraries.insert(
                row.library_id,
                LibraryInfo { client: row.client, sample: row.sample },
            );
            if let Some(barcode_id) = row.barcode_id {
                barcodes.insert(
                    barcode_id,
                    BarcodeInfo { name: row.barcode_name, seq: row.barcode, seq2: row.barcode2 },
                );
            }
        }

        Ok(TrackTable { records, libraries, barcodes })
    }

    /// Resolves the table into a per-lane track map for the flowcell.
    pub fn lane_map(&self, flowcell_code: &str, accepted_status: &[u32]) -> Result<LaneMap, PrepError> {
        assign_lanes(
            flowcell_code,
            &self.records,
            accepted_status,
            |id| self.libraries.get(&id).cloned(),
            |id| self.barcodes.get(&id).cloned(),
        )
    }
}

/// Finds the run directory for a flowcell code on the machine's storage.
/// `Ok(None)` means the instrument has not created the directory yet.
pub fn find_run_dir(machine: &Machine, code: &str) -> Result<Option<String>, PrepError> {
    let entries = fs::read_dir(&machine.storage).map_err(|e| {
        PrepError::Config(format!(
            "storage root {} for machine '{}' is not readable: {}",
            machine.storage.display(),
            machine.name,
            e,
        ))
    })?;

    let mut candidates: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.contains(code) && !name.contains("archived"))
        .collect();
    candidates.sort();

    if candidates.len() > 1 {
        warn!(
            "multiple run directories match flowcell '{}': {:?}, using the first",
            code, candidates,
        );
    }

    Ok(candidates.into_iter().next())
}

/// What happened to a flowcell during one pass of the tool.
#[derive(Debug, PartialEq, Eq)]
pub enum PrepOutcome {
    /// Run directory or RTAComplete.txt missing, try again later
    NotReady,
    /// Platform is prepared by other tooling
    Skipped,
    Prepared { sheets: usize },
}

/// Prepares one flowcell end to end. Missing raw data defers the flowcell
/// instead of failing; real errors abort this flowcell only.
pub fn prepare_flowcell(
    machine: &Machine,
    code: &str,
    table: &TrackTable,
    output_dir: &Path,
) -> Result<PrepOutcome, PrepError> {
    if machine.platform == Platform::PacBio {
        info!("flowcell '{}': PacBio cells are prepared elsewhere", code);
        return Ok(PrepOutcome::Skipped);
    }

    let name = match find_run_dir(machine, code)? {
        Some(name) => name,
        None => {
            info!(
                "flowcell '{}': no run directory on machine '{}' yet",
                code, machine.name,
            );
            return Ok(PrepOutcome::NotReady);
        }
    };

    let flowcell = IlluminaFlowcell::new(machine.clone(), code, &name);
    if !flowcell.is_rta_complete() {
        info!("still sequencing: '{}' on machine '{}'", code, machine.name);
        return Ok(PrepOutcome::NotReady);
    }

    let run_info = parse_run_info(&flowcell.run_info_path())?;
    let lanes = table.lane_map(code, DEFAULT_TRACK_STATUS)?;
    if lanes.is_empty() {
        info!("flowcell '{}': nothing to demultiplex", code);
        return Ok(PrepOutcome::Prepared { sheets: 0 });
    }

    let sheets = flowcell.demux_plan(&run_info, &lanes);
    write_outputs(&sheets, output_dir)?;

    Ok(PrepOutcome::Prepared { sheets: sheets.len() })
}

/// Writes one sample-sheet CSV and one demux job config per mask group.
pub fn write_outputs(sheets: &[SampleSheet], output_dir: &Path) -> Result<(), PrepError> {
    fs::create_dir_all(output_dir)?;

    for sheet in sheets {
        let sheet_path = output_dir.join(format!("{}.csv", sheet.name));
        fs::write(&sheet_path, sheet.to_csv())?;
        info!("wrote sample sheet {}", sheet_path.display());

        let config_path = output_dir.join(format!("{}_demux.yaml", sheet.name));
        let config = format!(
            "samplesheet: {}.csv\nbase_mask: \"{}\"\nlanes: [{}]\nmismatches: {}\n",
            sheet.name,
            sheet.mask,
            sheet.lanes.iter().join(", "),
            sheet.mismatches,
        );
        fs::write(&config_path, config)?;
        info!("wrote demux config {}", config_path.display());
    }

    Ok(())
}
