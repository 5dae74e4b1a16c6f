//! Represents a flowcell as a platform-tagged variant and drives the
//! preparation pipeline for Illumina runs: lane assignment, barcode
//! normalization, base-mask construction and sample-sheet emission, each
//! stage a pure function over already-loaded data.

use std::path::PathBuf;

use itertools::Itertools;

use crate::barcode::normalize_lane;
use crate::base_mask::build_base_mask;
use crate::machine::Machine;
use crate::run_info::RunInfo;
use crate::sample_sheet::{build_sheets, LanePlan, SampleSheet};
use crate::track::LaneMap;

/// Sequencing status of a flowcell as tracked in the facility database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqStatus {
    Fresh = 1,
    OnSequencer = 2,
    Finished = 3,
}

impl SeqStatus {
    pub fn from_db(value: u32) -> Option<SeqStatus> {
        match value {
            1 => Some(SeqStatus::Fresh),
            2 => Some(SeqStatus::OnSequencer),
            3 => Some(SeqStatus::Finished),
            _ => None,
        }
    }
}

/// Pipelining status of a flowcell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeStatus {
    Open,
    Done,
}

/// A flowcell, tagged by the platform of the machine that sequenced it.
#[derive(Debug, Clone)]
pub enum Flowcell {
    Illumina(IlluminaFlowcell),
    PacBio(PacBioCell),
}

impl Flowcell {
    pub fn code(&self) -> &str {
        match self {
            Flowcell::Illumina(fc) => &fc.code,
            Flowcell::PacBio(cell) => &cell.code,
        }
    }
}

/// A PacBio SMRT cell. Preparation for PacBio runs happens elsewhere; this
/// payload only identifies the cell and where its data lives.
#[derive(Debug, Clone)]
pub struct PacBioCell {
    pub code: String,
    pub well: String,
    pub path: PathBuf,
}

/// An Illumina flowcell with its run directory resolved on the machine's
/// storage.
#[derive(Debug, Clone)]
pub struct IlluminaFlowcell {
    pub machine: Machine,
    /// Flowcell id as printed on the consumable
    pub code: String,
    /// Name of the run directory
    pub name: String,
    /// Run number, the instrument and counter fields of the directory name
    pub number: String,
    pub seq_status: SeqStatus,
    pub pipe_status: PipeStatus,
}

impl IlluminaFlowcell {
    pub fn new(machine: Machine, code: &str, name: &str) -> IlluminaFlowcell {
        let number = name.split('_').skip(1).take(2).join("_");

        IlluminaFlowcell {
            machine,
            code: code.to_owned(),
            name: name.to_owned(),
            number,
            seq_status: SeqStatus::OnSequencer,
            pipe_status: PipeStatus::Open,
        }
    }

    /// The run directory on the machine's storage.
    pub fn run_dir(&self) -> PathBuf {
        self.machine.storage.join(&self.name)
    }

    /// `RTAComplete.txt`, written by the instrument when sequencing is done.
    pub fn rta_path(&self) -> PathBuf {
        self.run_dir().join("RTAComplete.txt")
    }

    pub fn run_info_path(&self) -> PathBuf {
        self.run_dir().join("RunInfo.xml")
    }

    /// True once the instrument has finished writing the run.
    pub fn is_rta_complete(&self) -> bool {
        self.rta_path().is_file()
    }

    /// Runs the preparation pipeline over the assigned lanes: normalize each
    /// lane's barcodes, build its base mask, then group lanes by mask into
    /// sample sheets named `{number}_{i}`.
    pub fn demux_plan(&self, run_info: &RunInfo, lanes: &LaneMap) -> Vec<SampleSheet> {
        let index_lengths = run_info.index_lengths();
        let layout = run_info.cycle_layout();
        let single_index = run_info.is_single_index() || self.machine.single_index;

        let plans = lanes
            .iter()
            .map(|(&lane, tracks)| {
                let (tracks, lengths) = normalize_lane(
                    lane,
                    tracks,
                    &index_lengths,
                    single_index,
                    self.machine.reverse_complement,
                );
                let mask = build_base_mask(&layout, lengths);
                (lane, LanePlan { tracks, mask })
            })
            .collect();

        build_sheets(&self.number, &plans, self.machine.reverse_complement)
    }
}
