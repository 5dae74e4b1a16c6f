//! Deserializes the `RunInfo.xml` file written by an Illumina instrument into
//! the physical cycle layout of the run: which blocks of cycles are template
//! reads and which are index reads.

use std::fs::File;
use std::path::Path;

use log::info;
use serde::{de, Deserialize};
use serde_xml_rs::from_reader;

use crate::error::PrepError;

/// Whether a block of cycles is a template read or an index read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Read,
    Index,
}

/// One block of consecutive cycles in physical sequencing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleBlock {
    pub kind: BlockKind,
    pub cycles: usize,
}

/// The top-level struct for the contents of RunInfo.xml
#[derive(Debug, PartialEq, Eq)]
pub struct RunInfo {
    /// Version number of this file (depends on the sequencer)
    pub version: u32,
    /// Full run id string (date, instrument, number, flowcell)
    pub id: String,
    /// Flowcell serial number
    pub flowcell: String,
    /// Instrument serial number/identifier
    pub instrument: String,
    /// The date and time of the run
    pub date: String,
    /// Format of the run: number of reads, read lengths, and which are indexes
    pub reads: Vec<Read>,
    /// Flowcell information, reduced to what preparation needs
    pub flowcell_layout: FlowcellLayout,
}

impl RunInfo {
    /// The physical cycle layout in sequencing order, one block per read.
    pub fn cycle_layout(&self) -> Vec<CycleBlock> {
        self.reads
            .iter()
            .map(|r| CycleBlock {
                kind: if r.is_indexed_read {
                    BlockKind::Index
                } else {
                    BlockKind::Read
                },
                cycles: r.num_cycles,
            })
            .collect()
    }

    /// Cycle counts of the index reads, in sequencing order.
    pub fn index_lengths(&self) -> Vec<usize> {
        self.reads
            .iter()
            .filter(|r| r.is_indexed_read)
            .map(|r| r.num_cycles)
            .collect()
    }

    /// Cycle counts of the template reads, in sequencing order.
    pub fn read_lengths(&self) -> Vec<usize> {
        self.reads
            .iter()
            .filter(|r| !r.is_indexed_read)
            .map(|r| r.num_cycles)
            .collect()
    }

    /// True when the run sequenced exactly one index read. All second
    /// barcodes are dropped during normalization in that case.
    pub fn is_single_index(&self) -> bool {
        self.index_lengths().len() == 1
    }
}

/// Deserialize RunInfo, including flattening the inner Run struct
/// into the top level
impl<'de> Deserialize<'de> for RunInfo {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Outer {
            #[serde(rename = "Version")]
            version: u32,
            #[serde(rename = "Run")]
            run: Inner,
        }

        #[derive(Deserialize)]
        struct Inner {
            #[serde(rename = "Id")]
            id: String,
            #[serde(rename = "Flowcell")]
            flowcell: String,
            #[serde(rename = "Instrument")]
            instrument: String,
            #[serde(rename = "Date")]
            date: String,
            #[serde(rename = "Reads", deserialize_with = "reads_to_vec")]
            reads: Vec<Read>,
            #[serde(rename = "FlowcellLayout")]
            flowcell_layout: FlowcellLayout,
        }

        #[derive(Deserialize)]
        struct Reads {
            #[serde(rename = "Read")]
            read: Vec<Read>,
        }

        fn reads_to_vec<'de, D>(deserializer: D) -> Result<Vec<Read>, D::Error>
        where
            D: de::Deserializer<'de>,
        {
            let reads = Reads::deserialize(deserializer)?;

            Ok(reads.read)
        }

        let helper = Outer::deserialize(deserializer)?;

        Ok(RunInfo {
            version: helper.version,
            id: helper.run.id,
            flowcell: helper.run.flowcell,
            instrument: helper.run.instrument,
            date: helper.run.date,
            reads: helper.run.reads,
            flowcell_layout: helper.run.flowcell_layout,
        })
    }
}

/// Information about one of the reads in a run
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct Read {
    /// Which read this is
    #[serde(rename = "Number")]
    pub number: u64,
    /// How many cycles (e.g. bases) in the read
    #[serde(rename = "NumCycles")]
    pub num_cycles: usize,
    /// Whether or not it is an index read
    #[serde(rename = "IsIndexedRead", deserialize_with = "bool_from_string")]
    pub is_indexed_read: bool,
}

/// Convert from Y or N character to a boolean
fn bool_from_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: de::Deserializer<'de>,
{
    match String::deserialize(deserializer)?.as_ref() {
        "Y" => Ok(true),
        "N" => Ok(false),
        other => Err(de::Error::invalid_value(
            de::Unexpected::Str(other),
            &"Y or N",
        )),
    }
}

/// Information about the flowcell used in the run
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct FlowcellLayout {
    /// Number of lanes
    #[serde(rename = "LaneCount")]
    pub lane_count: usize,
}

/// Parse a `RunInfo.xml` file into a `RunInfo` struct
pub fn parse_run_info(run_info_path: &Path) -> Result<RunInfo, PrepError> {
    let run_xml = File::open(run_info_path)?;

    let run_info: RunInfo = from_reader(run_xml).map_err(|e| PrepError::RunInfo {
        path: run_info_path.to_path_buf(),
        message: e.to_string(),
    })?;

    info!(
        "run '{}': {} read(s) {:?} - {} index read(s) {:?}",
        run_info.id,
        run_info.read_lengths().len(),
        run_info.read_lengths(),
        run_info.index_lengths().len(),
        run_info.index_lengths(),
    );

    Ok(run_info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        let path = Path::new("test_data/200411_NS500550_0123_AHGKJ7BGXF/RunInfo.xml");
        let actual_run_info = parse_run_info(path).unwrap();
        let expected_run_info = RunInfo {
            version: 4,
            id: "200411_NS500550_0123_AHGKJ7BGXF".to_owned(),
            flowcell: "AHGKJ7BGXF".to_owned(),
            instrument: "NS500550".to_owned(),
            date: "200411".to_owned(),
            reads: vec![
                Read { number: 1, num_cycles: 76, is_indexed_read: false },
                Read { number: 2, num_cycles: 10, is_indexed_read: true },
                Read { number: 3, num_cycles: 10, is_indexed_read: true },
                Read { number: 4, num_cycles: 76, is_indexed_read: false },
            ],
            flowcell_layout: FlowcellLayout { lane_count: 4 },
        };
        assert_eq!(actual_run_info, expected_run_info);
    }

    #[test]
    fn derived_views() {
        let path = Path::new("test_data/200411_NS500550_0123_AHGKJ7BGXF/RunInfo.xml");
        let run_info = parse_run_info(path).unwrap();

        assert_eq!(run_info.read_lengths(), vec![76, 76]);
        assert_eq!(run_info.index_lengths(), vec![10, 10]);
        assert!(!run_info.is_single_index());
        assert_eq!(
            run_info.cycle_layout(),
            vec![
                CycleBlock { kind: BlockKind::Read, cycles: 76 },
                CycleBlock { kind: BlockKind::Index, cycles: 10 },
                CycleBlock { kind: BlockKind::Index, cycles: 10 },
                CycleBlock { kind: BlockKind::Read, cycles: 76 },
            ]
        );
    }

    #[test]
    fn single_index() {
        let run_info = RunInfo {
            version: 2,
            id: "180123_M00123_0001_000000000-ABCDE".to_owned(),
            flowcell: "000000000-ABCDE".to_owned(),
            instrument: "M00123".to_owned(),
            date: "180123".to_owned(),
            reads: vec![
                Read { number: 1, num_cycles: 151, is_indexed_read: false },
                Read { number: 2, num_cycles: 8, is_indexed_read: true },
                Read { number: 3, num_cycles: 151, is_indexed_read: false },
            ],
            flowcell_layout: FlowcellLayout { lane_count: 1 },
        };

        assert!(run_info.is_single_index());
        assert_eq!(run_info.index_lengths(), vec![8]);
    }

    #[test]
    fn no_file() {
        let path = Path::new("test_data/no_RunInfo.xml");
        assert!(parse_run_info(path).is_err());
    }
}
