//! Builds the bcl2fastq base-mask string for a lane from the physical cycle
//! layout of the run and the lane's resolved barcode lengths.

use crate::barcode::BarcodeLengths;
use crate::run_info::{BlockKind, CycleBlock};

/// Renders the base mask, one token per physical cycle block, comma-joined
/// in sequencing order. Template reads become `Y{n}`. An index block of
/// physical length L with resolved barcode length B becomes `n{L}` when B is
/// zero, `I{B}n{L-B}` when the barcode is shorter than the block, and `I{L}`
/// otherwise. The string is the grouping identity of the lane: only lanes
/// with byte-identical masks can share a demultiplexing run.
pub fn build_base_mask(layout: &[CycleBlock], lengths: BarcodeLengths) -> String {
    let mut tokens = Vec::new();
    let mut index_position = 0;

    for block in layout {
        match block.kind {
            BlockKind::Read => tokens.push(format!("Y{}", block.cycles)),
            BlockKind::Index => {
                let barcode_len = match index_position {
                    0 => lengths.bc1,
                    1 => lengths.bc2,
                    _ => 0,
                };
                index_position += 1;

                if barcode_len == 0 {
                    tokens.push(format!("n{}", block.cycles));
                } else if barcode_len < block.cycles {
                    tokens.push(format!("I{}n{}", barcode_len, block.cycles - barcode_len));
                } else {
                    tokens.push(format!("I{}", block.cycles));
                }
            }
        }
    }

    tokens.join(",")
}
