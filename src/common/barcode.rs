//! Reconciles the barcodes of all tracks sharing a lane into one consistent
//! barcode length pair, so that a single base mask can describe the lane.

use itertools::{Itertools, MinMaxResult};
use log::info;

use crate::track::Track;

/// The effective barcode lengths of a lane after normalization. A length of
/// zero means no barcode data is used for that index position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarcodeLengths {
    pub bc1: usize,
    pub bc2: usize,
}

/// Returns the reverse complement of a nucleotide sequence. A/T and C/G are
/// swapped case-preservingly; N and any character outside ACGTN pass through
/// unchanged.
pub fn reverse_complement(seq: &str) -> String {
    seq.chars()
        .rev()
        .map(|c| match c {
            'A' => 'T',
            'C' => 'G',
            'G' => 'C',
            'T' => 'A',
            'a' => 't',
            'c' => 'g',
            'g' => 'c',
            't' => 'a',
            other => other,
        })
        .collect()
}

fn truncated(seq: &str, len: usize) -> String {
    seq.chars().take(len).collect()
}

/// min length, max length, and whether any sequence is empty
fn length_extrema<'a>(seqs: impl Iterator<Item = &'a str>) -> (usize, usize, bool) {
    let lengths: Vec<usize> = seqs.map(|s| s.chars().count()).collect();

    let (min, max) = match lengths.iter().copied().minmax() {
        MinMaxResult::NoElements => (0, 0),
        MinMaxResult::OneElement(l) => (l, l),
        MinMaxResult::MinMax(min, max) => (min, max),
    };

    (min, max, lengths.iter().any(|&l| l == 0))
}

/// Normalizes the tracks of one lane to a single effective barcode length
/// pair, in precedence order:
///
/// 1. a single-index run (or machine) drops every second barcode
/// 2. one empty second barcode in the lane empties them all
/// 3. one empty first barcode collapses the lane to a single unbarcoded track
/// 4. differing lengths are cut to the lane minimum, then to the physical
///    index cycle count, keeping leading characters
/// 5. instruments that read index2 on the opposite strand get the truncated
///    second barcode reverse-complemented
///
/// The returned tracks are sorted by (client, library) so sample-sheet row
/// order is reproducible.
pub fn normalize_lane(
    lane: u32,
    tracks: &[Track],
    index_lengths: &[usize],
    single_index: bool,
    reverse_complement_index2: bool,
) -> (Vec<Track>, BarcodeLengths) {
    let mut tracks = tracks.to_vec();
    tracks.sort_by(|a, b| (&a.client, &a.library).cmp(&(&b.client, &b.library)));

    if tracks.is_empty() {
        return (tracks, BarcodeLengths { bc1: 0, bc2: 0 });
    }

    let (min1, max1, empty1) = length_extrema(tracks.iter().map(|t| t.barcode.as_str()));
    let (min2, max2, mut empty2) = length_extrema(tracks.iter().map(|t| t.barcode2.as_str()));

    let mut lengths = BarcodeLengths { bc1: min1, bc2: min2 };

    if empty2 || single_index {
        for track in tracks.iter_mut() {
            track.barcode2.clear();
        }
        lengths.bc2 = 0;
        empty2 = true;
    }

    if empty1 {
        // barcodes must be uniformly present within a lane, so one missing
        // first barcode makes the whole lane unbarcoded
        info!(
            "lane {}: some first barcodes are empty, reducing lane to a single track",
            lane
        );
        let mut only = tracks.swap_remove(0);
        only.barcode.clear();
        only.barcode2.clear();
        return (vec![only], BarcodeLengths { bc1: 0, bc2: 0 });
    }

    for track in tracks.iter_mut() {
        if min1 != max1 {
            track.barcode = truncated(&track.barcode, min1);
        }
        if let Some(&physical) = index_lengths.get(0) {
            if min1 > physical {
                track.barcode = truncated(&track.barcode, physical);
            }
        }

        if !single_index && !empty2 {
            if min2 != max2 {
                track.barcode2 = truncated(&track.barcode2, min2);
            }
            if let Some(&physical) = index_lengths.get(1) {
                if min2 > physical {
                    track.barcode2 = truncated(&track.barcode2, physical);
                }
            }
            if reverse_complement_index2 {
                track.barcode2 = reverse_complement(&track.barcode2);
            }
        }
    }

    (tracks, lengths)
}
