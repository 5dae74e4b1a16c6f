//! Builds the per-lane track assignment of a flowcell from raw track rows
//! plus lookups that resolve library and barcode references.

use std::collections::BTreeMap;

use log::{info, warn};

use crate::error::PrepError;

/// One raw track row as stored in the assignment source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRecord {
    pub track_id: u64,
    pub library_id: u64,
    /// Physical lane (compartment) the library was loaded into
    pub lane: u32,
    pub status: u32,
    /// None when no barcode was assigned to the library
    pub barcode_id: Option<u64>,
}

/// The resolution of a library through its sample to the owning client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryInfo {
    pub client: String,
    pub sample: String,
}

/// Barcode sequences for a barcode id. Either sequence may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeInfo {
    pub name: String,
    pub seq: String,
    pub seq2: String,
}

/// Name synthesized for tracks that carry no barcode assignment.
pub const NO_BARCODE: &str = "NoBarcode";

/// One library loaded into one lane, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Owning client id
    pub client: String,
    /// Library label, `L{library_id}_Track-{track_id}`
    pub library: String,
    /// Sample display name, spaces replaced by underscores
    pub sample: String,
    pub barcode_name: String,
    pub barcode: String,
    pub barcode2: String,
}

/// Lane number mapped to the tracks loaded into it, in assignment order.
pub type LaneMap = BTreeMap<u32, Vec<Track>>;

/// Resolves raw track rows into a per-lane map of tracks. Rows whose status
/// is not in `accepted_status` are skipped; rows without a barcode get the
/// `NoBarcode` sentinel with empty sequences. An empty result is valid and
/// means there is nothing to demultiplex.
pub fn assign_lanes<L, B>(
    flowcell_code: &str,
    records: &[TrackRecord],
    accepted_status: &[u32],
    library_info: L,
    barcode_info: B,
) -> Result<LaneMap, PrepError>
where
    L: Fn(u64) -> Option<LibraryInfo>,
    B: Fn(u64) -> Option<BarcodeInfo>,
{
    let mut lanes = LaneMap::new();

    for record in records {
        if !accepted_status.contains(&record.status) {
            continue;
        }

        let library = library_info(record.library_id).ok_or(PrepError::UnknownLibrary {
            track_id: record.track_id,
            library_id: record.library_id,
        })?;

        let barcode = match record.barcode_id {
            Some(barcode_id) => barcode_info(barcode_id).ok_or(PrepError::UnknownBarcode {
                track_id: record.track_id,
                barcode_id,
            })?,
            None => BarcodeInfo {
                name: NO_BARCODE.to_owned(),
                seq: String::new(),
                seq2: String::new(),
            },
        };

        lanes.entry(record.lane).or_insert_with(Vec::new).push(Track {
            client: library.client,
            library: format!("L{}_Track-{}", record.library_id, record.track_id),
            sample: library.sample.replace(' ', "_"),
            barcode_name: barcode.name,
            barcode: barcode.seq,
            barcode2: barcode.seq2,
        });
    }

    log_lane_stats(flowcell_code, &lanes);

    Ok(lanes)
}

/// Counts tracks per lane and logs a summary for the flowcell.
pub fn log_lane_stats(flowcell_code: &str, lanes: &LaneMap) -> Vec<usize> {
    let counts: Vec<usize> = lanes.values().map(|tracks| tracks.len()).collect();

    if counts.is_empty() {
        warn!("flowcell '{}' has no lanes and tracks", flowcell_code);
    } else {
        info!(
            "flowcell '{}' has {} lane(s) with {} track(s) ({:?})",
            flowcell_code,
            counts.len(),
            counts.iter().sum::<usize>(),
            counts,
        );
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn libraries() -> HashMap<u64, LibraryInfo> {
        let mut map = HashMap::new();
        map.insert(
            25268,
            LibraryInfo { client: "mehmetc".to_owned(), sample: "liver rep 1".to_owned() },
        );
        map.insert(
            25269,
            LibraryInfo { client: "annab".to_owned(), sample: "kidney".to_owned() },
        );
        map
    }

    fn barcodes() -> HashMap<u64, BarcodeInfo> {
        let mut map = HashMap::new();
        map.insert(
            7,
            BarcodeInfo {
                name: "ILL_MAR15_7-54".to_owned(),
                seq: "CTGTATGC".to_owned(),
                seq2: "".to_owned(),
            },
        );
        map
    }

    #[test]
    fn resolves_and_groups() {
        let records = vec![
            TrackRecord { track_id: 57024, library_id: 25268, lane: 1, status: 2, barcode_id: Some(7) },
            TrackRecord { track_id: 57025, library_id: 25269, lane: 1, status: 2, barcode_id: None },
            TrackRecord { track_id: 57026, library_id: 25268, lane: 2, status: 4, barcode_id: Some(7) },
        ];
        let libs = libraries();
        let bcs = barcodes();

        let lanes = assign_lanes(
            "AHGKJ7BGXF",
            &records,
            &[1, 2, 3],
            |id| libs.get(&id).cloned(),
            |id| bcs.get(&id).cloned(),
        )
        .unwrap();

        // lane 2's only track has a filtered status
        assert_eq!(lanes.len(), 1);
        let lane1 = &lanes[&1];
        assert_eq!(lane1.len(), 2);
        assert_eq!(lane1[0].library, "L25268_Track-57024");
        assert_eq!(lane1[0].sample, "liver_rep_1");
        assert_eq!(lane1[0].barcode, "CTGTATGC");
        assert_eq!(lane1[1].barcode_name, NO_BARCODE);
        assert_eq!(lane1[1].barcode, "");
        assert_eq!(lane1[1].barcode2, "");
        assert_eq!(log_lane_stats("AHGKJ7BGXF", &lanes), vec![2]);
    }

    #[test]
    fn empty_result_is_valid() {
        let lanes = assign_lanes(
            "AHGKJ7BGXF",
            &[],
            &[1, 2, 3],
            |_| None,
            |_| None,
        )
        .unwrap();
        assert!(lanes.is_empty());
    }

    #[test]
    fn unknown_library_is_an_error() {
        let records = vec![TrackRecord {
            track_id: 1,
            library_id: 99,
            lane: 1,
            status: 2,
            barcode_id: None,
        }];
        let result = assign_lanes("X", &records, &[2], |_| None, |_| None);
        assert!(matches!(
            result,
            Err(PrepError::UnknownLibrary { track_id: 1, library_id: 99 })
        ));
    }

    #[test]
    fn unknown_barcode_is_an_error() {
        let records = vec![TrackRecord {
            track_id: 1,
            library_id: 25268,
            lane: 1,
            status: 2,
            barcode_id: Some(42),
        }];
        let libs = libraries();
        let result = assign_lanes("X", &records, &[2], |id| libs.get(&id).cloned(), |_| None);
        assert!(matches!(
            result,
            Err(PrepError::UnknownBarcode { track_id: 1, barcode_id: 42 })
        ));
    }
}
