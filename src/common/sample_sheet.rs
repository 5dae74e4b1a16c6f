//! Groups lanes by their base mask and renders one sample sheet per group.
//! Lanes whose masks differ resolve different index lengths and cannot share
//! one bcl-conversion invocation.

use std::collections::BTreeMap;

use crate::track::Track;

/// Column header of the rendered sheet, consumed verbatim downstream.
pub const SHEET_HEADER: &str = "Sample_ID,Sample_Name,Sample_Project,Lane,index,index2";

/// Mismatches allowed per index position when demultiplexing a sheet.
pub const INDEX_MISMATCHES: usize = 1;

/// A normalized lane ready for sheet rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanePlan {
    /// Tracks in normalizer order (sorted by client, library)
    pub tracks: Vec<Track>,
    /// Base mask resolved for this lane
    pub mask: String,
}

/// One demultiplexing configuration: all lanes sharing a base mask and the
/// sample-sheet rows for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSheet {
    /// Synthetic sheet name, `{flowcell_number}_{i}` with i starting at 1
    pub name: String,
    pub mask: String,
    /// Lanes contributing to this sheet, ascending
    pub lanes: Vec<u32>,
    /// Rendered rows, lanes ascending, tracks in normalizer order
    pub rows: Vec<String>,
    pub mismatches: usize,
}

impl SampleSheet {
    /// Renders the full sheet text: `[Data]` section, header, rows.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("[Data]\n");
        out.push_str(SHEET_HEADER);
        out.push('\n');
        for row in &self.rows {
            out.push_str(row);
            out.push('\n');
        }
        out
    }
}

/// `Sample_ID,Sample_Name,Sample_Project,Lane,index,index2` with both id and
/// name set to the library label. The lane column stays blank on instruments
/// whose reverse-complement convention omits explicit lane binning.
fn render_row(track: &Track, lane: Option<u32>) -> String {
    let lane = lane.map(|l| l.to_string()).unwrap_or_default();
    format!(
        "{},{},{},{},{},{}",
        track.library, track.library, track.client, lane, track.barcode, track.barcode2,
    )
}

/// Partitions lanes into sheets by exact base-mask string. Group order is
/// the first-seen order when walking lanes ascending, which also numbers the
/// sheets deterministically.
pub fn build_sheets(
    flowcell_number: &str,
    lanes: &BTreeMap<u32, LanePlan>,
    reverse_complement: bool,
) -> Vec<SampleSheet> {
    let mut groups: Vec<(String, Vec<u32>)> = Vec::new();

    for (&lane, plan) in lanes {
        match groups.iter_mut().find(|(mask, _)| *mask == plan.mask) {
            Some((_, members)) => members.push(lane),
            None => groups.push((plan.mask.clone(), vec![lane])),
        }
    }

    groups
        .into_iter()
        .enumerate()
        .map(|(i, (mask, members))| {
            let mut rows = Vec::new();
            for &lane in &members {
                let lane_column = if reverse_complement { None } else { Some(lane) };
                for track in &lanes[&lane].tracks {
                    rows.push(render_row(track, lane_column));
                }
            }

            SampleSheet {
                name: format!("{}_{}", flowcell_number, i + 1),
                mask,
                lanes: members,
                rows,
                mismatches: INDEX_MISMATCHES,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(client: &str, library: &str, bc1: &str, bc2: &str) -> Track {
        Track {
            client: client.to_owned(),
            library: library.to_owned(),
            sample: "sample".to_owned(),
            barcode_name: "BC".to_owned(),
            barcode: bc1.to_owned(),
            barcode2: bc2.to_owned(),
        }
    }

    fn plan(mask: &str, tracks: Vec<Track>) -> LanePlan {
        LanePlan { tracks, mask: mask.to_owned() }
    }

    #[test]
    fn groups_lanes_by_mask() {
        let mut lanes = BTreeMap::new();
        lanes.insert(1, plan("Y76,I8,Y76", vec![track("a", "L1_Track-1", "ACGTACGT", "")]));
        lanes.insert(2, plan("Y76,n8,Y76", vec![track("b", "L2_Track-2", "", "")]));
        lanes.insert(3, plan("Y76,I8,Y76", vec![track("c", "L3_Track-3", "TTGGCCAA", "")]));

        let sheets = build_sheets("NS500550_0123", &lanes, false);

        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].name, "NS500550_0123_1");
        assert_eq!(sheets[0].mask, "Y76,I8,Y76");
        assert_eq!(sheets[0].lanes, vec![1, 3]);
        assert_eq!(sheets[1].name, "NS500550_0123_2");
        assert_eq!(sheets[1].lanes, vec![2]);
        assert_eq!(sheets[0].mismatches, 1);
    }

    #[test]
    fn grouping_is_a_partition() {
        let mut lanes = BTreeMap::new();
        for lane in 1..=4 {
            let mask = if lane % 2 == 0 { "Y76,I8,Y76" } else { "Y76,I6n2,Y76" };
            lanes.insert(
                lane,
                plan(mask, vec![track("a", &format!("L{}_Track-{}", lane, lane), "ACGTAC", "")]),
            );
        }

        let sheets = build_sheets("NS500550_0123", &lanes, false);
        let mut seen: Vec<u32> = sheets.iter().flat_map(|s| s.lanes.clone()).collect();
        seen.sort();
        assert_eq!(seen, vec![1, 2, 3, 4]);

        for sheet in &sheets {
            assert!(sheets
                .iter()
                .filter(|other| other.mask == sheet.mask)
                .count() == 1);
        }
    }

    #[test]
    fn rows_carry_lane_number() {
        let mut lanes = BTreeMap::new();
        lanes.insert(
            2,
            plan("Y76,I8,Y76", vec![track("mehmetc", "L25268_Track-57024", "CTGTATGC", "")]),
        );

        let sheets = build_sheets("NS500550_0123", &lanes, false);
        assert_eq!(
            sheets[0].rows,
            vec!["L25268_Track-57024,L25268_Track-57024,mehmetc,2,CTGTATGC,"]
        );
    }

    #[test]
    fn reverse_complement_convention_blanks_the_lane_column() {
        let mut lanes = BTreeMap::new();
        lanes.insert(
            1,
            plan("Y76,I8,I8,Y76", vec![track("a", "L1_Track-1", "ACGTACGT", "GGAACCTT")]),
        );

        let sheets = build_sheets("NS500550_0123", &lanes, true);
        assert_eq!(
            sheets[0].rows,
            vec!["L1_Track-1,L1_Track-1,a,,ACGTACGT,GGAACCTT"]
        );
    }

    #[test]
    fn sheet_text_has_data_section_and_header() {
        let mut lanes = BTreeMap::new();
        lanes.insert(1, plan("Y76,I8,Y76", vec![track("a", "L1_Track-1", "ACGTACGT", "")]));

        let sheets = build_sheets("NS500550_0123", &lanes, false);
        let text = sheets[0].to_csv();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("[Data]"));
        assert_eq!(lines.next(), Some(SHEET_HEADER));
        assert_eq!(lines.next(), Some("L1_Track-1,L1_Track-1,a,1,ACGTACGT,"));
        assert_eq!(lines.next(), None);
    }
}
