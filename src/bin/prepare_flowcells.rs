//! prepare_flowcells scans a machine's raw storage for a finished flowcell
//! run, reconciles the lane barcodes against the track assignment table and
//! writes the sample sheets and demux job configs for bcl2fastq.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{App, Arg};
use log::{info, warn};

use common::machine::{Machine, Platform};
use common::manage::{prepare_flowcell, PrepOutcome, TrackTable};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = App::new("prepare_flowcells")
        .version(clap::crate_version!())
        .arg(
            Arg::with_name("storage")
                .long("storage")
                .help("raw storage root the machine writes run folders into")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("machine")
                .long("machine")
                .help("machine model name, e.g. 'NextSeq 550'")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("platform")
                .long("platform")
                .help("sequencing platform of the machine")
                .possible_values(&["illumina", "pacbio"])
                .default_value("illumina")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("flowcell")
                .long("flowcell")
                .help("flowcell code to prepare")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("tracks")
                .long("tracks")
                .help("path to the track assignment table (csv)")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("output")
                .long("output")
                .help("output directory for sample sheets and demux configs")
                .takes_value(true)
                .required(true),
        )
        .get_matches();

    let storage = PathBuf::from(matches.value_of("storage").unwrap());
    if !storage.is_dir() {
        bail!("storage root {} is not a directory", storage.display());
    }

    let platform = match matches.value_of("platform").unwrap() {
        "pacbio" => Platform::PacBio,
        _ => Platform::Illumina,
    };

    let machine_name = matches.value_of("machine").unwrap();
    let machine = Machine::new(machine_name, machine_name, platform, &storage);

    let flowcell = matches.value_of("flowcell").unwrap();
    let tracks = PathBuf::from(matches.value_of("tracks").unwrap());
    let output = PathBuf::from(matches.value_of("output").unwrap());

    let table = TrackTable::from_csv(&tracks)
        .with_context(|| format!("could not load track table {}", tracks.display()))?;

    let outcome = prepare_flowcell(&machine, flowcell, &table, &output)
        .with_context(|| format!("preparing flowcell '{}' failed", flowcell))?;

    match outcome {
        PrepOutcome::NotReady => warn!("flowcell '{}' is not ready, run again later", flowcell),
        PrepOutcome::Skipped => info!("flowcell '{}' was skipped", flowcell),
        PrepOutcome::Prepared { sheets } => {
            info!("flowcell '{}': wrote {} sample sheet(s)", flowcell, sheets)
        }
    }

    Ok(())
}
