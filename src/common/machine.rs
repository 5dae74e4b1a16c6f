//! Instrument metadata: which platform a machine belongs to, where it writes
//! raw run folders, and the index chemistry quirks that demultiplexing
//! preparation has to respect.

use std::path::{Path, PathBuf};

/// Sequencing platform of a machine. Selects the flowcell variant that a run
/// from this machine is represented as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Illumina,
    PacBio,
}

/// A sequencing machine as configured for the facility.
#[derive(Debug, Clone)]
pub struct Machine {
    /// Human-readable model name, e.g. "NextSeq 550"
    pub name: String,
    /// Short machine code used in run folder names
    pub code: String,
    pub platform: Platform,
    /// Root directory the instrument writes run folders into
    pub storage: PathBuf,
    /// The second index read comes off these instruments reverse-complemented
    pub reverse_complement: bool,
    /// Machine configured to only ever use the first index read
    pub single_index: bool,
}

impl Machine {
    /// Builds a machine, deriving the reverse-complement convention from the
    /// model name: NextSeq and NovaSeq chemistries read index2 on the
    /// opposite strand.
    pub fn new(name: &str, code: &str, platform: Platform, storage: &Path) -> Machine {
        let lowered = name.to_lowercase();
        let reverse_complement = platform == Platform::Illumina
            && (lowered.contains("nextseq") || lowered.contains("novaseq"));

        Machine {
            name: name.to_owned(),
            code: code.to_owned(),
            platform,
            storage: storage.to_path_buf(),
            reverse_complement,
            single_index: false,
        }
    }

    /// Overrides the reverse-complement convention derived from the name.
    pub fn with_reverse_complement(mut self, reverse_complement: bool) -> Machine {
        self.reverse_complement = reverse_complement;
        self
    }

    /// Marks the machine as single-index regardless of the run layout.
    pub fn with_single_index(mut self, single_index: bool) -> Machine {
        self.single_index = single_index;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nextseq_reverse_complements() {
        let machine = Machine::new(
            "NextSeq 550",
            "NS550",
            Platform::Illumina,
            Path::new("/seq/raw"),
        );
        assert!(machine.reverse_complement);
        assert!(!machine.single_index);
        assert_eq!(machine.code, "NS550");
        assert_eq!(machine.storage, Path::new("/seq/raw"));
    }

    #[test]
    fn miseq_does_not() {
        let machine = Machine::new("MiSeq", "M1", Platform::Illumina, Path::new("/seq/raw"));
        assert!(!machine.reverse_complement);
    }

    #[test]
    fn pacbio_never_reverse_complements() {
        let machine = Machine::new(
            "NovaSeq-named Sequel",
            "SQ1",
            Platform::PacBio,
            Path::new("/seq/raw"),
        );
        assert!(!machine.reverse_complement);
    }

    #[test]
    fn overrides() {
        let machine = Machine::new("MiSeq", "M1", Platform::Illumina, Path::new("/seq/raw"))
            .with_reverse_complement(true)
            .with_single_index(true);
        assert!(machine.reverse_complement);
        assert!(machine.single_index);
    }
}
