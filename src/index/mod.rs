//! Index management: building, saving, and loading the aligner index.
//!
//! An index is four sidecar files next to a common prefix: `.pac` (2-bit
//! packed forward reference), `.ann`/`.amb` (name/offset and ambiguity
//! tables), and `.bwt`/`.sa` (the FM-index and its SA samples).

pub mod bntseq;
pub mod bwt;

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use self::bntseq::BntSeq;
use self::bwt::Bwt;

/// Default suffix-array sampling interval.
const SA_INTV: u64 = 32;

/// A loaded aligner index: FM-index, reference tables, and packed reference.
/// Read-only and shared by all workers for the lifetime of a batch.
pub struct BwaIndex {
    pub bwt: Bwt,
    pub bns: BntSeq,
    pub pac: Vec<u8>,
}

impl BwaIndex {
    /// Build all index files for `fasta` under `prefix`.
    pub fn build(fasta: &Path, prefix: &Path) -> io::Result<()> {
        let mut data = Vec::new();
        File::open(fasta)?.read_to_end(&mut data)?;
        let idx = Self::from_fasta_bytes(&data)?;
        idx.bns.dump(&idx.pac, prefix)?;
        idx.bwt.dump(prefix)?;
        log::info!(
            "indexed {} sequence(s), {} bp",
            idx.bns.n_seqs,
            idx.bns.l_pac
        );
        Ok(())
    }

    /// Build an in-memory index from FASTA text.
    pub fn from_fasta_bytes(data: &[u8]) -> io::Result<BwaIndex> {
        let (bns, pac) = BntSeq::from_fasta(data)?;
        let bwt = Bwt::build(&pac, bns.l_pac, SA_INTV);
        Ok(BwaIndex { bwt, bns, pac })
    }

    /// Load a previously built index from its file prefix.
    pub fn load(prefix: &Path) -> io::Result<BwaIndex> {
        let (bns, pac) = BntSeq::restore(prefix)?;
        let bwt = Bwt::restore(prefix)?;
        if bwt.seq_len != bns.l_pac * 2 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "index is corrupt: .bwt length disagrees with .ann",
            ));
        }
        Ok(BwaIndex { bwt, bns, pac })
    }
}
