//! Paired-end hooks.
//!
//! Insert-size estimation and mate rescue are external collaborators; the
//! hooks here carry their signatures so the batch driver can sequence its
//! two passes around them. `mem_sam_pe` formats both mates with full mate
//! fields but performs no pairing score adjustment and no rescue.

use crate::index::bntseq::BntSeq;
use crate::io::fastq::SeqRead;
use crate::mem_opt::MemOpt;

use super::extension::AlnReg;
use super::finalization::{mem_approx_mapq_se, mem_mark_primary_se};
use super::sam::{mem_alnreg_to_hit, mem_sam_se, BwaHit};

/// Insert-size statistics for one read-pair orientation.
#[derive(Debug, Clone, Copy)]
pub struct PeStat {
    pub low: i32,
    pub high: i32,
    pub avg: f64,
    pub std: f64,
    pub failed: bool,
}

impl Default for PeStat {
    fn default() -> Self {
        PeStat {
            low: 0,
            high: 0,
            avg: 0.0,
            std: 0.0,
            failed: true,
        }
    }
}

/// Estimate the insert-size distribution for the four pair orientations.
///
/// The estimation itself lives outside this crate; every orientation is
/// reported failed so downstream consumers fall back to independent mates.
pub fn mem_pestat(_opt: &MemOpt, _l_pac: i64, regs: &[Vec<AlnReg>]) -> [PeStat; 4] {
    log::debug!(
        "insert-size estimation skipped over {} region vectors",
        regs.len()
    );
    [PeStat::default(); 4]
}

/// Format a read pair: each mate is emitted with the other mate's best hit
/// in its mate fields. Returns the two SAM strings and the number of
/// rescued alignments (always zero here; rescue is external).
pub fn mem_sam_pe(
    opt: &MemOpt,
    bns: &BntSeq,
    pac: &[u8],
    _pes: &[PeStat; 4],
    _id: u64,
    seqs: &[SeqRead; 2],
    regs: &mut [Vec<AlnReg>; 2],
) -> (String, String, i32) {
    mem_mark_primary_se(opt, &mut regs[0]);
    mem_mark_primary_se(opt, &mut regs[1]);

    let best_hit = |rs: &[AlnReg]| -> Option<BwaHit> {
        rs.first().map(|a| {
            let mut h = mem_alnreg_to_hit(a);
            h.qual = mem_approx_mapq_se(opt, a);
            h
        })
    };
    let h0 = best_hit(&regs[0]);
    let h1 = best_hit(&regs[1]);

    // an unmapped mate still needs a hit record so the coordinate can be
    // inherited; a default hit is "unmapped"
    let m0 = h0.unwrap_or_default();
    let m1 = h1.unwrap_or_default();

    let sam0 = mem_sam_se(opt, bns, pac, &seqs[0], &regs[0], 0x40, Some(&m1));
    let sam1 = mem_sam_se(opt, bns, pac, &seqs[1], &regs[1], 0x80, Some(&m0));
    (sam0, sam1, 0)
}
