//! Banded extension of chains into local alignment regions.
//!
//! Each chain gets one reference window sized so no extension can escape
//! it; seeds are then extended left and right with the seed score as the
//! starting point. Seeds already explained by an earlier region are
//! skipped instead of re-extended.

use crate::index::bntseq;
use crate::ksw;
use crate::mem_opt::MemOpt;

use super::chaining::Chain;

/// A local alignment region produced by extension. Intervals are half-open;
/// `rb`/`re` are forward-reverse reference coordinates.
#[derive(Debug, Clone, Copy)]
pub struct AlnReg {
    pub rb: i64,
    pub re: i64,
    pub qb: i32,
    pub qe: i32,
    /// Best extension score.
    pub score: i32,
    /// Score of the best overlapping suboptimal region.
    pub sub: i32,
    /// Suboptimal score contributed by an external pairing step.
    pub csub: i32,
    /// Number of near-tie suboptimal regions.
    pub sub_n: i32,
    /// Query bases covered by chain seeds inside this region.
    pub seedcov: i32,
    /// -1 for a primary region, else the index of the dominating primary.
    pub secondary: i32,
}

impl Default for AlnReg {
    fn default() -> Self {
        AlnReg {
            rb: 0,
            re: 0,
            qb: 0,
            qe: 0,
            score: 0,
            sub: 0,
            csub: 0,
            sub_n: 0,
            seedcov: 0,
            secondary: -1,
        }
    }
}

/// Widest gap a `qlen`-base extension could open and still score positive.
#[inline]
pub fn cal_max_gap(opt: &MemOpt, qlen: i32) -> i32 {
    let l = ((qlen as f64 * opt.a as f64 - opt.q as f64) / opt.r as f64 + 1.0) as i32;
    l.max(1)
}

/// Extend one chain into zero or more alignment regions, appended to `regs`.
pub fn mem_chain2aln(
    opt: &MemOpt,
    l_pac: i64,
    pac: &[u8],
    query: &[u8],
    c: &Chain,
    regs: &mut Vec<AlnReg>,
) {
    let l_query = query.len() as i32;

    // the widest window any seed of this chain could reach
    let mut rmax0: i64 = l_pac << 1;
    let mut rmax1: i64 = 0;
    for t in &c.seeds {
        let b = t.rbeg - (t.qbeg as i64 + cal_max_gap(opt, t.qbeg) as i64);
        let e = t.rbeg
            + t.len as i64
            + (l_query - t.qbeg - t.len) as i64
            + cal_max_gap(opt, l_query - t.qbeg - t.len) as i64;
        rmax0 = rmax0.min(b);
        rmax1 = rmax1.max(e);
    }
    let (rseq, rlen) = bntseq::get_seq(l_pac, pac, rmax0, rmax1);
    if rlen != rmax1 - rmax0 {
        // truncated at a boundary; extension cannot be trusted
        log::debug!(
            "extension window [{},{}) truncated to {} bases, chain dropped",
            rmax0,
            rmax1,
            rlen
        );
        return;
    }

    let mut k = 0;
    while k < c.seeds.len() {
        let s = c.seeds[k];
        let mut a = AlnReg::default();

        if s.qbeg > 0 {
            // left extension over reversed prefixes
            let qs: Vec<u8> = query[..s.qbeg as usize].iter().rev().copied().collect();
            let tmp = (s.rbeg - rmax0) as usize;
            let rs: Vec<u8> = rseq[..tmp].iter().rev().copied().collect();
            let (score, qle, tle) =
                ksw::ksw_extend(&qs, &rs, 5, &opt.mat, opt.q, opt.r, opt.w, s.len * opt.a);
            a.score = score;
            a.qb = s.qbeg - qle;
            a.rb = s.rbeg - tle as i64;
        } else {
            a.score = s.len * opt.a;
            a.qb = 0;
            a.rb = s.rbeg;
        }

        if s.qbeg + s.len != l_query {
            // right extension from the seed end
            let qe = (s.qbeg + s.len) as usize;
            let re = (s.rbeg + s.len as i64 - rmax0) as usize;
            let (score, qle, tle) = ksw::ksw_extend(
                &query[qe..],
                &rseq[re..],
                5,
                &opt.mat,
                opt.q,
                opt.r,
                opt.w,
                a.score,
            );
            a.score = score;
            a.qe = qe as i32 + qle;
            a.re = rmax0 + re as i64 + tle as i64;
        } else {
            a.qe = l_query;
            a.re = s.rbeg + s.len as i64;
        }
        log::debug!(
            "[{}] score={}\t[{},{}) <=> [{},{})",
            k,
            a.score,
            a.qb,
            a.qe,
            a.rb,
            a.re
        );

        // seed coverage: chain seeds fully inside the region
        a.seedcov = 0;
        for t in &c.seeds {
            if t.qbeg >= a.qb
                && t.qbeg + t.len <= a.qe
                && t.rbeg >= a.rb
                && t.rbeg + t.len as i64 <= a.re
            {
                a.seedcov += t.len;
            }
        }
        regs.push(a);

        // jump over seeds the region already explains: stop at the first
        // seed that overlaps its predecessor heavily or escapes the region
        let mut i = k + 1;
        while i < c.seeds.len() {
            let t = c.seeds[i];
            let p = c.seeds[i - 1];
            if p.rbeg + p.len as i64 >= t.rbeg + 7 || p.qbeg + p.len >= t.qbeg + 7 {
                break;
            }
            if t.rbeg + t.len as i64 > a.re || t.qbeg + t.len > a.qe {
                break;
            }
            i += 1;
        }
        k = i;
    }
}
