//! Colinear seed chaining.
//!
//! SMEM hits are expanded to concrete reference positions and greedily
//! merged into chains kept in an ordered map keyed by the chain anchor
//! (the first seed's reference begin). The predecessor query against that
//! map makes chaining O(n log n) in the number of seeds.

use std::collections::BTreeMap;

use crate::index::bntseq::BntSeq;
use crate::index::bwt::Bwt;
use crate::mem_opt::MemOpt;

/// An exact match anchoring a chain. `rbeg` lives in forward-reverse
/// reference coordinates and therefore carries the strand.
#[derive(Debug, Clone, Copy)]
pub struct Seed {
    pub rbeg: i64,
    pub qbeg: i32,
    pub len: i32,
}

/// A colinear run of seeds expected to share one alignment.
///
/// Seeds are kept in insertion order, monotone in both `qbeg` and `rbeg`,
/// with diagonal drift bounded by the band width.
#[derive(Debug, Clone)]
pub struct Chain {
    /// Anchor: the first seed's `rbeg`.
    pub pos: i64,
    pub seeds: Vec<Seed>,
}

impl Chain {
    #[inline]
    pub fn first(&self) -> &Seed {
        &self.seeds[0]
    }

    #[inline]
    pub fn last(&self) -> &Seed {
        self.seeds.last().unwrap()
    }

    /// Query span `[beg, end)` from the first seed's start to the last
    /// seed's end.
    #[inline]
    pub fn query_span(&self) -> (i32, i32) {
        (self.first().qbeg, self.last().qbeg + self.last().len)
    }
}

/// Try to absorb `s` into `c`. Returns true when the seed is contained in
/// the chain's bounding box (absorbed without growing) or was appended.
fn test_and_merge(opt: &MemOpt, c: &mut Chain, s: &Seed) -> bool {
    let last = c.last();
    let qend = (last.qbeg + last.len) as i64;
    let rend = last.rbeg + last.len as i64;
    if s.qbeg >= c.first().qbeg
        && (s.qbeg + s.len) as i64 <= qend
        && s.rbeg >= c.first().rbeg
        && s.rbeg + s.len as i64 <= rend
    {
        return true; // contained seed; do nothing
    }
    let x = (s.qbeg - last.qbeg) as i64; // always non-negative
    let y = s.rbeg - last.rbeg;
    if y >= 0
        && x - y <= opt.w as i64
        && y - x <= opt.w as i64
        && x - (last.len as i64) < opt.max_chain_gap as i64
        && y - (last.len as i64) < opt.max_chain_gap as i64
    {
        c.seeds.push(*s);
        return true;
    }
    false // request a new chain
}

/// Chain all seeds of one query. Queries shorter than the minimum seed
/// length cannot produce a seed and yield no chains.
pub fn mem_chain(opt: &MemOpt, bwt: &Bwt, query: &[u8]) -> Vec<Chain> {
    if (query.len() as i32) < opt.min_seed_len {
        return Vec::new();
    }
    // (pos, insertion id) keys give multiset semantics for equal anchors
    let mut tree: BTreeMap<(i64, u32), Chain> = BTreeMap::new();
    let mut n_inserted: u32 = 0;

    let mut itr = super::seeding::SmemIterator::new(bwt);
    itr.set_query(query);
    while let Some(batch) = itr.next(opt.max_seed_len, opt.min_intv) {
        for p in batch {
            let slen = p.len();
            if slen < opt.min_seed_len || p.occ() > opt.max_occ {
                continue; // too short or too repetitive
            }
            for k in 0..p.occ() {
                let s = Seed {
                    rbeg: bwt.sa(p.x[0] + k) as i64,
                    qbeg: p.qbeg(),
                    len: slen,
                };
                let merged = match tree.range_mut(..=(s.rbeg, u32::MAX)).next_back() {
                    Some((_, chain)) => test_and_merge(opt, chain, &s),
                    None => false,
                };
                if !merged {
                    tree.insert(
                        (s.rbeg, n_inserted),
                        Chain {
                            pos: s.rbeg,
                            seeds: vec![s],
                        },
                    );
                    n_inserted += 1;
                }
            }
        }
    }
    // in-order traversal fixes the downstream tie-breaking
    tree.into_values().collect()
}

/// Log every chain with its seeds resolved to contig coordinates.
pub fn dump_chains(bns: &BntSeq, chains: &[Chain]) {
    for c in chains {
        let mut line = format!("{}", c.seeds.len());
        for s in &c.seeds {
            let (mut pos, is_rev) = bns.depos(s.rbeg);
            if is_rev {
                pos -= s.len as i64 - 1;
            }
            let (_, rid) = bns.cnt_ambi(pos, s.len as i64);
            let ann = &bns.anns[rid as usize];
            line.push_str(&format!(
                "\t{},{},{}({}:{}{})",
                s.len,
                s.qbeg,
                s.rbeg,
                ann.name,
                if is_rev { '-' } else { '+' },
                pos - ann.offset as i64 + 1
            ));
        }
        log::debug!("chain: {}", line);
    }
}
