//! Chain filtering by coverage weight and query-overlap domination.
//!
//! Chains are weighed by the query/reference span their seeds cover, sorted
//! best-first, and a chain significantly overlapped on the query by a much
//! heavier chain is dropped. The first overlapping candidate of each kept
//! chain is retained as well, so a close runner-up survives to compete
//! during primary marking.

use crate::mem_opt::MemOpt;

use super::chaining::Chain;

/// Interval-union coverage of a chain, projected on both axes.
///
/// The reference-axis pass advances its high-water mark with query
/// coordinates, matching classic bwa; a regression test pins the behavior,
/// so keep it bug-compatible.
pub fn chain_weight(c: &Chain) -> i32 {
    let mut w_q: i64 = 0;
    let mut end: i64 = 0;
    for s in &c.seeds {
        let (qb, qe) = (s.qbeg as i64, (s.qbeg + s.len) as i64);
        if qb >= end {
            w_q += s.len as i64;
        } else if qe > end {
            w_q += qe - end;
        }
        end = end.max(qe);
    }
    let mut w_r: i64 = 0;
    let mut end: i64 = 0;
    for s in &c.seeds {
        let re = s.rbeg + s.len as i64;
        if s.rbeg >= end {
            w_r += s.len as i64;
        } else if re > end {
            w_r += re - end;
        }
        end = end.max((s.qbeg + s.len) as i64);
    }
    w_q.min(w_r) as i32
}

struct FltAux {
    beg: i32,
    end: i32,
    w: i32,
    /// Index of the first significantly overlapping candidate (kept with us).
    sub: Option<usize>,
}

/// Keep the chains that are not dominated by a heavier overlapping chain.
/// Survivors come out in weight order.
pub fn mem_chain_flt(opt: &MemOpt, chains: Vec<Chain>) -> Vec<Chain> {
    let n = chains.len();
    if n <= 1 {
        return chains;
    }

    let mut order: Vec<usize> = (0..n).collect();
    let weights: Vec<i32> = chains.iter().map(chain_weight).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(weights[i]));

    // reorder so the best chain comes first
    let mut sorted: Vec<Option<Chain>> = chains.into_iter().map(Some).collect();
    let chains: Vec<Chain> = order
        .iter()
        .map(|&i| sorted[i].take().unwrap())
        .collect();
    let mut aux: Vec<FltAux> = chains
        .iter()
        .zip(order.iter())
        .map(|(c, &i)| {
            let (beg, end) = c.query_span();
            FltAux {
                beg,
                end,
                w: weights[i],
                sub: None,
            }
        })
        .collect();

    let mut accepted: Vec<usize> = vec![0];
    for i in 1..n {
        let mut dropped = false;
        for k in 0..accepted.len() {
            let j = accepted[k];
            let b_max = aux[j].beg.max(aux[i].beg);
            let e_min = aux[j].end.min(aux[i].end);
            if e_min > b_max {
                // overlap on the query
                let len_i = aux[i].end - aux[i].beg;
                let len_j = aux[j].end - aux[j].beg;
                let min_l = len_i.min(len_j);
                if (e_min - b_max) as f32 >= min_l as f32 * opt.mask_level {
                    if aux[j].sub.is_none() {
                        aux[j].sub = Some(i);
                    }
                    if (aux[i].w as f32) < aux[j].w as f32 * opt.chain_drop_ratio
                        && aux[j].w - aux[i].w >= opt.min_seed_len << 1
                    {
                        dropped = true;
                        break;
                    }
                }
            }
        }
        if !dropped {
            accepted.push(i);
        }
    }

    let mut keep = vec![false; n];
    for &i in &accepted {
        keep[i] = true;
        if let Some(s) = aux[i].sub {
            keep[s] = true;
        }
    }
    let kept: Vec<Chain> = chains
        .into_iter()
        .zip(keep)
        .filter_map(|(c, k)| k.then_some(c))
        .collect();
    log::debug!("chain filter: {} -> {} chains", n, kept.len());
    kept
}
