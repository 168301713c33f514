//! Region dedup, primary/secondary designation, and mapping quality.

use crate::mem_opt::MemOpt;

use super::extension::AlnReg;

/// Tuned coefficient of the approximate mapping-quality model.
pub const MEM_MAPQ_COEF: f64 = 30.0;

/// Sort regions best-first and collapse exact duplicates.
///
/// The order is score descending, then `rb`, then `qb`; two regions agreeing
/// on all three are the same alignment found twice.
pub fn mem_sort_and_dedup(regs: &mut Vec<AlnReg>) {
    if regs.len() <= 1 {
        return;
    }
    regs.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.rb.cmp(&b.rb))
            .then(a.qb.cmp(&b.qb))
    });
    for i in 1..regs.len() {
        if regs[i].score == regs[i - 1].score
            && regs[i].rb == regs[i - 1].rb
            && regs[i].qb == regs[i - 1].qb
        {
            regs[i].qe = regs[i].qb; // mark the duplicate
        }
    }
    regs.retain(|a| a.qe > a.qb);
}

/// Walk sorted regions and mark each as primary or secondary by
/// query-overlap domination. Must run after [`mem_sort_and_dedup`].
pub fn mem_mark_primary_se(opt: &MemOpt, regs: &mut [AlnReg]) {
    if regs.is_empty() {
        return;
    }
    for a in regs.iter_mut() {
        a.sub = 0;
        a.secondary = -1;
    }
    let tmp = (opt.a + opt.b).max(opt.q + opt.r);
    let mut primaries: Vec<usize> = vec![0];
    for i in 1..regs.len() {
        let mut dominated_by: Option<usize> = None;
        for &j in &primaries {
            let b_max = regs[j].qb.max(regs[i].qb);
            let e_min = regs[j].qe.min(regs[i].qe);
            if e_min > b_max {
                let min_l = (regs[i].qe - regs[i].qb).min(regs[j].qe - regs[j].qb);
                if (e_min - b_max) as f32 >= min_l as f32 * opt.mask_level {
                    if regs[j].sub == 0 {
                        regs[j].sub = regs[i].score;
                    }
                    if regs[j].score - regs[i].score <= tmp {
                        regs[j].sub_n += 1;
                    }
                    dominated_by = Some(j);
                    break;
                }
            }
        }
        match dominated_by {
            Some(j) => regs[i].secondary = j as i32,
            None => primaries.push(i),
        }
    }
}

/// Approximate phred-scaled mapping quality from score margins and seed
/// coverage, clamped to [0, 60].
pub fn mem_approx_mapq_se(opt: &MemOpt, a: &AlnReg) -> i32 {
    let mut sub = if a.sub != 0 {
        a.sub
    } else {
        opt.min_seed_len * opt.a
    };
    sub = sub.max(a.csub);
    if sub >= a.score {
        return 0;
    }
    let l = (a.qe - a.qb).max((a.re - a.rb) as i32);
    let mut mapq = if a.score != 0 {
        (MEM_MAPQ_COEF * (1.0 - sub as f64 / a.score as f64) * (a.seedcov as f64).ln() + 0.499)
            as i32
    } else {
        0
    };
    let identity =
        1.0 - ((l * opt.a - a.score) as f64) / ((opt.a + opt.b) as f64) / (l as f64);
    if identity < 0.95 {
        mapq = (mapq as f64 * identity * identity + 0.499) as i32;
    }
    if a.sub_n > 0 {
        mapq -= (4.343 * (a.sub_n as f64).ln() + 0.499) as i32;
    }
    mapq.clamp(0, 60)
}
