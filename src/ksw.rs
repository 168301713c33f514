//! Scalar affine-gap alignment kernels.
//!
//! Two entry points serve the pipeline: `ksw_extend` grows a local alignment
//! out of a seed with a known starting score, and `ksw_global` re-aligns a
//! bounded region end-to-end to recover the CIGAR. Both are banded and use a
//! query profile so the inner loop is a single max-chain per cell.

const MINUS_INF: i32 = -0x4000_0000;

/// CIGAR operator codes; packed as `len << 4 | op`.
pub const CIGAR_OPS: &[u8; 5] = b"MIDSH";
pub const CIGAR_M: u32 = 0;
pub const CIGAR_I: u32 = 1;
pub const CIGAR_D: u32 = 2;
pub const CIGAR_S: u32 = 3;
pub const CIGAR_H: u32 = 4;

#[derive(Debug, Clone, Copy, Default)]
struct EhCell {
    h: i32,
    e: i32,
}

fn query_profile(query: &[u8], m: usize, mat: &[i8]) -> Vec<i8> {
    let qlen = query.len();
    let mut qp = vec![0i8; qlen * m];
    let mut i = 0;
    for k in 0..m {
        let row = &mat[k * m..k * m + m];
        for &qb in query {
            qp[i] = row[qb as usize];
            i += 1;
        }
    }
    qp
}

/// Extend an alignment from a seed boundary.
///
/// `h0` is the score already earned by the seed; the returned triple is the
/// best total score and the query/target lengths consumed to reach it. A
/// `(h0, 0, 0)` result means no extension improved on the seed.
pub fn ksw_extend(
    query: &[u8],
    target: &[u8],
    m: usize,
    mat: &[i8],
    gapo: i32,
    gape: i32,
    w: i32,
    h0: i32,
) -> (i32, i32, i32) {
    let qlen = query.len();
    let tlen = target.len();
    if qlen == 0 || tlen == 0 {
        return (h0, 0, 0);
    }
    let gapoe = gapo + gape;
    let qp = query_profile(query, m, mat);

    // first row
    let mut eh = vec![EhCell::default(); qlen + 1];
    eh[0].h = h0;
    eh[1].h = if h0 > gapoe { h0 - gapoe } else { 0 };
    let mut j = 2;
    while j <= qlen && eh[j - 1].h > gape {
        eh[j].h = eh[j - 1].h - gape;
        j += 1;
    }

    // shrink the band to the widest useful gap
    let max_match = mat[..m * m].iter().copied().max().unwrap_or(1) as i32;
    let max_gap =
        (((qlen as f64 * max_match as f64 - gapo as f64) / gape as f64) as i32 + 1).max(1);
    let w = w.min(max_gap) as i64;

    let (mut max, mut max_i, mut max_j) = (h0, -1i64, -1i64);
    let (mut beg, mut end) = (0usize, qlen);
    for i in 0..tlen {
        let mut f = 0i32;
        let mut row_best = 0i32;
        let mut mj = -1i64;
        let q = &qp[target[i] as usize * qlen..(target[i] as usize + 1) * qlen];
        let mut h1 = (h0 - (gapo + gape * (i as i32 + 1))).max(0);
        if (beg as i64) < i as i64 - w {
            beg = (i as i64 - w) as usize;
        }
        if end as i64 > i as i64 + w + 1 {
            end = (i as i64 + w + 1) as usize;
        }
        if end > qlen {
            end = qlen;
        }
        for j in beg..end {
            // eh[j] holds H(i-1,j-1) and E(i,j); f is F(i,j); h1 is H(i,j-1)
            let EhCell { h: diag, mut e } = eh[j];
            eh[j].h = h1;
            let mut h = diag + q[j] as i32;
            if h < e {
                h = e;
            }
            if h < f {
                h = f;
            }
            h1 = h;
            if h >= row_best {
                row_best = h;
                mj = j as i64;
            }
            h -= gapoe;
            if h < 0 {
                h = 0;
            }
            e -= gape;
            if e < h {
                e = h;
            }
            eh[j].e = e;
            f -= gape;
            if f < h {
                f = h;
            }
        }
        eh[end].h = h1;
        eh[end].e = 0;
        if row_best == 0 {
            break;
        }
        if row_best > max {
            max = row_best;
            max_i = i as i64;
            max_j = mj;
        }
        // drop dead cells from both ends of the band
        let mut nb = beg;
        while nb < end && eh[nb].h == 0 && eh[nb].e == 0 {
            nb += 1;
        }
        beg = nb;
        let mut ne = end as i64;
        while ne >= beg as i64 && eh[ne as usize].h == 0 && eh[ne as usize].e == 0 {
            ne -= 1;
        }
        end = ((ne + 2) as usize).min(qlen);
    }
    (max, (max_j + 1) as i32, (max_i + 1) as i32)
}

/// Banded global alignment with backtrack; returns the score and CIGAR.
pub fn ksw_global(
    query: &[u8],
    target: &[u8],
    m: usize,
    mat: &[i8],
    gapo: i32,
    gape: i32,
    w: i32,
) -> (i32, Vec<u32>) {
    let qlen = query.len();
    let tlen = target.len();
    if qlen == 0 || tlen == 0 {
        return (0, Vec::new());
    }
    let gapoe = gapo + gape;
    let w = w.max(1) as i64;
    let n_col = qlen.min(2 * w as usize + 1);
    let qp = query_profile(query, m, mat);

    // backtrack matrix: bits 0-1 H source (0=M, 1=E, 2=F),
    // bits 2-3 E continuation, bits 4-5 F continuation
    let mut z = vec![0u8; n_col * tlen];

    let mut eh = vec![
        EhCell {
            h: MINUS_INF,
            e: MINUS_INF
        };
        qlen + 1
    ];
    eh[0].h = 0;
    for j in 1..=qlen {
        if (j as i64) <= w {
            eh[j].h = -(gapo + gape * j as i32);
        }
    }

    for i in 0..tlen {
        let beg = (i as i64 - w).max(0) as usize;
        let end = (i as i64 + w + 1).min(qlen as i64) as usize;
        let mut h1 = if beg == 0 {
            -(gapo + gape * (i as i32 + 1))
        } else {
            MINUS_INF
        };
        let mut f = MINUS_INF;
        let q = &qp[target[i] as usize * qlen..(target[i] as usize + 1) * qlen];
        let zi = &mut z[i * n_col..];
        for j in beg..end {
            let EhCell { h: diag, mut e } = eh[j];
            eh[j].h = h1;
            let mut h = diag + q[j] as i32;
            let mut d: u8 = if h >= e { 0 } else { 1 };
            if h < e {
                h = e;
            }
            if h < f {
                d = 2;
                h = f;
            }
            h1 = h;
            h -= gapoe;
            e -= gape;
            if e > h {
                d |= 1 << 2;
            } else {
                e = h;
            }
            eh[j].e = e;
            f -= gape;
            if f > h {
                d |= 2 << 4;
            } else {
                f = h;
            }
            zi[j - beg] = d;
        }
        eh[end].h = h1;
        eh[end].e = MINUS_INF;
    }
    let score = eh[qlen].h;

    // backtrack from the last cell
    let mut cigar: Vec<u32> = Vec::new();
    let mut which = 0u8;
    let mut i = tlen as i64 - 1;
    let mut k = (i + w + 1).min(qlen as i64) - 1;
    while i >= 0 && k >= 0 {
        let beg = (i - w).max(0);
        let col = k - beg;
        if col < 0 || col as usize >= n_col {
            // the path left the stored band; flush the remainder as gaps
            break;
        }
        let d = (z[i as usize * n_col + col as usize] >> (which << 1)) & 3;
        which = d;
        match d {
            0 => {
                push_cigar(&mut cigar, CIGAR_M, 1);
                i -= 1;
                k -= 1;
            }
            1 => {
                push_cigar(&mut cigar, CIGAR_D, 1);
                i -= 1;
            }
            _ => {
                push_cigar(&mut cigar, CIGAR_I, 1);
                k -= 1;
            }
        }
    }
    if i >= 0 {
        push_cigar(&mut cigar, CIGAR_D, (i + 1) as u32);
    }
    if k >= 0 {
        push_cigar(&mut cigar, CIGAR_I, (k + 1) as u32);
    }
    cigar.reverse();
    (score, cigar)
}

/// Append an operation, merging with the previous run when the op matches.
pub fn push_cigar(cigar: &mut Vec<u32>, op: u32, len: u32) {
    match cigar.last_mut() {
        Some(last) if *last & 0xf == op => *last += len << 4,
        _ => cigar.push(len << 4 | op),
    }
}

/// Render a packed CIGAR as text.
pub fn cigar_string(cigar: &[u32]) -> String {
    let mut s = String::new();
    for &c in cigar {
        s.push_str(&(c >> 4).to_string());
        s.push(CIGAR_OPS[(c & 0xf) as usize] as char);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem_opt::MemOpt;

    fn enc(s: &[u8]) -> Vec<u8> {
        s.iter()
            .map(|&b| match b {
                b'A' => 0,
                b'C' => 1,
                b'G' => 2,
                b'T' => 3,
                _ => 4,
            })
            .collect()
    }

    #[test]
    fn test_global_exact_match() {
        let opt = MemOpt::default();
        let q = enc(b"ACGTGCATCG");
        let (score, cigar) = ksw_global(&q, &q, 5, &opt.mat, opt.q, opt.r, 10);
        assert_eq!(score, 10);
        assert_eq!(cigar_string(&cigar), "10M");
    }

    #[test]
    fn test_global_mismatch() {
        let opt = MemOpt::default();
        let q = enc(b"ACGTGAATCG");
        let t = enc(b"ACGTGCATCG");
        let (score, cigar) = ksw_global(&q, &t, 5, &opt.mat, opt.q, opt.r, 10);
        assert_eq!(score, 9 - 4);
        assert_eq!(cigar_string(&cigar), "10M");
    }

    #[test]
    fn test_global_insertion() {
        let opt = MemOpt::default();
        let q = enc(b"ACGTGTCATCG"); // T inserted after position 5
        let t = enc(b"ACGTGCATCG");
        let (score, cigar) = ksw_global(&q, &t, 5, &opt.mat, opt.q, opt.r, 10);
        assert_eq!(score, 10 - (opt.q + opt.r));
        assert_eq!(cigar_string(&cigar), "5M1I5M");
    }

    #[test]
    fn test_global_deletion() {
        let opt = MemOpt::default();
        let q = enc(b"ACGTGATCG");
        let t = enc(b"ACGTGCATCG"); // C deleted from the query
        let (score, cigar) = ksw_global(&q, &t, 5, &opt.mat, opt.q, opt.r, 10);
        assert_eq!(score, 9 - (opt.q + opt.r));
        assert_eq!(cigar_string(&cigar), "5M1D4M");
    }

    #[test]
    fn test_extend_full_match() {
        let opt = MemOpt::default();
        let q = enc(b"ACGT");
        let t = enc(b"ACGTAA");
        let (score, qle, tle) = ksw_extend(&q, &t, 5, &opt.mat, opt.q, opt.r, opt.w, 5);
        assert_eq!(score, 9);
        assert_eq!(qle, 4);
        assert_eq!(tle, 4);
    }

    #[test]
    fn test_extend_no_improvement() {
        let opt = MemOpt::default();
        let q = enc(b"TTTT");
        let t = enc(b"AAAA");
        let (score, qle, tle) = ksw_extend(&q, &t, 5, &opt.mat, opt.q, opt.r, opt.w, 2);
        assert_eq!(score, 2);
        assert_eq!(qle, 0);
        assert_eq!(tle, 0);
    }

    #[test]
    fn test_extend_through_mismatch() {
        let opt = MemOpt::default();
        // one mismatch in the middle; extending through it still wins
        let q = enc(b"ACGTGAATCG");
        let t = enc(b"ACGTGCATCG");
        let (score, qle, tle) = ksw_extend(&q, &t, 5, &opt.mat, opt.q, opt.r, opt.w, 20);
        assert_eq!(score, 20 + 9 - 4);
        assert_eq!(qle, 10);
        assert_eq!(tle, 10);
    }

    #[test]
    fn test_push_cigar_merges_runs() {
        let mut cigar = Vec::new();
        push_cigar(&mut cigar, CIGAR_M, 3);
        push_cigar(&mut cigar, CIGAR_M, 2);
        push_cigar(&mut cigar, CIGAR_I, 1);
        assert_eq!(cigar_string(&cigar), "5M1I");
    }
}
