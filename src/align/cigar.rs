//! Global re-alignment of a finished region into a canonical CIGAR.

use crate::index::bntseq;
use crate::ksw;

/// Re-align `query` against reference window `[rb, re)` with a banded global
/// alignment and return `(score, cigar)`.
///
/// Windows that straddle the forward/reverse boundary or get truncated at
/// the reference edge yield `None`; the caller degrades the record to
/// unmapped. On the reverse strand both sequences are reversed before the
/// alignment so indels left-align on the forward strand.
pub fn bwa_gen_cigar(
    mat: &[i8; 25],
    q: i32,
    r: i32,
    w_opt: i32,
    l_pac: i64,
    pac: &[u8],
    query: &[u8],
    rb: i64,
    re: i64,
) -> Option<(i32, Vec<u32>)> {
    let l_query = query.len() as i32;
    if l_query <= 0 || rb >= re || (rb < l_pac && re > l_pac) {
        return None;
    }
    let (mut rseq, rlen) = bntseq::get_seq(l_pac, pac, rb, re);
    if rlen != re - rb {
        return None; // out of range
    }
    let mut qseq = query.to_vec();
    if rb >= l_pac {
        // reverse both; the mirrored alignment reads in forward-strand order
        // and leaves indels leftmost on the forward strand
        qseq.reverse();
        rseq.reverse();
    }
    let w = w_opt
        .min((((l_query * mat[0] as i32 - q) as f64 / r as f64) as i32 + 1).max(1))
        + (rlen - l_query as i64).unsigned_abs() as i32;
    let (score, cigar) = ksw::ksw_global(&qseq, &rseq, 5, mat, q, r, w);
    Some((score, cigar))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ksw::cigar_string;
    use crate::mem_opt::MemOpt;

    fn encode(s: &[u8]) -> Vec<u8> {
        s.iter()
            .map(|&b| crate::index::bntseq::NST_NT4_TABLE[b as usize])
            .collect()
    }

    fn pack(seq: &[u8]) -> Vec<u8> {
        let mut pac = vec![0u8; seq.len().div_ceil(4)];
        for (i, &c) in seq.iter().enumerate() {
            pac[i >> 2] |= c << ((!(i as u64) & 3) << 1);
        }
        pac
    }

    const REF: &[u8] = b"TTGACCAGTAAGGACTTCAGCCAATCGGTCAGCTTGGCCTATCAGAACTG";

    #[test]
    fn test_exact_match_cigar() {
        let opt = MemOpt::default();
        let seq = encode(REF);
        let pac = pack(&seq);
        let l_pac = seq.len() as i64;
        let q = encode(b"AGTAAGGACTTCAGCCAATC"); // REF[6..26]
        let got = bwa_gen_cigar(&opt.mat, opt.q, opt.r, opt.w, l_pac, &pac, &q, 6, 26);
        let (score, cigar) = got.unwrap();
        assert_eq!(score, 20);
        assert_eq!(cigar_string(&cigar), "20M");
    }

    #[test]
    fn test_reverse_strand_window() {
        let opt = MemOpt::default();
        let seq = encode(REF);
        let pac = pack(&seq);
        let l_pac = seq.len() as i64;
        // the same window addressed through the reverse-complement half,
        // with the query reverse-complemented to match
        let mut q = encode(b"AGTAAGGACTTCAGCCAATC");
        q.reverse();
        for b in q.iter_mut() {
            *b = 3 - *b;
        }
        let rb = 2 * l_pac - 26;
        let re = 2 * l_pac - 6;
        let got = bwa_gen_cigar(&opt.mat, opt.q, opt.r, opt.w, l_pac, &pac, &q, rb, re);
        let (score, cigar) = got.unwrap();
        assert_eq!(score, 20);
        assert_eq!(cigar_string(&cigar), "20M");
    }

    #[test]
    fn test_bridging_window_is_rejected() {
        let opt = MemOpt::default();
        let seq = encode(REF);
        let pac = pack(&seq);
        let l_pac = seq.len() as i64;
        let q = encode(b"ACGTACGTAC");
        assert!(bwa_gen_cigar(
            &opt.mat,
            opt.q,
            opt.r,
            opt.w,
            l_pac,
            &pac,
            &q,
            l_pac - 5,
            l_pac + 5
        )
        .is_none());
    }

    #[test]
    fn test_insertion_cigar_on_long_read() {
        // band formula must leave room for the length difference
        let opt = MemOpt::default();
        let seq = encode(REF);
        let pac = pack(&seq);
        let l_pac = seq.len() as i64;
        // REF[6..26] with a T inserted after 10 query bases
        let mut q = encode(b"AGTAAGGACT");
        q.push(3);
        q.extend(encode(b"TCAGCCAATC"));
        let got = bwa_gen_cigar(&opt.mat, opt.q, opt.r, opt.w, l_pac, &pac, &q, 6, 26);
        let (score, cigar) = got.unwrap();
        assert_eq!(score, 20 - (opt.q + opt.r));
        let s = cigar_string(&cigar);
        let m_total: u32 = cigar
            .iter()
            .filter(|&&c| c & 0xf == crate::ksw::CIGAR_M)
            .map(|&c| c >> 4)
            .sum();
        assert_eq!(m_total, 20, "cigar {} must consume 20 reference bases", s);
        assert!(s.contains("1I"), "cigar {} must contain the insertion", s);
    }
}
