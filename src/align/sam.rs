//! SAM record formatting.
//!
//! One call formats one alignment line: flags, coordinates resolved through
//! the name table, CIGAR with soft or hard clips, mate fields, and the
//! `AS:i`/`XS:i` tags. Unmapped reads always produce exactly one record.

use std::fmt::Write as _;

use crate::align::extension::AlnReg;
use crate::align::finalization::mem_approx_mapq_se;
use crate::index::bntseq::BntSeq;
use crate::io::fastq::SeqRead;
use crate::ksw::CIGAR_OPS;
use crate::mem_opt::{MemOpt, MEM_F_HARDCLIP};

use super::cigar::bwa_gen_cigar;

/// Output-facing condensation of an alignment region.
#[derive(Debug, Clone, Copy, Default)]
pub struct BwaHit {
    pub rb: i64,
    pub re: i64,
    pub qb: i32,
    pub qe: i32,
    pub score: i32,
    pub sub: i32,
    pub qual: i32,
    pub flag: i32,
}

/// Condense a region for output; only the secondary bit is set here.
pub fn mem_alnreg_to_hit(a: &AlnReg) -> BwaHit {
    BwaHit {
        rb: a.rb,
        re: a.re,
        qb: a.qb,
        qe: a.qe,
        score: a.score,
        sub: a.sub.max(a.csub),
        qual: 0,
        flag: if a.secondary >= 0 { 0x100 } else { 0 },
    }
}

#[inline]
fn is_mapped(x: &BwaHit, l_pac: i64) -> bool {
    x.rb >= 0 && x.rb < x.re && x.re <= l_pac << 1
}

/// Append one SAM line for hit `p_` of read `s`; `None` emits an unmapped
/// record. `m` is the mate's hit when the read is paired.
#[allow(clippy::too_many_arguments)]
pub fn bwa_hit2sam(
    out: &mut String,
    mat: &[i8; 25],
    q: i32,
    r: i32,
    w: i32,
    bns: &BntSeq,
    pac: &[u8],
    s: &SeqRead,
    p_: Option<&BwaHit>,
    is_hard: bool,
    m: Option<&BwaHit>,
) {
    let l_pac = bns.l_pac as i64;
    let l_seq = s.seq.len() as i32;
    let mut p = match p_ {
        Some(h) => *h,
        None => BwaHit {
            rb: -1,
            re: -1,
            ..Default::default()
        },
    };

    p.flag |= if m.is_some() { 0x1 } else { 0 };
    p.flag |= if !is_mapped(&p, l_pac) { 0x4 } else { 0 };
    p.flag |= match m {
        Some(mm) if !is_mapped(mm, l_pac) => 0x8,
        _ => 0,
    };
    let mut copy_mate = false;
    if let Some(mm) = m {
        if !is_mapped(&p, l_pac) && is_mapped(mm, l_pac) {
            // unmapped read inherits the mate's coordinate, with no CIGAR
            p.rb = mm.rb;
            p.re = mm.re;
            p.qb = 0;
            p.qe = l_seq;
            copy_mate = true;
        }
    }
    p.flag |= if p.rb >= l_pac { 0x10 } else { 0 };
    p.flag |= match m {
        Some(mm) if mm.rb >= l_pac => 0x20,
        _ => 0,
    };

    out.push_str(&s.name);
    out.push('\t');
    let mut rid = -1i32;
    if is_mapped(&p, l_pac) {
        // has a coordinate, whether aligned or copied from the mate
        let cigar = if !copy_mate {
            let c = bwa_gen_cigar(
                mat,
                q,
                r,
                w,
                l_pac,
                pac,
                &s.seq[p.qb as usize..p.qe as usize],
                p.rb,
                p.re,
            )
            .map(|(_, c)| c)
            .unwrap_or_default();
            if c.is_empty() {
                p.flag |= 0x4; // the re-alignment produced nothing
            }
            c
        } else {
            Vec::new()
        };
        let (pos, is_rev) = bns.depos(if p.rb < l_pac { p.rb } else { p.re - 1 });
        let (_nn, mapped_rid) = bns.cnt_ambi(pos, p.re - p.rb);
        rid = mapped_rid;
        let ann = &bns.anns[rid as usize];
        let _ = write!(
            out,
            "{}\t{}\t{}\t{}\t",
            p.flag,
            ann.name,
            pos - ann.offset as i64 + 1,
            p.qual
        );
        if !cigar.is_empty() {
            let clip5 = if is_rev { l_seq - p.qe } else { p.qb };
            let clip3 = if is_rev { p.qb } else { l_seq - p.qe };
            let clip_op = if is_hard { 'H' } else { 'S' };
            if clip5 != 0 {
                let _ = write!(out, "{}{}", clip5, clip_op);
            }
            for c in &cigar {
                let _ = write!(out, "{}{}", c >> 4, CIGAR_OPS[(c & 0xf) as usize] as char);
            }
            if clip3 != 0 {
                let _ = write!(out, "{}{}", clip3, clip_op);
            }
        } else {
            out.push('*');
        }
    } else {
        // no coordinate at all
        let _ = write!(out, "{}\t*\t0\t0\t*", p.flag);
    }

    match m {
        Some(mm) if is_mapped(mm, l_pac) => {
            let (pos, _) = bns.depos(if mm.rb < l_pac { mm.rb } else { mm.re - 1 });
            let (_nn, mid) = bns.cnt_ambi(pos, mm.re - mm.rb);
            let mann = &bns.anns[mid as usize];
            out.push('\t');
            if mid == rid {
                out.push('=');
            } else {
                out.push_str(&mann.name);
            }
            let _ = write!(out, "\t{}\t", pos - mann.offset as i64 + 1);
            if mid == rid {
                let p0 = if p.rb < l_pac {
                    p.rb
                } else {
                    (l_pac << 1) - 1 - p.rb
                };
                let p1 = if mm.rb < l_pac {
                    mm.rb
                } else {
                    (l_pac << 1) - 1 - mm.rb
                };
                let _ = write!(out, "{}", p0 - p1);
            } else {
                out.push('0');
            }
            out.push('\t');
        }
        _ => out.push_str("\t*\t0\t0\t"),
    }

    // SEQ and QUAL on the forward strand; hard clipping drops clipped bases
    let (qb, qe) = if p.flag & 0x4 == 0 && is_hard {
        (p.qb as usize, p.qe as usize)
    } else {
        (0, l_seq as usize)
    };
    if p.flag & 0x10 == 0 {
        for &c in &s.seq[qb..qe] {
            out.push(b"ACGTN"[c as usize] as char);
        }
        out.push('\t');
        match &s.qual {
            Some(qual) => out.push_str(&qual[qb..qe]),
            None => out.push('*'),
        }
    } else {
        for &c in s.seq[qb..qe].iter().rev() {
            out.push(b"TGCAN"[c as usize] as char);
        }
        out.push('\t');
        match &s.qual {
            Some(qual) => out.extend(qual[qb..qe].chars().rev()),
            None => out.push('*'),
        }
    }

    if p.score >= 0 {
        let _ = write!(out, "\tAS:i:{}", p.score);
    }
    if p.sub >= 0 {
        let _ = write!(out, "\tXS:i:{}", p.sub);
    }
    out.push('\n');
}

/// Format every primary region of one read; an empty region list produces a
/// single unmapped record.
pub fn mem_sam_se(
    opt: &MemOpt,
    bns: &BntSeq,
    pac: &[u8],
    s: &SeqRead,
    regs: &[AlnReg],
    extra_flag: i32,
    m: Option<&BwaHit>,
) -> String {
    let mut out = String::new();
    let is_hard = opt.flag & MEM_F_HARDCLIP != 0;
    if !regs.is_empty() {
        for a in regs {
            if a.secondary >= 0 {
                continue;
            }
            let mut h = mem_alnreg_to_hit(a);
            h.flag |= extra_flag;
            h.qual = mem_approx_mapq_se(opt, a);
            bwa_hit2sam(
                &mut out, &opt.mat, opt.q, opt.r, opt.w, bns, pac, s, Some(&h), is_hard, m,
            );
        }
    } else {
        bwa_hit2sam(
            &mut out, &opt.mat, opt.q, opt.r, opt.w, bns, pac, s, None, is_hard, m,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::BwaIndex;

    fn encode(s: &[u8]) -> Vec<u8> {
        s.iter()
            .map(|&b| crate::index::bntseq::NST_NT4_TABLE[b as usize])
            .collect()
    }

    fn read(name: &str, seq: &[u8]) -> SeqRead {
        SeqRead {
            name: name.to_string(),
            seq: encode(seq),
            qual: Some("I".repeat(seq.len())),
        }
    }

    const REF: &[u8] = b"TTGACCAGTAAGGACTTCAGCCAATCGGTCAGCTTGGCCTATCAGAACTG";

    fn hit(rb: i64, re: i64, qb: i32, qe: i32, score: i32) -> BwaHit {
        BwaHit {
            rb,
            re,
            qb,
            qe,
            score,
            sub: 0,
            qual: 42,
            flag: 0,
        }
    }

    #[test]
    fn test_unmapped_record() {
        let idx = BwaIndex::from_fasta_bytes(b">chr1\nACGTACGTTGCAGGATCCAT\n").unwrap();
        let opt = MemOpt::default();
        let s = read("r1", b"TTTTTTTTTT");
        let line = mem_sam_se(&opt, &idx.bns, &idx.pac, &s, &[], 0, None);
        let fields: Vec<&str> = line.trim_end().split('\t').collect();
        assert_eq!(fields[0], "r1");
        assert_eq!(fields[1], "4");
        assert_eq!(fields[2], "*");
        assert_eq!(fields[3], "0");
        assert_eq!(fields[5], "*");
        assert_eq!(fields[9], "TTTTTTTTTT");
    }

    #[test]
    fn test_forward_hit_record() {
        let mut fasta = b">chr1\n".to_vec();
        fasta.extend_from_slice(REF);
        fasta.push(b'\n');
        let idx = BwaIndex::from_fasta_bytes(&fasta).unwrap();
        let opt = MemOpt::default();
        let s = read("r1", b"AGTAAGGACTTCAGCCAATC");
        let mut out = String::new();
        let h = hit(6, 26, 0, 20, 20);
        bwa_hit2sam(
            &mut out, &opt.mat, opt.q, opt.r, opt.w, &idx.bns, &idx.pac, &s, Some(&h), false,
            None,
        );
        let fields: Vec<&str> = out.trim_end().split('\t').collect();
        assert_eq!(fields[0], "r1");
        assert_eq!(fields[1], "0");
        assert_eq!(fields[2], "chr1");
        assert_eq!(fields[3], "7"); // 1-based
        assert_eq!(fields[4], "42");
        assert_eq!(fields[5], "20M");
        assert_eq!(fields[6], "*");
        assert_eq!(fields[9], "AGTAAGGACTTCAGCCAATC");
        assert!(fields.contains(&"AS:i:20"));
    }

    #[test]
    fn test_reverse_hit_emits_forward_reference_seq() {
        let mut fasta = b">chr1\n".to_vec();
        fasta.extend_from_slice(REF);
        fasta.push(b'\n');
        let idx = BwaIndex::from_fasta_bytes(&fasta).unwrap();
        let opt = MemOpt::default();
        let l_pac = idx.bns.l_pac as i64;
        // read is the reverse complement of REF[6..26]
        let mut rc = encode(b"AGTAAGGACTTCAGCCAATC");
        rc.reverse();
        for b in rc.iter_mut() {
            *b = 3 - *b;
        }
        let seq_ascii: Vec<u8> = rc.iter().map(|&c| b"ACGTN"[c as usize]).collect();
        let s = read("r1", &seq_ascii);
        let mut out = String::new();
        let h = hit(2 * l_pac - 26, 2 * l_pac - 6, 0, 20, 20);
        bwa_hit2sam(
            &mut out, &opt.mat, opt.q, opt.r, opt.w, &idx.bns, &idx.pac, &s, Some(&h), false,
            None,
        );
        let fields: Vec<&str> = out.trim_end().split('\t').collect();
        let flag: i32 = fields[1].parse().unwrap();
        assert_ne!(flag & 0x10, 0);
        assert_eq!(fields[2], "chr1");
        assert_eq!(fields[3], "7");
        assert_eq!(fields[5], "20M");
        // SEQ comes out reverse-complemented, i.e. the forward reference bases
        assert_eq!(fields[9], "AGTAAGGACTTCAGCCAATC");
    }

    #[test]
    fn test_soft_clip_partial_alignment() {
        let mut fasta = b">chr1\n".to_vec();
        fasta.extend_from_slice(REF);
        fasta.push(b'\n');
        let idx = BwaIndex::from_fasta_bytes(&fasta).unwrap();
        let opt = MemOpt::default();
        // 5 junk bases then 20 aligned ones
        let s = read("r1", b"CCCCCAGTAAGGACTTCAGCCAATC");
        let mut out = String::new();
        let h = hit(6, 26, 5, 25, 20);
        bwa_hit2sam(
            &mut out, &opt.mat, opt.q, opt.r, opt.w, &idx.bns, &idx.pac, &s, Some(&h), false,
            None,
        );
        let fields: Vec<&str> = out.trim_end().split('\t').collect();
        assert_eq!(fields[5], "5S20M");
        assert_eq!(fields[9].len(), 25); // soft clip keeps all bases
    }

    #[test]
    fn test_hard_clip_drops_bases() {
        let mut fasta = b">chr1\n".to_vec();
        fasta.extend_from_slice(REF);
        fasta.push(b'\n');
        let idx = BwaIndex::from_fasta_bytes(&fasta).unwrap();
        let opt = MemOpt::default();
        let s = read("r1", b"CCCCCAGTAAGGACTTCAGCCAATC");
        let mut out = String::new();
        let h = hit(6, 26, 5, 25, 20);
        bwa_hit2sam(
            &mut out, &opt.mat, opt.q, opt.r, opt.w, &idx.bns, &idx.pac, &s, Some(&h), true,
            None,
        );
        let fields: Vec<&str> = out.trim_end().split('\t').collect();
        assert_eq!(fields[5], "5H20M");
        assert_eq!(fields[9].len(), 20);
        assert_eq!(fields[10].len(), 20);
    }

    #[test]
    fn test_unmapped_with_mapped_mate_inherits_coordinate() {
        let mut fasta = b">chr1\n".to_vec();
        fasta.extend_from_slice(REF);
        fasta.push(b'\n');
        let idx = BwaIndex::from_fasta_bytes(&fasta).unwrap();
        let opt = MemOpt::default();
        let s = read("r1", b"TTTTTTTTTT");
        let mate = hit(6, 26, 0, 20, 20);
        let mut out = String::new();
        bwa_hit2sam(
            &mut out, &opt.mat, opt.q, opt.r, opt.w, &idx.bns, &idx.pac, &s, None, false,
            Some(&mate),
        );
        let fields: Vec<&str> = out.trim_end().split('\t').collect();
        let flag: i32 = fields[1].parse().unwrap();
        assert_ne!(flag & 0x1, 0);
        assert_ne!(flag & 0x4, 0);
        assert_eq!(fields[2], "chr1");
        assert_eq!(fields[3], "7"); // inherited coordinate
        assert_eq!(fields[5], "*"); // but no CIGAR
        assert_eq!(fields[6], "=");
        assert_eq!(fields[7], "7");
    }
}
