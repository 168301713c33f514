//! Two-pass batch driver.
//!
//! Pass 1 turns every read into a vector of alignment regions, fully in
//! parallel. Paired-end insert-size statistics can then be taken over the
//! whole batch before pass 2 formats the SAM records, again in parallel,
//! with both mates of a pair handled as one work item. Output is gathered
//! in input order.

use std::io::{self, Write};
use std::path::Path;

use rayon::prelude::*;

use crate::index::BwaIndex;
use crate::io::fastq::{FastqReader, SeqRead};
use crate::io::sam_writer;
use crate::mem_opt::{MemOpt, MEM_F_PE};

use super::chaining::{dump_chains, mem_chain};
use super::extension::{mem_chain2aln, AlnReg};
use super::filter::mem_chain_flt;
use super::finalization::{mem_mark_primary_se, mem_sort_and_dedup};
use super::paired::{mem_pestat, mem_sam_pe};
use super::sam::mem_sam_se;

/// Pass-1 pipeline for one read: seed, chain, filter, extend, dedup.
pub fn find_alnreg(opt: &MemOpt, idx: &BwaIndex, query: &[u8]) -> Vec<AlnReg> {
    let chains = mem_chain(opt, &idx.bwt, query);
    let chains = mem_chain_flt(opt, chains);
    if log::log_enabled!(log::Level::Debug) {
        dump_chains(&idx.bns, &chains);
    }
    let mut regs = Vec::new();
    for c in &chains {
        mem_chain2aln(opt, idx.bns.l_pac as i64, &idx.pac, query, c, &mut regs);
    }
    mem_sort_and_dedup(&mut regs);
    regs
}

/// Align one batch of reads and write their SAM records in input order.
pub fn mem_process_seqs<W: Write>(
    opt: &MemOpt,
    idx: &BwaIndex,
    seqs: Vec<SeqRead>,
    out: &mut W,
) -> io::Result<()> {
    let n = seqs.len();

    // pass 1: per-read region vectors
    let mut regs: Vec<Vec<AlnReg>> = seqs
        .par_iter()
        .map(|s| find_alnreg(opt, idx, &s.seq))
        .collect();

    // between the passes: batch-wide pair statistics
    let pes = if opt.flag & MEM_F_PE != 0 {
        Some(mem_pestat(opt, idx.bns.l_pac as i64, &regs))
    } else {
        None
    };

    // pass 2: SAM formatting
    let sams: Vec<String> = if let Some(pes) = pes {
        if n % 2 != 0 {
            log::warn!("paired-end batch holds {} reads; the last one is dropped", n);
        }
        let n_even = n - n % 2;
        seqs[..n_even]
            .par_chunks(2)
            .zip(regs[..n_even].par_chunks_mut(2))
            .enumerate()
            .map(|(id, (pair, regs2))| {
                let pair: &[SeqRead; 2] = pair.try_into().unwrap();
                let regs2: &mut [Vec<AlnReg>; 2] = regs2.try_into().unwrap();
                let (s0, s1, _) =
                    mem_sam_pe(opt, &idx.bns, &idx.pac, &pes, id as u64, pair, regs2);
                format!("{}{}", s0, s1)
            })
            .collect()
    } else {
        seqs.par_iter()
            .zip(regs.par_iter_mut())
            .map(|(s, r)| {
                mem_mark_primary_se(opt, r);
                mem_sam_se(opt, &idx.bns, &idx.pac, s, r, 0, None)
            })
            .collect()
    };

    for sam in &sams {
        out.write_all(sam.as_bytes())?;
    }
    Ok(())
}

/// Full `mem` run: load the index, stream read batches, emit SAM.
pub fn main_mem(
    index_prefix: &Path,
    read_files: &[String],
    output: Option<&String>,
    opt: &MemOpt,
) -> io::Result<()> {
    let mut opt = opt.clone();
    if read_files.len() == 2 {
        opt.flag |= MEM_F_PE;
    }

    let idx = BwaIndex::load(index_prefix)?;
    log::info!(
        "loaded index: {} sequence(s), {} bp",
        idx.bns.n_seqs,
        idx.bns.l_pac
    );

    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(io::BufWriter::new(std::fs::File::create(path)?)),
        None => Box::new(io::BufWriter::new(io::stdout())),
    };
    let command_line = std::env::args().collect::<Vec<_>>().join(" ");
    sam_writer::write_header(&mut out, &idx.bns, Some(&command_line))?;

    let batch_bases = opt.chunk_size * opt.n_threads.max(1) as i64;
    let mut n_done: u64 = 0;
    if opt.flag & MEM_F_PE != 0 {
        let mut r1 = FastqReader::open(&read_files[0])?;
        let mut r2 = FastqReader::open(&read_files[1])?;
        loop {
            let batch = FastqReader::read_paired_batch(&mut r1, &mut r2, batch_bases)?;
            if batch.is_empty() {
                break;
            }
            n_done += batch.len() as u64 / 2;
            mem_process_seqs(&opt, &idx, batch, &mut out)?;
            log::info!("processed {} read pairs", n_done);
        }
    } else {
        let mut r = FastqReader::open(&read_files[0])?;
        loop {
            let batch = r.read_batch(batch_bases)?;
            if batch.is_empty() {
                break;
            }
            n_done += batch.len() as u64;
            mem_process_seqs(&opt, &idx, batch, &mut out)?;
            log::info!("processed {} reads", n_done);
        }
    }
    out.flush()
}
