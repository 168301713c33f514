//! FASTQ input with transparent gzip support.
//!
//! Reads are handed to the pipeline in batches sized by total bases so the
//! worker pool always has a full batch to chew on, independent of read
//! length.

use std::fs::File;
use std::io::{self, BufReader, Read};

use bio::io::fastq;
use flate2::read::MultiGzDecoder;

use crate::index::bntseq::NST_NT4_TABLE;

/// One query read, bases already encoded 0-3 with 4 for ambiguous.
#[derive(Debug, Clone)]
pub struct SeqRead {
    pub name: String,
    pub seq: Vec<u8>,
    pub qual: Option<String>,
}

/// FASTQ reader; `.gz` files (plain gzip or bgzip) are decompressed on the
/// fly.
pub struct FastqReader {
    records: fastq::Records<BufReader<Box<dyn Read + Send>>>,
}

impl FastqReader {
    pub fn open(path: &str) -> io::Result<FastqReader> {
        let file = File::open(path)?;
        let reader: Box<dyn Read + Send> = if path.ends_with(".gz") {
            Box::new(MultiGzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(FastqReader {
            records: fastq::Reader::new(reader).records(),
        })
    }

    fn next_read(&mut self) -> io::Result<Option<SeqRead>> {
        match self.records.next() {
            None => Ok(None),
            Some(Err(e)) => Err(io::Error::other(e)),
            Some(Ok(rec)) => {
                let seq = rec
                    .seq()
                    .iter()
                    .map(|&b| NST_NT4_TABLE[b as usize])
                    .collect();
                let qual = if rec.qual().is_empty() {
                    None
                } else {
                    Some(String::from_utf8_lossy(rec.qual()).into_owned())
                };
                Ok(Some(SeqRead {
                    name: rec.id().to_string(),
                    seq,
                    qual,
                }))
            }
        }
    }

    /// Read until roughly `max_bases` query bases are buffered.
    pub fn read_batch(&mut self, max_bases: i64) -> io::Result<Vec<SeqRead>> {
        let mut batch = Vec::new();
        let mut bases: i64 = 0;
        while bases < max_bases {
            match self.next_read()? {
                None => break,
                Some(read) => {
                    bases += read.seq.len() as i64;
                    batch.push(read);
                }
            }
        }
        Ok(batch)
    }

    /// Read an interleaved batch from two mate files; mates of pair `i` land
    /// at indices `2i` and `2i+1`. Stops at the shorter file with a warning.
    pub fn read_paired_batch(
        r1: &mut FastqReader,
        r2: &mut FastqReader,
        max_bases: i64,
    ) -> io::Result<Vec<SeqRead>> {
        let mut batch = Vec::new();
        let mut bases: i64 = 0;
        while bases < max_bases {
            match (r1.next_read()?, r2.next_read()?) {
                (Some(a), Some(b)) => {
                    bases += (a.seq.len() + b.seq.len()) as i64;
                    batch.push(a);
                    batch.push(b);
                }
                (None, None) => break,
                (a, b) => {
                    log::warn!(
                        "mate files end at different lengths; dropping the unpaired read"
                    );
                    drop((a, b));
                    break;
                }
            }
        }
        Ok(batch)
    }
}
