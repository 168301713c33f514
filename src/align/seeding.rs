//! Lazy SMEM iteration over a query.
//!
//! Each call to [`SmemIterator::next`] advances the cursor once and yields
//! every super-maximal exact match anchored at the old cursor position,
//! together with the internal MEMs the search discovers for free. Length
//! and occurrence filtering belong to the chainer, not here.

use crate::index::bwt::{Bwt, BwtIntv};

/// Streaming SMEM finder; one instance per worker, reset per query.
pub struct SmemIterator<'a> {
    bwt: &'a Bwt,
    query: &'a [u8],
    start: i32,
    matches: Vec<BwtIntv>,
    tmp: [Vec<BwtIntv>; 2],
}

impl<'a> SmemIterator<'a> {
    pub fn new(bwt: &'a Bwt) -> Self {
        SmemIterator {
            bwt,
            query: &[],
            start: 0,
            matches: Vec::new(),
            tmp: [Vec::new(), Vec::new()],
        }
    }

    /// Point the iterator at a new query (2-bit codes, 4 = ambiguous).
    pub fn set_query(&mut self, query: &'a [u8]) {
        self.query = query;
        self.start = 0;
    }

    /// Produce the next batch of match intervals, or `None` once the cursor
    /// has consumed the query. A `Some` batch may be empty; iteration
    /// continues regardless.
    pub fn next(&mut self, max_len: i32, min_intv: u64) -> Option<&[BwtIntv]> {
        let len = self.query.len() as i32;
        self.matches.clear();
        if self.start >= len || self.start < 0 {
            return None;
        }
        // ambiguous bases cannot anchor a match
        while self.start < len && self.query[self.start as usize] > 3 {
            self.start += 1;
        }
        if self.start == len {
            return None;
        }
        self.start = self.bwt.smem1(
            self.query,
            self.start,
            max_len,
            min_intv,
            &mut self.matches,
            &mut self.tmp,
        );
        Some(&self.matches)
    }
}
