// Alignment options shared by every pipeline stage.

/// Bit flag: reads arrive as pairs (2i, 2i+1) and pass 2 processes them together.
pub const MEM_F_PE: i32 = 0x2;
/// Bit flag: clip with H instead of S and drop clipped bases from SEQ/QUAL.
pub const MEM_F_HARDCLIP: i32 = 0x10;

/// Alignment options. Every field is a design-level lever of the pipeline;
/// the defaults reproduce classic BWA-MEM behavior.
#[derive(Debug, Clone)]
pub struct MemOpt {
    // Scoring parameters
    pub a: i32, // Match score
    pub b: i32, // Mismatch penalty
    pub q: i32, // Gap open penalty
    pub r: i32, // Gap extension penalty

    // Alignment parameters
    pub w: i32, // Band width for banded alignment

    // Seeding parameters
    pub min_seed_len: i32, // Reject SMEMs shorter than this
    pub max_seed_len: i32, // Cap on the forward extension length during SMEM search
    pub min_intv: u64,     // Minimum suffix-array interval size during SMEM search
    pub max_occ: u64,      // Skip a seed if its occurrence is larger than this value
    pub split_factor: f32, // Reserved for adaptive reseeding

    // Chaining parameters
    pub max_chain_gap: i32, // Do not chain a seed if it is max_chain_gap-bp away from the chain tail

    // Filtering parameters
    pub mask_level: f32,       // Overlap fraction at which two chains/regions compete
    pub chain_drop_ratio: f32, // Drop a chain whose weight is below this fraction of a better overlapping chain

    // Paired-end parameters
    pub max_ins: i32,      // Skip pairs with insert size above this when estimating the distribution
    pub pen_unpaired: i32, // Phred-scaled penalty for an unpaired read pair

    // Processing parameters
    pub n_threads: i32,  // Worker-thread count
    pub chunk_size: i64, // Process chunk_size-bp of queries in a batch

    // Flags (MEM_F_*)
    pub flag: i32,

    // Scoring matrix (5x5 for A,C,G,T,N), row-major
    pub mat: [i8; 25],
}

impl Default for MemOpt {
    fn default() -> Self {
        let mut opt = MemOpt {
            a: 1,
            b: 4,
            q: 6,
            r: 1,
            w: 100,
            min_seed_len: 19,
            max_seed_len: 32,
            min_intv: 10,
            max_occ: 10000,
            split_factor: 1.5,
            max_chain_gap: 10000,
            mask_level: 0.50,
            chain_drop_ratio: 0.50,
            max_ins: 10000,
            pen_unpaired: 9,
            n_threads: 1,
            chunk_size: 10_000_000,
            flag: 0,
            mat: [0; 25],
        };
        opt.fill_scoring_matrix();
        opt
    }
}

impl MemOpt {
    /// Fill the 5x5 substitution matrix from the match/mismatch scores.
    /// Row and column 4 (ambiguous base) are zero so that N never scores.
    pub fn fill_scoring_matrix(&mut self) {
        let mut k = 0;
        for i in 0..4 {
            for j in 0..4 {
                self.mat[k] = if i == j { self.a as i8 } else { -(self.b as i8) };
                k += 1;
            }
            self.mat[k] = 0; // ambiguous base
            k += 1;
        }
        for _ in 0..5 {
            self.mat[k] = 0;
            k += 1;
        }
    }

    /// Update match/mismatch scores and rebuild the matrix.
    pub fn update_scoring(&mut self, match_score: i32, mismatch_penalty: i32) {
        self.a = match_score;
        self.b = mismatch_penalty;
        self.fill_scoring_matrix();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let opt = MemOpt::default();
        assert_eq!(opt.a, 1);
        assert_eq!(opt.b, 4);
        assert_eq!(opt.q, 6);
        assert_eq!(opt.r, 1);
        assert_eq!(opt.w, 100);
        assert_eq!(opt.min_seed_len, 19);
        assert_eq!(opt.max_seed_len, 32);
        assert_eq!(opt.min_intv, 10);
        assert_eq!(opt.max_occ, 10000);
        assert_eq!(opt.max_chain_gap, 10000);
        assert_eq!(opt.mask_level, 0.50);
        assert_eq!(opt.chain_drop_ratio, 0.50);
        assert_eq!(opt.chunk_size, 10_000_000);
        assert_eq!(opt.pen_unpaired, 9);
        assert_eq!(opt.n_threads, 1);
        assert_eq!(opt.flag, 0);
    }

    #[test]
    fn test_scoring_matrix() {
        let opt = MemOpt::default();
        // Diagonal is the match score for A/C/G/T
        assert_eq!(opt.mat[0], 1);
        assert_eq!(opt.mat[6], 1);
        assert_eq!(opt.mat[12], 1);
        assert_eq!(opt.mat[18], 1);
        // Off-diagonal is the mismatch penalty
        assert_eq!(opt.mat[1], -4);
        assert_eq!(opt.mat[8], -4);
        // Row and column 4 are zero
        for i in 0..5 {
            assert_eq!(opt.mat[i * 5 + 4], 0);
            assert_eq!(opt.mat[4 * 5 + i], 0);
        }
    }

    #[test]
    fn test_update_scoring() {
        let mut opt = MemOpt::default();
        opt.update_scoring(2, 6);
        assert_eq!(opt.mat[0], 2);
        assert_eq!(opt.mat[1], -6);
    }
}
