//! The seed-and-extend alignment pipeline.
//!
//! Per-read data flows seeding -> chaining -> filtering -> extension ->
//! finalization -> CIGAR/SAM; `pipeline` fans the batch out across worker
//! threads in two passes so paired-end statistics can be gathered between
//! them.

pub mod chaining;
pub mod cigar;
pub mod extension;
pub mod filter;
pub mod finalization;
pub mod paired;
pub mod pipeline;
pub mod sam;
pub mod seeding;
