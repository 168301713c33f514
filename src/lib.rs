//! seedmap - a BWA-MEM-style short-read aligner.
//!
//! The crate is organized around the classic seed-and-extend pipeline:
//! SMEM seeding against an FM-index, colinear seed chaining, chain
//! filtering, banded extension into alignment regions, and SAM output.

pub mod align;
pub mod index;
pub mod io;
pub mod ksw;
pub mod mem_opt;
