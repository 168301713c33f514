use clap::{Parser, Subcommand};
use std::path::PathBuf;

use seedmap::align::pipeline;
use seedmap::index::BwaIndex;
use seedmap::mem_opt::{MemOpt, MEM_F_HARDCLIP};

#[derive(Parser)]
#[command(name = "seedmap")]
#[command(about = "seedmap - BWA-MEM-style short-read aligner", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the FM-index for a reference genome
    Index {
        /// Input FASTA file
        #[arg(value_name = "REF.FA")]
        fasta: PathBuf,

        /// Prefix for index files (default: same as FASTA)
        #[arg(short = 'p', long, value_name = "PREFIX")]
        prefix: Option<PathBuf>,
    },

    /// Align reads to an indexed reference
    Mem {
        /// Index prefix (built with 'index')
        #[arg(value_name = "INDEX")]
        index: PathBuf,

        /// FASTQ file(s) - one for single-end, two for paired-end
        #[arg(value_name = "READS.FQ", required = true)]
        reads: Vec<PathBuf>,

        // ===== Seeding =====
        /// Minimum seed length
        #[arg(short = 'k', long, value_name = "INT", default_value = "19")]
        min_seed_len: i32,

        /// Cap on forward seed extension length
        #[arg(short = 'l', long, value_name = "INT", default_value = "32")]
        max_seed_len: i32,

        /// Minimum suffix-array interval size kept during seeding
        #[arg(short = 'y', long, value_name = "INT", default_value = "10")]
        min_intv: u64,

        /// Skip seeds with more than INT occurrences
        #[arg(short = 'c', long, value_name = "INT", default_value = "10000")]
        max_occ: u64,

        // ===== Chaining and filtering =====
        /// Band width for chaining and banded alignment
        #[arg(short = 'w', long, value_name = "INT", default_value = "100")]
        band_width: i32,

        /// Maximum per-axis gap between chained seeds
        #[arg(short = 'g', long, value_name = "INT", default_value = "10000")]
        max_chain_gap: i32,

        /// Drop chains below FLOAT of the best overlapping chain's weight
        #[arg(short = 'D', long, value_name = "FLOAT", default_value = "0.50")]
        chain_drop_ratio: f32,

        /// Overlap fraction at which chains or regions compete
        #[arg(short = 'M', long, value_name = "FLOAT", default_value = "0.50")]
        mask_level: f32,

        // ===== Scoring =====
        /// Match score
        #[arg(short = 'A', long, value_name = "INT", default_value = "1")]
        match_score: i32,

        /// Mismatch penalty
        #[arg(short = 'B', long, value_name = "INT", default_value = "4")]
        mismatch_penalty: i32,

        /// Gap open penalty
        #[arg(short = 'O', long, value_name = "INT", default_value = "6")]
        gap_open: i32,

        /// Gap extension penalty
        #[arg(short = 'E', long, value_name = "INT", default_value = "1")]
        gap_extend: i32,

        /// Penalty for an unpaired read pair
        #[arg(short = 'U', long, value_name = "INT", default_value = "9")]
        unpaired_penalty: i32,

        // ===== Input/output =====
        /// Output SAM file (default: stdout)
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<String>,

        /// Use hard clipping instead of soft clipping
        #[arg(short = 'H', long)]
        hard_clip: bool,

        /// Process INT input bases per thread in each batch
        #[arg(short = 'K', long, value_name = "INT")]
        chunk_size: Option<i64>,

        /// Verbose level: 1=error, 2=warning, 3=message, 4+=debugging
        #[arg(short = 'v', long, value_name = "INT", default_value = "3")]
        verbosity: i32,

        /// Number of threads (default: all available cores)
        #[arg(short = 't', long, value_name = "INT")]
        threads: Option<usize>,
    },
}

fn init_logger(verbosity: i32) {
    let level = match verbosity {
        v if v <= 1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Index { fasta, prefix } => {
            init_logger(3);
            let idx_prefix = prefix.unwrap_or_else(|| fasta.clone());
            log::info!("building index for {}", fasta.display());
            if let Err(e) = BwaIndex::build(&fasta, &idx_prefix) {
                log::error!("index building failed: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Mem {
            index,
            reads,
            min_seed_len,
            max_seed_len,
            min_intv,
            max_occ,
            band_width,
            max_chain_gap,
            chain_drop_ratio,
            mask_level,
            match_score,
            mismatch_penalty,
            gap_open,
            gap_extend,
            unpaired_penalty,
            output,
            hard_clip,
            chunk_size,
            verbosity,
            threads,
        } => {
            init_logger(verbosity);

            if reads.len() > 2 {
                log::error!("at most 2 read files allowed, got {}", reads.len());
                std::process::exit(1);
            }

            let mut opt = MemOpt::default();
            opt.min_seed_len = min_seed_len;
            opt.max_seed_len = max_seed_len;
            opt.min_intv = min_intv;
            opt.max_occ = max_occ;
            opt.w = band_width;
            opt.max_chain_gap = max_chain_gap;
            opt.chain_drop_ratio = chain_drop_ratio;
            opt.mask_level = mask_level;
            opt.update_scoring(match_score, mismatch_penalty);
            opt.q = gap_open;
            opt.r = gap_extend;
            opt.pen_unpaired = unpaired_penalty;
            if hard_clip {
                opt.flag |= MEM_F_HARDCLIP;
            }
            if let Some(cs) = chunk_size {
                opt.chunk_size = cs;
            }

            let mut n_threads = threads.unwrap_or_else(num_cpus::get).max(1);
            let max_threads = num_cpus::get() * 2;
            if n_threads > max_threads {
                log::warn!(
                    "thread count {} exceeds recommended maximum {}, capping",
                    n_threads,
                    max_threads
                );
                n_threads = max_threads;
            }
            opt.n_threads = n_threads as i32;
            if let Err(e) = rayon::ThreadPoolBuilder::new()
                .num_threads(n_threads)
                .build_global()
            {
                log::warn!("thread pool already initialized: {}", e);
            }
            log::info!(
                "using {} thread{}",
                n_threads,
                if n_threads == 1 { "" } else { "s" }
            );
            if verbosity >= 3 {
                log::info!(
                    "seeding: k={} l={} y={} c={}",
                    opt.min_seed_len,
                    opt.max_seed_len,
                    opt.min_intv,
                    opt.max_occ
                );
                log::info!(
                    "scoring: A={} B={} O={} E={} w={}",
                    opt.a,
                    opt.b,
                    opt.q,
                    opt.r,
                    opt.w
                );
            }

            let read_files: Vec<String> = reads
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            if let Err(e) = pipeline::main_mem(&index, &read_files, output.as_ref(), &opt) {
                log::error!("alignment failed: {}", e);
                std::process::exit(1);
            }
        }
    }
}
