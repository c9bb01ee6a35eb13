//! TDP CLI Library
//!
//! Command-line interface for the Trip Data Pipeline.
//!
//! # Overview
//!
//! The pipeline has two stages, exposed as two subcommands:
//!
//! - **Fetch**: download dated dataset partitions into a canonical,
//!   crash-safe on-disk layout (`tdp fetch`)
//! - **Ingest**: register downloaded files into a checksum-verified
//!   SQLite ledger (`tdp ingest`)

pub mod commands;
pub mod config;
pub mod error;
pub mod fetch;
pub mod ingest;
pub mod layout;
pub mod ledger;
pub mod progress;
pub mod sidecar;

// Re-export commonly used types
pub use config::Config;
pub use error::{CliError, Result};

use clap::{Parser, Subcommand};

/// TDP - Trip Data Pipeline
#[derive(Parser, Debug)]
#[command(name = "tdp")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download raw dataset partitions from the remote archive
    Fetch {
        /// Dataset name (e.g. "yellow_tripdata")
        #[arg(long)]
        dataset: String,

        /// Fetch all 12 months of YYYY (or a single month with --month)
        #[arg(long)]
        year: Option<i32>,

        /// Single month (1-12), requires --year
        #[arg(long)]
        month: Option<u32>,

        /// Start month YYYY-MM (inclusive), requires --to
        #[arg(long = "from", value_name = "YYYY-MM")]
        from: Option<String>,

        /// End month YYYY-MM (inclusive), requires --from
        #[arg(long = "to", value_name = "YYYY-MM")]
        to: Option<String>,

        /// Root directory for the raw file tree
        #[arg(long, env = "TDP_RAW_ROOT")]
        raw_root: String,
    },

    /// Register raw files into the ingestion ledger
    Ingest {
        /// Compute checksums and show the plan without writing the ledger
        #[arg(long)]
        dry_run: bool,

        /// Root directory for the raw file tree
        #[arg(long, env = "TDP_RAW_ROOT", default_value = "data/raw")]
        raw_root: String,

        /// Path to the ledger database
        #[arg(long, env = "TDP_DB_PATH", default_value = "data/ledger.db")]
        db_path: String,
    },
}
