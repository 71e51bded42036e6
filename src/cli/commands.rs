//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Blobsink CLI
#[derive(Parser, Debug)]
#[command(name = "blobsink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a pipeline configuration file
    Validate {
        /// Pipeline configuration file (YAML)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Replay a JSONL record file through the pipeline
    Run {
        /// Pipeline configuration file (YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Input file with one record per line (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Maximum records to route
        #[arg(long)]
        max_records: Option<usize>,
    },
}
