//! CLI module
//!
//! Command-line interface for validating configurations and replaying
//! record files through a pipeline.
//!
//! # Commands
//!
//! - `validate` - Load and validate a configuration file
//! - `run` - Replay a JSONL record file into the configured destination

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
