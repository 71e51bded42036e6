//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::SinkConfig;
use crate::error::{Result, ResultExt};
use crate::pipeline::SinkContext;
use crate::record::SinkRecord;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Validate { config } => self.validate(config),
            Commands::Run {
                config,
                input,
                max_records,
            } => self.replay(config, input, *max_records).await,
        }
    }

    /// Load and validate a configuration file
    fn validate(&self, config_path: &Path) -> Result<()> {
        let config = SinkConfig::from_yaml_file(config_path)?;
        println!("Configuration OK");
        println!("  name:        {}", config.name);
        println!("  topics:      {}", config.topics.join(", "));
        println!("  format:      {}", config.format);
        println!("  destination: {}", config.destination);
        Ok(())
    }

    /// Route every record in a JSONL file through a fresh pipeline
    async fn replay(
        &self,
        config_path: &Path,
        input_path: &Path,
        max_records: Option<usize>,
    ) -> Result<()> {
        let config = SinkConfig::from_yaml_file(config_path)?;
        let context = SinkContext::open(config).await?;

        let input = fs::read_to_string(input_path)
            .with_context(|| format!("failed to read {}", input_path.display()))?;
        let limit = max_records.unwrap_or(usize::MAX);
        let started = Instant::now();

        let mut routed = 0usize;
        let mut skipped = 0usize;
        for (number, line) in input.lines().enumerate() {
            if routed >= limit {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            let record: SinkRecord = match serde_json::from_str(line) {
                Ok(record) => record,
                Err(e) => {
                    warn!(line = number + 1, %e, "skipping unparseable record");
                    skipped += 1;
                    continue;
                }
            };
            context.route(&record).await?;
            routed += 1;
        }

        context.close().await?;

        info!(
            routed,
            skipped,
            elapsed_ms = started.elapsed().as_millis(),
            "replay complete"
        );
        println!("Routed {routed} records ({skipped} skipped)");
        Ok(())
    }
}
