//! CLI for the enrich rating pipeline.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use enrich_core::config::{self, EnrichConfig};
use std::path::PathBuf;

use commands::{run_enrich, run_merge};

/// Top-level CLI. Without a subcommand, enriches INPUT.
#[derive(Debug, Parser)]
#[command(name = "enrich")]
#[command(about = "Add a rating column to a CSV by looking up each title, resumably", long_about = None)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<CliCommand>,

    #[command(flatten)]
    pub enrich: EnrichArgs,

    /// Use this config file instead of ~/.config/enrich/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct EnrichArgs {
    /// CSV file with a title column. Progress goes to <name>_progress.csv,
    /// output to <name>_modified.csv.
    #[arg(required = true)]
    pub input: Option<PathBuf>,

    /// Rows per batch (and per progress flush).
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Number of concurrent workers.
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Look up again rows recorded without a rating on an earlier run.
    #[arg(long)]
    pub retry_misses: bool,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Join a dataset against a progress file by title and write <data>_modified.csv.
    Merge {
        /// CSV with a title column.
        data: PathBuf,
        /// Progress file with Title and Rating columns.
        progress: PathBuf,
    },
}

impl EnrichArgs {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply(&self, cfg: &mut EnrichConfig) {
        if let Some(n) = self.batch_size {
            cfg.batch_size = n;
        }
        if let Some(n) = self.workers {
            cfg.workers = n;
        }
        if self.retry_misses {
            cfg.retry_misses = true;
        }
    }
}

impl Cli {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = match &cli.config {
            Some(path) => config::load_or_init_at(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            Some(CliCommand::Merge { data, progress }) => run_merge(&cfg, &data, &progress)?,
            None => {
                cli.enrich.apply(&mut cfg);
                let input = cli
                    .enrich
                    .input
                    .ok_or_else(|| anyhow::anyhow!("missing <INPUT>"))?;
                run_enrich(&cfg, &input)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
