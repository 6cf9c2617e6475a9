use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::GenerateOptions;
use crate::config::Settings;
use crate::domain::{BrandCode, OuiPrefix};
use crate::error::Result;

#[derive(Debug, Parser)]
#[command(
    name = "devicegen",
    version,
    about = "Generate unique device serial numbers and MAC addresses for load-test fixtures"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate devices, write the fixture file and update the snapshot
    Generate(GenerateArgs),
    /// Show what a snapshot holds
    Stats {
        /// Snapshot file (default from DEVICEGEN__SNAPSHOT_PATH)
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
}

/// Flags override the values loaded into [`Settings`]
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Number of devices to generate
    #[arg(long, default_value_t = 1000)]
    pub count: usize,

    /// Up to six letters leading every serial number
    #[arg(long)]
    pub brand_code: Option<String>,

    /// First three MAC octets, e.g. 02:00:00
    #[arg(long)]
    pub oui_prefix: Option<String>,

    /// Draws per identifier before giving up
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Concurrent workers for large batches
    #[arg(long)]
    pub workers: Option<usize>,

    /// Snapshot of previously issued identifiers
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Fixture file to write
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Load only this many of the most recent snapshot entries per namespace
    #[arg(long)]
    pub history_window: Option<usize>,

    /// Append to the fixture file instead of replacing it
    #[arg(long)]
    pub append: bool,
}

impl GenerateArgs {
    pub fn resolve(&self, settings: &Settings) -> Result<GenerateOptions> {
        let brand_code = BrandCode::new(self.brand_code.as_deref().unwrap_or(&settings.brand_code))?;
        let oui_prefix = OuiPrefix::parse(self.oui_prefix.as_deref().unwrap_or(&settings.oui_prefix))?;

        Ok(GenerateOptions {
            count: self.count,
            brand_code,
            oui_prefix,
            max_attempts: self.max_attempts.unwrap_or(settings.max_attempts),
            workers: self.workers.unwrap_or(settings.workers).max(1),
            snapshot_path: self
                .snapshot
                .clone()
                .unwrap_or_else(|| PathBuf::from(&settings.snapshot_path)),
            fixture_path: self
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(&settings.fixture_path)),
            history_window: self.history_window.or(settings.history_window),
            checkpoint_interval: settings.checkpoint_interval.max(1),
            parallel_threshold: settings.parallel_threshold,
            append: self.append,
        })
    }
}
