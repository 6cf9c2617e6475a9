use config::{Config, Environment};
use serde::Deserialize;

use crate::generator::DEFAULT_MAX_ATTEMPTS;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,

    #[serde(default = "default_fixture_path")]
    pub fixture_path: String,

    #[serde(default = "default_brand_code")]
    pub brand_code: String,

    #[serde(default = "default_oui_prefix")]
    pub oui_prefix: String,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Most recent entries per namespace to load; unset loads full history
    pub history_window: Option<usize>,

    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: usize,

    /// Batches at least this large are generated across `workers`
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_snapshot_path() -> String {
    "used_devices.json".to_string()
}

fn default_fixture_path() -> String {
    "devices.csv".to_string()
}

fn default_brand_code() -> String {
    "DEVGEN".to_string()
}

fn default_oui_prefix() -> String {
    "02:00:00".to_string()
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_checkpoint_interval() -> usize {
    10_000
}

fn default_parallel_threshold() -> usize {
    10_000
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            .add_source(
                Environment::with_prefix("DEVICEGEN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            fixture_path: default_fixture_path(),
            brand_code: default_brand_code(),
            oui_prefix: default_oui_prefix(),
            max_attempts: default_max_attempts(),
            workers: default_workers(),
            history_window: None,
            checkpoint_interval: default_checkpoint_interval(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}
