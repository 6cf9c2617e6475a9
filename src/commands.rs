use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::domain::{BrandCode, OuiPrefix};
use crate::error::{Error, Result};
use crate::fixture::FixtureWriter;
use crate::generator::{BatchRequest, Generator};
use crate::registry::{Registry, Snapshot};

/// Fully resolved inputs for one `generate` run
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub count: usize,
    pub brand_code: BrandCode,
    pub oui_prefix: OuiPrefix,
    pub max_attempts: u32,
    pub workers: usize,
    pub snapshot_path: PathBuf,
    pub fixture_path: PathBuf,
    pub history_window: Option<usize>,
    pub checkpoint_interval: usize,
    pub parallel_threshold: usize,
    pub append: bool,
}

#[derive(Debug)]
pub struct GenerateReport {
    pub requested: usize,
    pub generated: usize,
    pub failure: Option<Error>,
}

impl GenerateReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.generated == self.requested
    }
}

/// Load the registry, generate in checkpointed chunks, write the fixture and persist.
///
/// The snapshot is persisted after every chunk, including the chunk that hit
/// exhaustion or lost a worker. Exhaustion yields a partial report; a lost
/// worker and I/O failures abort the run with an error.
pub async fn generate(options: &GenerateOptions) -> Result<GenerateReport> {
    let registry = Arc::new(Registry::load_with_window(
        &options.snapshot_path,
        options.history_window,
    )?);
    generate_with(Generator::new(registry), options).await
}

/// Like [`generate`] but with a caller-built generator
pub async fn generate_with(
    generator: Generator,
    options: &GenerateOptions,
) -> Result<GenerateReport> {
    let mut writer = FixtureWriter::new(&options.fixture_path).appending(options.append);
    let mut remaining = options.count;
    let mut generated = 0;

    info!(
        "Generating {} devices (brand {}, prefix {}, max attempts {})",
        options.count, options.brand_code, options.oui_prefix, options.max_attempts
    );

    // An empty run still leaves a fixture header and a snapshot behind.
    if remaining == 0 {
        writer.write(&[])?;
        generator.registry().persist(&options.snapshot_path)?;
    }

    while remaining > 0 {
        let chunk = remaining.min(options.checkpoint_interval.max(1));
        let request = BatchRequest {
            count: chunk,
            brand_code: options.brand_code.clone(),
            oui_prefix: options.oui_prefix,
            max_attempts: options.max_attempts,
        };

        let outcome = if options.workers > 1 && chunk >= options.parallel_threshold {
            generator
                .generate_batch_parallel(&request, options.workers)
                .await
        } else {
            generator.generate_batch(&request)
        };

        writer.write(&outcome.devices)?;
        writer = writer.appending(true);
        generator.registry().persist(&options.snapshot_path)?;

        generated += outcome.devices.len();
        remaining -= chunk;
        info!(
            "Checkpoint: {}/{} devices written to {}",
            generated,
            options.count,
            options.fixture_path.display()
        );

        if let Some(failure) = outcome.failure {
            // Claimed devices are on disk by now; anything but exhaustion is a hard error.
            if !failure.is_exhausted() {
                return Err(failure);
            }
            return Ok(GenerateReport {
                requested: options.count,
                generated,
                failure: Some(failure),
            });
        }
    }

    Ok(GenerateReport {
        requested: options.count,
        generated,
        failure: None,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotStats {
    pub exists: bool,
    pub serial_numbers: usize,
    pub mac_addresses: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

pub fn stats(path: &Path) -> Result<SnapshotStats> {
    let Some(snapshot) = Snapshot::read(path)? else {
        return Ok(SnapshotStats {
            exists: false,
            serial_numbers: 0,
            mac_addresses: 0,
            last_updated: None,
        });
    };

    Ok(SnapshotStats {
        exists: true,
        serial_numbers: snapshot.used_devices.serial_numbers.len(),
        mac_addresses: snapshot.used_devices.mac_addresses.len(),
        last_updated: snapshot.last_updated,
    })
}
