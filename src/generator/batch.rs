use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::{Generator, DEFAULT_MAX_ATTEMPTS};
use crate::domain::{BrandCode, Device, OuiPrefix};
use crate::error::Error;

const PROGRESS_INTERVAL: u64 = 10_000;

type WorkerResult = (Vec<Device>, Option<Error>);

/// Wait for every worker, keeping what each produced.
///
/// A worker that panicked or was cancelled is reported in place of any
/// exhaustion error, but the devices the other workers already claimed are
/// still returned.
async fn collect_workers(
    tasks: &mut JoinSet<WorkerResult>,
    capacity: usize,
) -> (Vec<Device>, Option<Error>) {
    let mut devices = Vec::with_capacity(capacity);
    let mut exhausted = None;
    let mut join_error = None;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((produced, error)) => {
                devices.extend(produced);
                if exhausted.is_none() {
                    exhausted = error;
                }
            }
            Err(e) => {
                error!("Batch worker failed: {}", e);
                if join_error.is_none() {
                    join_error = Some(Error::from(e));
                }
            }
        }
    }

    (devices, join_error.or(exhausted))
}

#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub count: usize,
    pub brand_code: BrandCode,
    pub oui_prefix: OuiPrefix,
    pub max_attempts: u32,
}

impl BatchRequest {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            brand_code: BrandCode::default(),
            oui_prefix: OuiPrefix::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Devices produced by a batch, plus the error that cut it short if any.
///
/// A batch that stops early is never reported as complete.
#[derive(Debug)]
pub struct BatchOutcome {
    pub requested: usize,
    pub devices: Vec<Device>,
    pub failure: Option<Error>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.devices.len() == self.requested
    }

    /// How many requested devices were not produced
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.devices.len())
    }
}

impl Generator {
    /// Generate `request.count` devices on the calling thread, stopping at the first exhaustion
    pub fn generate_batch(&self, request: &BatchRequest) -> BatchOutcome {
        let mut rng = rand::rng();
        let mut devices = Vec::with_capacity(request.count);
        let mut failure = None;

        for _ in 0..request.count {
            match self.generate_device_with(
                &mut rng,
                &request.brand_code,
                &request.oui_prefix,
                request.max_attempts,
            ) {
                Ok(device) => devices.push(device),
                Err(e) => {
                    warn!(
                        "Batch stopped after {} of {} devices: {}",
                        devices.len(),
                        request.count,
                        e
                    );
                    failure = Some(e);
                    break;
                }
            }
        }

        BatchOutcome {
            requested: request.count,
            devices,
            failure,
        }
    }

    /// Generate a batch across `workers` blocking tasks sharing this generator's registry.
    ///
    /// Workers pull slots from a shared counter. The first exhaustion stops every
    /// worker; devices already produced are kept and the error is reported in the
    /// outcome. A failed worker is reported the same way once the rest have
    /// finished. Output order is not the issuance order.
    pub async fn generate_batch_parallel(
        &self,
        request: &BatchRequest,
        workers: usize,
    ) -> BatchOutcome {
        let workers = workers.clamp(1, request.count.max(1));
        let remaining = Arc::new(AtomicUsize::new(request.count));
        let stop = Arc::new(AtomicBool::new(false));
        let completed = Arc::new(AtomicU64::new(0));
        let start = Instant::now();

        debug!(
            "Generating {} devices with {} workers",
            request.count, workers
        );

        let mut tasks: JoinSet<WorkerResult> = JoinSet::new();
        for _ in 0..workers {
            let generator = self.clone();
            let request = request.clone();
            let remaining = remaining.clone();
            let stop = stop.clone();
            let completed = completed.clone();
            let total = request.count;

            tasks.spawn_blocking(move || {
                let mut rng = rand::rng();
                let mut devices = Vec::new();

                while !stop.load(Ordering::Acquire) {
                    let slot = remaining.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                        n.checked_sub(1)
                    });
                    if slot.is_err() {
                        break;
                    }

                    match generator.generate_device_with(
                        &mut rng,
                        &request.brand_code,
                        &request.oui_prefix,
                        request.max_attempts,
                    ) {
                        Ok(device) => {
                            devices.push(device);
                            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                            if done % PROGRESS_INTERVAL == 0 {
                                info!("Generated {}/{} devices", done, total);
                            }
                        }
                        Err(e) => {
                            stop.store(true, Ordering::Release);
                            return (devices, Some(e));
                        }
                    }
                }

                (devices, None)
            });
        }

        let (devices, failure) = collect_workers(&mut tasks, request.count).await;

        match &failure {
            Some(e) => warn!(
                "Parallel batch stopped after {} of {} devices: {}",
                devices.len(),
                request.count,
                e
            ),
            None => info!(
                "Generated {} devices in {:?}",
                devices.len(),
                start.elapsed()
            ),
        }

        BatchOutcome {
            requested: request.count,
            devices,
            failure,
        }
    }
}
