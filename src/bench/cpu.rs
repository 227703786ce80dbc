//! CPU-bound work unit
//!
//! A tight floating point loop. Runs on the blocking pool so that units
//! execute in parallel across cores instead of starving the async workers.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::bench::CancelToken;
use crate::config::CpuWorkload;
use crate::models::TaskOutcome;
use crate::{BenchError, Result};

/// Sum of `sqrt(i * r)` for `i` in `0..n`, with `r` uniform in `[0, 1)`
pub fn heavy_computation(n: usize) -> f64 {
    let mut rng = SmallRng::from_entropy();
    let mut sum = 0.0;
    for i in 0..n {
        sum += (i as f64 * rng.gen::<f64>()).sqrt();
    }
    sum
}

/// Run one CPU unit to completion
///
/// Cancellation resolves the unit at once; the loop itself cannot be
/// interrupted and finishes on the blocking pool with its result discarded.
pub async fn run_unit(workload: CpuWorkload, cancel: &CancelToken) -> Result<TaskOutcome> {
    cancel.check()?;
    let iterations = workload.iterations;
    let handle = tokio::task::spawn_blocking(move || heavy_computation(iterations));
    let checksum = cancel.guard(async { Ok::<_, BenchError>(handle.await?) }).await?;

    Ok(TaskOutcome {
        checksum: Some(checksum),
        ..TaskOutcome::default()
    })
}
