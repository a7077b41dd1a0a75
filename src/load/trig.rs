//! Trigonometric busy-loop behind `/heavy` and `cpu-loadgen burn`

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use super::pool::{deadline_after, run_workers};
use crate::error::Result;

/// Iterations between deadline checks
const BLOCK_ITERATIONS: u64 = 100_000;

/// Outcome of one trigonometric load run
#[derive(Debug, Clone, Serialize)]
pub struct TrigSummary {
    /// Workers that ran
    pub workers: usize,

    /// Requested wall-clock duration
    #[serde(with = "duration_secs")]
    pub duration_requested: Duration,

    /// Measured wall-clock duration
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,

    /// Sum of all worker iterations
    pub total_iterations: u64,

    /// Iterations per worker, in worker order
    pub per_worker: Vec<u64>,
}

/// Spin `workers` threads on sin/cos/sqrt arithmetic until `duration` has
/// elapsed, then report their iteration counts.
pub fn run_trig_load(duration: Duration, workers: usize) -> Result<TrigSummary> {
    let start = Instant::now();
    let deadline = deadline_after(start, duration)?;

    let per_worker = run_workers(workers, "heavy", move |worker_id| {
        let iterations = burn_until(deadline);
        debug!(worker_id, iterations, "Heavy worker completed");
        iterations
    })?;

    Ok(TrigSummary {
        workers,
        duration_requested: duration,
        elapsed: start.elapsed(),
        total_iterations: per_worker.iter().sum(),
        per_worker,
    })
}

/// Run full blocks of arithmetic until `deadline`; returns iterations done
fn burn_until(deadline: Instant) -> u64 {
    let mut result = 0.0f64;
    let mut iterations = 0u64;

    while Instant::now() < deadline {
        for j in 0..BLOCK_ITERATIONS {
            let x = j as f64;
            result += x.sin() * x.cos();
            result = result.abs().sqrt();
        }
        iterations += BLOCK_ITERATIONS;
        std::hint::black_box(result);
    }

    iterations
}

/// Serialize a `Duration` as fractional seconds
mod duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}
