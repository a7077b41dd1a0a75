//! Fibonacci load
//!
//! Two shapes: a duration-bound run where every worker recomputes short
//! batches of the sequence until a deadline, and a bounded run that returns
//! the sequence up to a ceiling.

use std::time::{Duration, Instant};

use num_bigint::BigUint;
use tracing::debug;

use super::pool::{deadline_after, run_workers};
use crate::error::Result;

/// What one duration-bound worker achieved
#[derive(Debug, Clone)]
pub struct FibWorkerReport {
    /// Fibonacci additions performed
    pub computations: u64,

    /// Largest value this worker produced
    pub largest: BigUint,
}

/// Aggregate of a duration-bound Fibonacci run
#[derive(Debug, Clone)]
pub struct FibSummary {
    /// Workers that ran
    pub workers: usize,

    /// Measured wall-clock duration
    pub elapsed: Duration,

    /// Sum of computations across workers
    pub total_computations: u64,

    /// Largest value across workers
    pub largest: BigUint,
}

impl FibSummary {
    /// Throughput over the measured wall-clock time
    pub fn computations_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_computations as f64 / secs
        } else {
            0.0
        }
    }
}

/// Compute Fibonacci batches on `workers` threads until `duration` elapses.
pub fn run_fib_load(duration: Duration, workers: usize, batch_size: usize) -> Result<FibSummary> {
    let start = Instant::now();
    let deadline = deadline_after(start, duration)?;
    let batch_size = batch_size.max(1);

    let reports = run_workers(workers, "fib", move |worker_id| {
        let report = compute_until(deadline, batch_size);
        debug!(worker_id, computations = report.computations, "Fibonacci worker completed");
        report
    })?;

    let mut total_computations = 0u64;
    let mut largest = BigUint::from(0u8);
    for report in reports {
        total_computations += report.computations;
        if report.largest > largest {
            largest = report.largest;
        }
    }

    Ok(FibSummary {
        workers,
        elapsed: start.elapsed(),
        total_computations,
        largest,
    })
}

/// One worker's loop: restart from 0, 1 every `batch_size` numbers so memory
/// stays bounded, checking the deadline on every step.
fn compute_until(deadline: Instant, batch_size: usize) -> FibWorkerReport {
    let mut computations = 0u64;
    let mut largest = BigUint::from(0u8);

    while Instant::now() < deadline {
        let mut a = BigUint::from(0u8);
        let mut b = BigUint::from(1u8);

        for _ in 0..batch_size {
            if Instant::now() >= deadline {
                break;
            }

            let next = &a + &b;
            if next > largest {
                largest.clone_from(&next);
            }
            a = std::mem::replace(&mut b, next);
            computations += 1;
        }
    }

    FibWorkerReport { computations, largest }
}

/// The Fibonacci sequence up to and including `target`.
///
/// Starts with 0, then 1 when `target >= 1`; every later element is the sum
/// of the previous two. The last element is the largest sequence value not
/// exceeding `target`.
pub fn fib_sequence_up_to(target: u64) -> Vec<BigUint> {
    let target = BigUint::from(target);
    let mut sequence = vec![BigUint::from(0u8)];

    let one = BigUint::from(1u8);
    if target < one {
        return sequence;
    }
    sequence.push(one);

    loop {
        let len = sequence.len();
        let next = &sequence[len - 2] + &sequence[len - 1];
        if next > target {
            break;
        }
        sequence.push(next);
    }

    sequence
}
