//! Fan-out / fan-in over OS threads
//!
//! Load workers are plain named threads: each runs one job to completion and
//! hands back a single value through its join handle.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::{Error, Result};

/// Shared deadline for a run, or `DurationOutOfRange` if the clock can't hold it
pub fn deadline_after(start: Instant, duration: Duration) -> Result<Instant> {
    start
        .checked_add(duration)
        .ok_or(Error::DurationOutOfRange { duration })
}

/// Run `job` on `count` worker threads and collect the results in worker order.
///
/// Blocks until every worker has finished.
pub fn run_workers<T, F>(count: usize, name_prefix: &str, job: F) -> Result<Vec<T>>
where
    T: Send + 'static,
    F: Fn(usize) -> T + Send + Sync + 'static,
{
    let job = Arc::new(job);
    let mut handles = Vec::with_capacity(count);

    for worker_id in 0..count {
        let job = Arc::clone(&job);
        let handle = thread::Builder::new()
            .name(format!("{}-{}", name_prefix, worker_id))
            .spawn(move || job(worker_id))
            .map_err(|e| Error::WorkerSpawn { worker_id, source: e })?;
        handles.push(handle);
    }

    trace!(count, name_prefix, "Workers spawned");

    handles
        .into_iter()
        .enumerate()
        .map(|(worker_id, handle)| {
            handle
                .join()
                .map_err(|_| Error::Execution(format!("worker {} panicked", worker_id)))
        })
        .collect()
}
