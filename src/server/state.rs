//! Shared application state

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::error::{ApiError, ApiResult};
use crate::config::{FibMode, LoadSettings, LoadgenConfig};
use crate::system::SystemInfo;

/// State handed to every handler; cheap to clone
#[derive(Clone)]
pub struct AppState {
    /// Load limits and defaults
    pub load: Arc<LoadSettings>,

    /// Host information collected at startup
    pub system: Arc<SystemInfo>,

    /// Caps concurrent load runs when configured
    limiter: Option<Arc<Semaphore>>,

    /// Configured concurrent load cap (0 = unlimited)
    max_concurrent_loads: usize,
}

impl AppState {
    pub fn new(config: &LoadgenConfig, system: SystemInfo) -> Self {
        let max_concurrent_loads = config.server.max_concurrent_loads;
        let limiter = (max_concurrent_loads > 0).then(|| Arc::new(Semaphore::new(max_concurrent_loads)));

        Self {
            load: Arc::new(config.load.clone()),
            system: Arc::new(system),
            limiter,
            max_concurrent_loads,
        }
    }

    pub fn fib_mode(&self) -> FibMode {
        self.load.fib_mode
    }

    /// Reserve a slot for one load run.
    ///
    /// Never waits: a full limiter is reported as `ApiError::Busy`. The
    /// permit (if any) must be held until the run finishes.
    pub fn acquire_load_slot(&self) -> ApiResult<Option<OwnedSemaphorePermit>> {
        match self.limiter {
            Some(ref limiter) => Arc::clone(limiter)
                .try_acquire_owned()
                .map(Some)
                .map_err(|_| ApiError::Busy {
                    limit: self.max_concurrent_loads,
                }),
            None => Ok(None),
        }
    }
}
