//! Request handlers
//!
//! CPU work never runs on the async runtime threads: each load handler moves
//! its fan-out onto the blocking pool and awaits the join.

use std::time::Instant;

use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedSemaphorePermit;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::config::FibMode;
use crate::error::Result;
use crate::load::{self, ParamError};
use crate::system::HealthReport;

// ─────────────────────────────────────────────────────────────────
// Static endpoints
// ─────────────────────────────────────────────────────────────────

/// `GET /`
pub async fn root() -> &'static str {
    "Hello, World!"
}

/// `GET /health`
pub async fn health() -> Json<HealthReport> {
    Json(HealthReport::now())
}

// ─────────────────────────────────────────────────────────────────
// /heavy
// ─────────────────────────────────────────────────────────────────

/// Query for `/heavy`; kept as raw strings so malformed numbers fall back
/// to defaults instead of rejecting the request
#[derive(Debug, Default, Deserialize)]
pub struct HeavyQuery {
    pub duration: Option<String>,
    pub workers: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeavyResponse {
    pub message: String,
    pub duration_requested: String,
    pub duration_actual: String,
    pub workers: usize,
    pub total_iterations: u64,
    pub cpu_cores: usize,
}

/// `GET /heavy?duration=N&workers=M`
pub async fn heavy(
    State(state): State<AppState>,
    Query(query): Query<HeavyQuery>,
) -> ApiResult<Json<HeavyResponse>> {
    let permit = state.acquire_load_slot()?;

    let duration = load::resolve_duration(query.duration.as_deref(), &state.load);
    let workers = load::resolve_workers(
        query.workers.as_deref(),
        state.system.cpu_count,
        state.load.max_heavy_workers,
    );

    let run_id = Uuid::new_v4();
    info!(%run_id, workers, duration_secs = duration.as_secs(), "Starting heavy computation");

    let summary = run_blocking(permit, move || load::run_trig_load(duration, workers)).await?;

    info!(
        %run_id,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        total_iterations = summary.total_iterations,
        "Heavy computation completed"
    );

    Ok(Json(HeavyResponse {
        message: "Heavy computation completed".to_string(),
        duration_requested: format!("{}s", duration.as_secs()),
        duration_actual: format!("{:?}", summary.elapsed),
        workers,
        total_iterations: summary.total_iterations,
        cpu_cores: state.system.cpu_count,
    }))
}

// ─────────────────────────────────────────────────────────────────
// /fib
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct FibQuery {
    pub workers: Option<String>,
}

/// Summary of a duration-bound Fibonacci run
#[derive(Debug, Serialize, Deserialize)]
pub struct FibLoadResponse {
    pub duration_requested: String,
    pub duration_actual: String,
    pub workers: usize,
    pub total_computations: u64,
    pub computations_per_second: f64,
    pub largest_fibonacci_computed: String,
    pub cpu_cores: usize,
}

/// Sequence returned in bounded mode
#[derive(Debug, Serialize, Deserialize)]
pub struct FibSequenceResponse {
    pub number: u64,
    pub sequence: Vec<String>,
    pub count: usize,
    pub computation_time: String,
}

/// `GET /fib` and `GET /fib/`
pub async fn fib_missing(State(state): State<AppState>) -> ApiError {
    let err = match state.fib_mode() {
        FibMode::Duration => ParamError::MissingMinutes,
        FibMode::Bounded => ParamError::MissingTarget,
    };
    err.into()
}

/// `GET /fib/{*param}`; meaning of `param` depends on the configured mode.
///
/// Extra segments (`/fib/1/2`) reach the parsers as-is and are rejected there.
pub async fn fib(
    State(state): State<AppState>,
    param: std::result::Result<Path<String>, PathRejection>,
    Query(query): Query<FibQuery>,
) -> ApiResult<Response> {
    let Ok(Path(param)) = param else {
        return Err(invalid_fib_param(&state).into());
    };

    match state.fib_mode() {
        FibMode::Duration => fib_for_duration(state, &param, query).await,
        FibMode::Bounded => fib_up_to(&state, &param),
    }
}

async fn fib_for_duration(state: AppState, raw_minutes: &str, query: FibQuery) -> ApiResult<Response> {
    let minutes = load::parse_minutes(raw_minutes, &state.load)?;
    let duration = load::minutes_to_duration(minutes)?;
    let workers = load::resolve_workers(
        query.workers.as_deref(),
        state.system.cpu_count,
        state.load.max_fib_workers,
    );

    let permit = state.acquire_load_slot()?;

    let run_id = Uuid::new_v4();
    info!(%run_id, workers, minutes, "Computing Fibonacci numbers");

    let batch_size = state.load.fib_batch_size;
    let summary =
        run_blocking(permit, move || load::run_fib_load(duration, workers, batch_size)).await?;

    info!(
        %run_id,
        total_computations = summary.total_computations,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "Fibonacci computation completed"
    );

    let response = FibLoadResponse {
        duration_requested: format!("{}m", minutes),
        duration_actual: format!("{:?}", summary.elapsed),
        workers,
        total_computations: summary.total_computations,
        computations_per_second: round2(summary.computations_per_second()),
        largest_fibonacci_computed: summary.largest.to_string(),
        cpu_cores: state.system.cpu_count,
    };
    Ok(Json(response).into_response())
}

fn fib_up_to(state: &AppState, raw_target: &str) -> ApiResult<Response> {
    let target = load::parse_fib_target(raw_target, &state.load)?;

    let start = Instant::now();
    let sequence = load::fib_sequence_up_to(target);
    let elapsed = start.elapsed();

    debug!(target, count = sequence.len(), "Fibonacci sequence computed");

    let response = FibSequenceResponse {
        number: target,
        count: sequence.len(),
        sequence: sequence.iter().map(ToString::to_string).collect(),
        computation_time: format!("{:?}", elapsed),
    };
    Ok(Json(response).into_response())
}

// ─────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────

/// Rejection for a `/fib/` segment that isn't valid UTF-8
fn invalid_fib_param(state: &AppState) -> ParamError {
    match state.fib_mode() {
        FibMode::Duration => ParamError::InvalidMinutes,
        FibMode::Bounded => ParamError::InvalidTarget {
            max: state.load.max_fib_target,
        },
    }
}

/// Run a blocking load job on the blocking pool and await it.
///
/// The limiter permit moves into the job, so the slot stays taken until the
/// workers finish even if the client goes away.
async fn run_blocking<T, F>(permit: Option<OwnedSemaphorePermit>, job: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        job()
    });

    task.await
        .map_err(|e| ApiError::Internal(format!("load task failed: {}", e)))?
        .map_err(ApiError::from)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
