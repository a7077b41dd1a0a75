//! Router setup

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/heavy", get(handlers::heavy))
        .route("/fib", get(handlers::fib_missing))
        .route("/fib/", get(handlers::fib_missing))
        .route("/fib/{*param}", get(handlers::fib))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
