//! HTTP server
//!
//! Provides:
//! - The axum router and its handlers
//! - `{"error": ...}` responses for rejected requests
//! - Binding, serving and graceful shutdown

mod error;
mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;

use std::future::Future;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::{FibMode, LoadgenConfig};
use crate::error::{Error, Result};
use crate::system::SystemInfo;

/// Bind the configured address and serve until Ctrl+C or SIGTERM
pub async fn serve(config: &LoadgenConfig, system: SystemInfo) -> Result<()> {
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await.map_err(|e| Error::Bind {
        addr: addr.to_string(),
        source: e,
    })?;

    let local_addr = listener.local_addr()?;
    info!(
        addr = %local_addr,
        fib_mode = %config.load.fib_mode,
        max_concurrent_loads = config.server.max_concurrent_loads,
        "Server listening"
    );
    log_endpoints(config);

    let state = AppState::new(config, system);
    serve_listener(listener, state, shutdown_signal()).await
}

/// Serve on an already-bound listener until `shutdown` resolves
pub async fn serve_listener<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Serve(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

fn log_endpoints(config: &LoadgenConfig) {
    let load = &config.load;
    info!("  GET /              - Hello World");
    info!("  GET /health        - Health check");
    info!(
        "  GET /heavy         - CPU intensive task (?duration=1-{}s, default {}; ?workers=1-{}, default CPU count)",
        load.max_duration_secs, load.default_duration_secs, load.max_heavy_workers
    );
    match load.fib_mode {
        FibMode::Duration => info!(
            "  GET /fib/{{minutes}} - Fibonacci load for N minutes (?workers=1-{}, default CPU count)",
            load.max_fib_workers
        ),
        FibMode::Bounded => info!(
            "  GET /fib/{{number}}  - Fibonacci sequence up to N (0-{})",
            load.max_fib_target
        ),
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix (what Kubernetes sends)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, waiting for in-flight requests");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_serve_listener_stops_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = AppState::new(&LoadgenConfig::default(), SystemInfo::collect());

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve_listener(listener, state, async {
            let _ = rx.await;
        }));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("\"status\":\"healthy\""));

        tx.send(()).unwrap();
        assert!(server.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = LoadgenConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = taken.local_addr().unwrap().port();

        let err = serve(&config, SystemInfo::collect()).await.unwrap_err();
        assert!(matches!(err, Error::Bind { .. }));
    }
}
