//! Signal handling for graceful shutdown

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::service::ServiceState;

/// Setup signal handlers for graceful shutdown.
///
/// The returned receiver resolves on the first Ctrl+C or SIGTERM.
pub fn setup_signal_handlers() -> Result<oneshot::Receiver<()>> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    // SIGTERM sets a flag that the task below polls
    let sigterm = Arc::new(AtomicBool::new(false));
    #[cfg(unix)]
    signal_hook::flag::register(signal_hook::consts::SIGTERM, sigterm.clone())
        .context("Failed to register SIGTERM handler")?;

    tokio::spawn(async move {
        let poll_sigterm = async {
            loop {
                if sigterm.load(Ordering::Relaxed) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        };

        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => info!("Ctrl+C signal received"),
                Err(e) => error!("Failed to listen for Ctrl+C signal: {}", e),
            },
            _ = poll_sigterm => info!("SIGTERM signal received"),
        }

        let _ = shutdown_tx.send(());
    });

    Ok(shutdown_rx)
}

/// Graceful shutdown handler
pub async fn graceful_shutdown(
    service_state: Arc<ServiceState>,
    gateway_handle: tokio::task::JoinHandle<()>,
) -> Result<()> {
    info!("Starting graceful shutdown...");

    // Stop the ChartGateway
    if let Err(e) = service_state.stop_chart_gateway().await {
        error!("Failed to stop ChartGateway: {}", e);
    }

    // Wait for in-flight requests to drain with timeout
    let shutdown_timeout = Duration::from_secs(service_state.config.service.shutdown_timeout_secs);
    match timeout(shutdown_timeout, gateway_handle).await {
        Ok(Ok(())) => {
            info!("ChartGateway stopped gracefully");
        }
        Ok(Err(e)) => {
            error!("ChartGateway task failed: {}", e);
        }
        Err(_) => {
            warn!("ChartGateway did not stop within timeout, forcing shutdown");
        }
    }

    // Shutdown other components
    if let Err(e) = service_state.shutdown().await {
        error!("Failed to shutdown service components: {}", e);
    }

    info!("Graceful shutdown complete");
    Ok(())
}
