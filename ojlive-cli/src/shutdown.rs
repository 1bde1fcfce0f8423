//! Signal handling for graceful shutdown.

use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;

/// Completes when a shutdown signal is received.
///
/// Listens for SIGTERM and SIGINT (Ctrl+C).
pub async fn shutdown_signal() -> std::io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM, shutting down");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT, shutting down");
        }
    }
    Ok(())
}

/// Spawns the signal listener and returns the shutdown flag it sets.
///
/// If the handlers cannot be installed the flag is never set; the process
/// then only stops on its own.
pub fn spawn_shutdown_listener() -> watch::Receiver<bool> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(()) => {
                shutdown_tx.send_replace(true);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install signal handlers");
                // Keep the sender alive so receivers do not see a closed channel.
                std::future::pending::<()>().await;
            }
        }
    });
    shutdown_rx
}

/// Resolves once shutdown has been requested.
pub async fn requested(shutdown_rx: &mut watch::Receiver<bool>) {
    // Sender gone: no signal will ever arrive.
    if shutdown_rx.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}
