// Signal handling module
//
// SIGINT (Ctrl+C) and SIGTERM stop the relay; on non-Unix targets only Ctrl+C.

use super::ServerHandle;
use crate::logger;

/// Wait for the first shutdown signal and return its name
#[cfg(unix)]
pub async fn wait_for_shutdown() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigint.recv() => Ok("SIGINT"),
        _ = sigterm.recv() => Ok("SIGTERM"),
    }
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub async fn wait_for_shutdown() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl+C")
}

/// Spawn a task that stops the server on the first shutdown signal
pub fn stop_on_signal(handle: ServerHandle) {
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(name) => {
                logger::log_info(&format!("[Signal] {name} received, stopping relay..."));
                handle.stop();
            }
            Err(e) => {
                logger::log_error(&format!("Failed to register signal handlers: {e}"));
            }
        }
    });
}
