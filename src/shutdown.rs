//! Signal-driven shutdown wiring.

use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

/// Returns a token cancelled on the first SIGTERM or SIGINT.
///
/// The API server stops accepting connections and the sweeper exits its
/// interval loop when the token fires; `main` then drains both.
pub fn install_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    tokio::spawn(watch_signals(token.clone()));
    token
}

async fn watch_signals(token: CancellationToken) {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(error = %e, "Could not install SIGTERM handler");
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(error = %e, "Could not install SIGINT handler");
            return;
        }
    };

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    tracing::info!(signal = received, "Shutdown signal received");
    token.cancel();
}
