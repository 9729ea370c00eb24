use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::state::SharedState;

/// Periodically delete expired password reset requests until shutdown is signaled.
pub fn spawn(
    state: SharedState,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Reset request reaper started (every {}s)", interval.as_secs());

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => {}
            }

            if *shutdown.borrow() {
                break;
            }

            match state.auth.pins().reap_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::info!("Reaped {n} expired password reset requests"),
                Err(e) => tracing::error!("Reset reaper error: {e}"),
            }
        }

        tracing::info!("Reset request reaper stopped");
    })
}
