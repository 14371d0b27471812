//! Background expiry sweeper
//!
//! Expired sessions are already invisible to readers; the sweeper reclaims
//! their memory and keeps the `sessions_active` gauge current.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::memory::MemorySessionStore;

/// Spawn a task that purges expired sessions every `interval`.
///
/// Returns a `JoinHandle` for the spawned task.
pub fn spawn_sweep_task(
    store: Arc<MemorySessionStore>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // Skip the immediate first tick — the store was just created
        ticker.tick().await;

        loop {
            ticker.tick().await;
            sweep_cycle(&store).await;
        }
    })
}

/// Run one sweep: drop expired sessions and publish the live count.
async fn sweep_cycle(store: &MemorySessionStore) -> usize {
    let purged = store.purge_expired().await;
    let active = store.len().await;
    if purged > 0 {
        debug!(purged, active, "expired sessions purged");
    }
    metrics::gauge!("sessions_active").set(active as f64);
    purged
}
