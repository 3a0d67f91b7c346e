//! Task expiry loop.
//!
//! Expired tasks are already invisible to lookups; this reclaims their memory
//! and keeps the store under its capacity limit.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::interval;

use crate::tasks::TaskStore;

pub async fn run_prune_loop(
    store: Arc<dyn TaskStore>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(every);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Task prune loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let removed = store.prune();
                if removed > 0 {
                    tracing::debug!(
                        "Pruned {} search tasks, {} still active",
                        removed,
                        store.active_count()
                    );
                }
            }
        }
    }
}
