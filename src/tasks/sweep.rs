//! Idle Eviction Sweep Task
//!
//! Background task that periodically removes cache entries no view is
//! subscribed to anymore.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::SyncEngine;

/// Spawns a background task that periodically evicts idle cache entries.
///
/// The task runs in an infinite loop, sleeping for the engine's configured
/// sweep interval between runs. Entries are removed only once they have
/// had zero subscribers for longer than the idle eviction window; entries
/// with an in-flight fetch are always kept.
///
/// # Arguments
/// * `engine` - Engine handle whose store is swept
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during application shutdown.
pub fn spawn_sweep_task(engine: SyncEngine) -> JoinHandle<()> {
    let interval = Duration::from_millis(engine.config().sweep_interval_ms);

    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "starting idle sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = engine.evict_idle();
            if removed > 0 {
                info!("idle sweep: removed {} entries", removed);
            } else {
                debug!("idle sweep: nothing to remove");
            }
        }
    })
}
