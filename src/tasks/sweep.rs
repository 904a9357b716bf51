//! TTL Sweep Task
//!
//! Background task that periodically removes expired cache entries from
//! both tiers.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::TestDataCache;

/// Spawns a background task that periodically sweeps expired entries.
///
/// The first sweep runs one full `interval` after spawning. Read paths purge
/// expired entries on their own, so the sweep only bounds the cache
/// footprint. Each sweep runs without yielding, so aborting the task can only
/// take effect between sweeps.
///
/// # Arguments
/// * `cache` - Handle to the shared cache
/// * `interval` - Time between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, used to stop it before the final flush.
///
/// # Example
/// ```ignore
/// let cache = TestDataCache::open(&Config::default());
/// let sweep_handle = spawn_sweep_task(cache.clone(), Duration::from_secs(3600));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(cache: TestDataCache, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting TTL sweep task with interval of {} seconds",
            interval.as_secs()
        );

        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let removed = cache.sweep_expired();

            if removed > 0 {
                info!("TTL sweep: removed {} expired entries", removed);
            } else {
                debug!("TTL sweep: no expired entries found");
            }
        }
    })
}
