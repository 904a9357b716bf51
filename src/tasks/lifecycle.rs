//! Cache Lifecycle
//!
//! Owns the sweep task for a cache and guarantees the shutdown flush.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::TestDataCache;
use crate::config::Config;
use crate::error::Result;
use crate::tasks::spawn_sweep_task;

/// Start/stop handle around a [`TestDataCache`].
///
/// Shutdown order is always: stop the sweep, then flush live entries to disk.
/// Call [`close`](Self::close) for an orderly shutdown; dropping the
/// lifecycle without closing it performs the same steps synchronously.
#[derive(Debug)]
pub struct CacheLifecycle {
    cache: TestDataCache,
    sweep_interval: Duration,
    sweeper: Option<JoinHandle<()>>,
    closed: bool,
}

impl CacheLifecycle {
    /// Wraps `cache` without starting the sweep.
    pub fn new(cache: TestDataCache, sweep_interval: Duration) -> Self {
        Self {
            cache,
            sweep_interval,
            sweeper: None,
            closed: false,
        }
    }

    /// Opens the cache described by `config` with the system clock.
    pub fn from_config(config: &Config) -> Self {
        Self::new(TestDataCache::open(config), config.sweep_interval())
    }

    /// The managed cache.
    pub fn cache(&self) -> &TestDataCache {
        &self.cache
    }

    /// Spawns the sweep task on the current tokio runtime.
    ///
    /// Does nothing if the sweep is already running.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            debug!("Sweep task already running");
            return Ok(());
        }
        // Fails outside a runtime instead of panicking inside tokio::spawn
        Handle::try_current()?;
        self.sweeper = Some(spawn_sweep_task(self.cache.clone(), self.sweep_interval));
        Ok(())
    }

    /// Returns true while the sweep task is alive.
    pub fn is_running(&self) -> bool {
        self.sweeper
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Aborts the sweep task and waits until it has stopped.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.sweeper.take() {
            handle.abort();
            match handle.await {
                Ok(()) => {}
                Err(err) if err.is_cancelled() => {}
                Err(err) => warn!("Sweep task ended abnormally: {}", err),
            }
            info!("Sweep task stopped");
        }
    }

    /// Stops the sweep, then writes every live entry to disk.
    ///
    /// Returns the number of records written.
    pub async fn close(mut self) -> usize {
        self.stop().await;
        self.closed = true;
        self.cache.flush()
    }
}

impl Drop for CacheLifecycle {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Some(handle) = self.sweeper.take() {
            handle.abort();
        }
        self.cache.flush();
    }
}
