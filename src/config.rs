//! Configuration Module
//!
//! Handles loading the cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default directory holding one JSON record per cached key.
pub const DEFAULT_CACHE_DIR: &str = "target/test-data-cache";

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory for the disk tier
    pub cache_dir: PathBuf,
    /// TTL in hours for entries stored without an explicit TTL
    pub default_ttl_hours: u64,
    /// Maximum number of entries the memory tier can hold
    pub max_entries: usize,
    /// Background sweep interval in seconds
    pub sweep_interval_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `TEST_DATA_CACHE_DIR` - Disk tier directory (default: `target/test-data-cache`)
    /// - `TEST_DATA_CACHE_TTL_HOURS` - Default TTL in hours (default: 24)
    /// - `TEST_DATA_CACHE_MAX_ENTRIES` - Maximum memory entries (default: 1000)
    /// - `TEST_DATA_CACHE_SWEEP_INTERVAL_SECS` - Sweep frequency in seconds (default: 3600)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_dir: env::var("TEST_DATA_CACHE_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            default_ttl_hours: parse_var("TEST_DATA_CACHE_TTL_HOURS")
                .unwrap_or(defaults.default_ttl_hours),
            max_entries: parse_var("TEST_DATA_CACHE_MAX_ENTRIES")
                .unwrap_or(defaults.max_entries),
            sweep_interval_secs: parse_var("TEST_DATA_CACHE_SWEEP_INTERVAL_SECS")
                .unwrap_or(defaults.sweep_interval_secs),
        }
    }

    /// Returns a copy of this config pointing at another cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Sweep interval as a `Duration`, never shorter than one second.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    /// Capacity bound actually enforced by the memory tier.
    pub(crate) fn effective_max_entries(&self) -> usize {
        self.max_entries.max(1)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            default_ttl_hours: 24,
            max_entries: 1000,
            sweep_interval_secs: 3600,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
