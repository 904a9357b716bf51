//! Cache Statistics Module
//!
//! Point-in-time entry counts plus hit, miss and eviction counters.

use std::fmt;

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of the cache state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Entries in the memory tier, including expired ones not yet swept
    pub total: usize,
    /// Memory entries that are still live
    pub valid: usize,
    /// Memory entries past their expiry
    pub expired: usize,
    /// Records currently present in the disk tier
    pub disk_entries: usize,
    /// Lookups that returned a live value
    pub hits: u64,
    /// Lookups that found nothing or only an expired entry
    pub misses: u64,
    /// Entries dropped to stay under the capacity bound
    pub evictions: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats{{total={}, valid={}, expired={}, disk={}}}",
            self.total, self.valid, self.expired, self.disk_entries
        )
    }
}
