//! Cache Entry Module
//!
//! Defines individual cache entries with TTL support and their on-disk record.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::fixtures::Fixture;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// The stored fixture
    pub value: Fixture,
    /// Insertion time, never updated
    pub created_at: DateTime<Utc>,
    /// Instant after which the entry is stale
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry living `ttl_hours` from `now`.
    ///
    /// TTLs too large to represent saturate at the latest representable instant.
    pub fn new(value: Fixture, now: DateTime<Utc>, ttl_hours: u64) -> Self {
        let expires_at = i64::try_from(ttl_hours)
            .ok()
            .and_then(TimeDelta::try_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            value,
            created_at: now,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is expired only once `now` is strictly after `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or zero once expired.
    pub fn ttl_remaining(&self, now: DateTime<Utc>) -> TimeDelta {
        if self.expires_at > now {
            self.expires_at - now
        } else {
            TimeDelta::zero()
        }
    }
}

// == Disk Record ==
/// Entry as persisted on disk, carrying the unsanitized key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct DiskRecord {
    pub key: String,
    #[serde(flatten)]
    pub entry: CacheEntry,
}
