//! Cache Module
//!
//! Two-tier (memory + disk) test fixture cache with TTL expiration and
//! oldest-first capacity eviction.

mod disk;
mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::TestDataCache;
