//! Test Data Cache - memoized fixtures for end-to-end test runs
//!
//! Provides a two-tier (memory + disk) key-value cache with TTL expiration,
//! oldest-first capacity eviction and a background sweep, so scenarios can
//! reuse generated users, products and search terms across runs.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod tasks;
pub mod telemetry;

pub use cache::{CacheEntry, CacheStats, TestDataCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{CacheError, Result};
pub use fixtures::{AddressData, Fixture, FixtureSource, ProductData, RandomFixtures, UserData};
pub use tasks::{spawn_sweep_task, CacheLifecycle};
pub use telemetry::init_tracing;
