//! Background Tasks Module
//!
//! Contains the periodic sweep and the lifecycle object that starts and stops
//! it around a cache.
//!
//! # Tasks
//! - TTL Sweep: Removes expired cache entries at configured intervals

mod lifecycle;
mod sweep;

pub use lifecycle::CacheLifecycle;
pub use sweep::spawn_sweep_task;
