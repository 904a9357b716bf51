//! Error types for the test data cache
//!
//! Provides unified error handling using thiserror. Disk-tier failures are
//! reported through these types and logged by the store, never returned from
//! the cache operations themselves.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the test data cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Disk read, write, delete or listing failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A disk record could not be decoded
    #[error("Corrupt cache record {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An entry could not be encoded for the disk tier
    #[error("Failed to encode cache record for key {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The sweep task needs a tokio runtime to run on
    #[error("No tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the test data cache.
pub type Result<T> = std::result::Result<T, CacheError>;
