//! Disk Tier Module
//!
//! One JSON record per key under the cache directory. Every method reports
//! failures as `CacheError`; deciding what to do about them is the store's job.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tempfile::Builder;
use tracing::{info, warn};

use crate::cache::entry::{CacheEntry, DiskRecord};
use crate::error::{CacheError, Result};

/// Extension of committed records.
const RECORD_EXTENSION: &str = "json";
/// Prefix of in-flight writes, renamed into place once complete.
const TEMP_PREFIX: &str = ".tmp-";
/// Longest file stem written for a key.
const MAX_FILE_STEM: usize = 200;
/// Hex digits of the key digest kept on over-long stems.
const HASH_SUFFIX_LEN: usize = 16;

// == Disk Scan ==
/// Result of reading the whole disk tier at startup.
#[derive(Debug, Default)]
pub(crate) struct DiskScan {
    /// Live records, oldest first
    pub live: Vec<DiskRecord>,
    /// Expired records that were deleted
    pub expired: usize,
    /// Undecodable records that were deleted
    pub corrupt: usize,
}

// == Disk Tier ==
#[derive(Debug)]
pub(crate) struct DiskTier {
    dir: PathBuf,
}

impl DiskTier {
    /// Opens the tier, creating the directory if needed.
    ///
    /// A directory that cannot be created is logged; later writes will fail
    /// and be logged too while the memory tier keeps working.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if !dir.is_dir() {
            match fs::create_dir_all(&dir) {
                Ok(()) => info!("Cache directory created: {}", dir.display()),
                Err(err) => warn!("Failed to create cache directory {}: {}", dir.display(), err),
            }
        }
        Self { dir }
    }

    /// Directory holding the records.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", file_stem(key), RECORD_EXTENSION))
    }

    // == Store ==
    /// Writes the record for `key`, replacing any previous one atomically.
    pub fn store(&self, key: &str, entry: &CacheEntry) -> Result<()> {
        let record = DiskRecord {
            key: key.to_string(),
            entry: entry.clone(),
        };
        let json = serde_json::to_vec_pretty(&record).map_err(|source| CacheError::Encode {
            key: key.to_string(),
            source,
        })?;

        let mut tmp = Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.dir)
            .map_err(|err| CacheError::io(&self.dir, err))?;
        tmp.write_all(&json)
            .map_err(|err| CacheError::io(tmp.path(), err))?;

        let path = self.path_for(key);
        tmp.persist(&path)
            .map_err(|err| CacheError::io(&path, err.error))?;
        Ok(())
    }

    // == Load ==
    /// Reads the record for `key`.
    ///
    /// Returns `Ok(None)` when no file exists or the file holds another key,
    /// which only a digest collision on an over-long key could produce.
    pub fn load(&self, key: &str) -> Result<Option<CacheEntry>> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(CacheError::io(path, err)),
        };

        let record = decode(&path, &bytes)?;
        if record.key != key {
            return Ok(None);
        }
        Ok(Some(record.entry))
    }

    // == Remove ==
    /// Deletes the record for `key`. A missing file is not an error.
    pub fn remove(&self, key: &str) -> Result<()> {
        remove_file(&self.path_for(key))
    }

    // == Clear ==
    /// Deletes every record and leftover temporary file, returning how many
    /// records were removed.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.files()? {
            if is_record(&path) {
                remove_file(&path)?;
                removed += 1;
            } else if is_temp(&path) {
                remove_file(&path)?;
            }
        }
        Ok(removed)
    }

    // == Count ==
    /// Number of record files currently on disk.
    pub fn count(&self) -> Result<usize> {
        Ok(self.files()?.iter().filter(|p| is_record(p)).count())
    }

    // == Scan ==
    /// Reads every record, deleting the expired and undecodable ones.
    ///
    /// Files that cannot be read are skipped with a warning and left alone.
    pub fn scan(&self, now: DateTime<Utc>) -> Result<DiskScan> {
        let mut scan = DiskScan::default();

        for path in self.files()? {
            if is_temp(&path) {
                if let Err(err) = remove_file(&path) {
                    warn!("Failed to remove stale temporary file: {}", err);
                }
                continue;
            }
            if !is_record(&path) {
                continue;
            }

            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!("Failed to load cache file {}: {}", path.display(), err);
                    continue;
                }
            };

            match decode(&path, &bytes) {
                Ok(record) if record.entry.is_expired_at(now) => {
                    scan.expired += 1;
                    if let Err(err) = remove_file(&path) {
                        warn!("Failed to remove expired record: {}", err);
                    }
                }
                Ok(record) => scan.live.push(record),
                Err(err) => {
                    warn!("{}", err);
                    scan.corrupt += 1;
                    if let Err(err) = remove_file(&path) {
                        warn!("Failed to remove corrupt record: {}", err);
                    }
                }
            }
        }

        scan.live
            .sort_by(|a, b| a.entry.created_at.cmp(&b.entry.created_at));
        Ok(scan)
    }

    fn files(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(CacheError::io(&self.dir, err)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| CacheError::io(&self.dir, err))?;
            let is_file = entry
                .file_type()
                .map(|kind| kind.is_file())
                .unwrap_or(false);
            if is_file {
                files.push(entry.path());
            }
        }
        Ok(files)
    }
}

// == Helpers ==
/// Maps a key to a filesystem-safe file stem, distinct for distinct keys.
///
/// `[A-Za-z0-9.@-]` pass through; every other byte (including `_` itself and
/// a leading `.`) is written as `_XX` hex. The empty key maps to `_`. Stems
/// longer than the limit are cut and suffixed with `~` and a SHA-256 prefix
/// of the raw key; `~` never appears in an escaped stem.
pub(crate) fn file_stem(key: &str) -> String {
    if key.is_empty() {
        return "_".to_string();
    }

    let mut stem = String::with_capacity(key.len());
    for (i, byte) in key.bytes().enumerate() {
        let plain = byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-' | b'@');
        if plain && !(i == 0 && byte == b'.') {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("_{:02X}", byte));
        }
    }

    if stem.len() > MAX_FILE_STEM {
        let digest = hex::encode(Sha256::digest(key.as_bytes()));
        // ASCII only, so any byte index is a char boundary
        stem.truncate(MAX_FILE_STEM - HASH_SUFFIX_LEN - 1);
        stem.push('~');
        stem.push_str(&digest[..HASH_SUFFIX_LEN]);
    }
    stem
}

fn decode(path: &Path, bytes: &[u8]) -> Result<DiskRecord> {
    serde_json::from_slice(bytes).map_err(|source| CacheError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(CacheError::io(path, err)),
    }
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

fn is_temp(path: &Path) -> bool {
    file_name(path).starts_with(TEMP_PREFIX)
}

fn is_record(path: &Path) -> bool {
    !is_temp(path) && path.extension().and_then(|ext| ext.to_str()) == Some(RECORD_EXTENSION)
}
