//! Cache Store Module
//!
//! Two-tier cache engine: a mutex-guarded memory map written through to the
//! disk tier, with TTL expiry and oldest-first capacity eviction.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cache::disk::DiskTier;
use crate::cache::{CacheEntry, CacheStats};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::CacheError;
use crate::fixtures::{AddressData, Fixture, FixtureSource, ProductData, UserData};

/// Share of the memory tier dropped when the capacity bound is reached.
const EVICTION_DIVISOR: usize = 10;

// == Memory Tier ==
#[derive(Debug)]
struct Slot {
    entry: CacheEntry,
    /// Insertion sequence, breaks `created_at` ties
    seq: u64,
}

#[derive(Debug, Default)]
struct MemoryTier {
    entries: HashMap<String, Slot>,
    next_seq: u64,
    stats: CacheStats,
}

impl MemoryTier {
    fn insert(&mut self, key: String, entry: CacheEntry) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(key, Slot { entry, seq });
    }
}

#[derive(Debug)]
struct Shared {
    memory: Mutex<MemoryTier>,
    disk: DiskTier,
    clock: Arc<dyn Clock>,
    config: Config,
}

// == Test Data Cache ==
/// Process-local cache for generated test fixtures.
///
/// Cloning is cheap and every clone sees the same entries. All operations
/// are infallible: disk failures are logged and the memory tier stays
/// authoritative.
#[derive(Debug, Clone)]
pub struct TestDataCache {
    shared: Arc<Shared>,
}

impl TestDataCache {
    // == Constructors ==
    /// Opens the cache described by `config` using the system clock.
    pub fn open(config: &Config) -> Self {
        Self::with_clock(config, SystemClock)
    }

    /// Opens the cache with a custom clock (useful for testing).
    ///
    /// Creates the cache directory if needed and loads every live disk
    /// record into memory; expired and corrupt records are deleted.
    pub fn with_clock(config: &Config, clock: impl Clock + 'static) -> Self {
        let cache = Self {
            shared: Arc::new(Shared {
                memory: Mutex::new(MemoryTier::default()),
                disk: DiskTier::open(&config.cache_dir),
                clock: Arc::new(clock),
                config: config.clone(),
            }),
        };
        cache.rehydrate();
        cache
    }

    fn rehydrate(&self) {
        let now = self.now();
        let scan = match self.shared.disk.scan(now) {
            Ok(scan) => scan,
            Err(err) => {
                warn!("Failed to load cached data from disk: {}", err);
                return;
            }
        };

        let loaded = scan.live.len();
        let mut memory = self.shared.memory.lock();
        for record in scan.live {
            self.make_room(&mut memory, &record.key);
            memory.insert(record.key, record.entry);
        }
        drop(memory);

        info!(
            "Loaded {} cached entries from {} ({} expired, {} corrupt removed)",
            loaded,
            self.shared.disk.dir().display(),
            scan.expired,
            scan.corrupt
        );
    }

    // == Put ==
    /// Stores `value` under `key` with the default TTL.
    pub fn put(&self, key: impl Into<String>, value: impl Into<Fixture>) {
        self.put_with_ttl(key, value, self.shared.config.default_ttl_hours);
    }

    /// Stores `value` under `key`, expiring `ttl_hours` from now.
    ///
    /// An existing entry is replaced entirely. A new key arriving at a full
    /// memory tier first evicts the oldest tenth of the entries.
    pub fn put_with_ttl(&self, key: impl Into<String>, value: impl Into<Fixture>, ttl_hours: u64) {
        let key = key.into();
        let entry = CacheEntry::new(value.into(), self.now(), ttl_hours);

        let mut memory = self.shared.memory.lock();
        self.make_room(&mut memory, &key);
        self.write_disk(&key, &entry);
        memory.insert(key.clone(), entry);

        debug!("Data cached with key: {} (TTL: {} hours)", key, ttl_hours);
    }

    // == Get ==
    /// Returns the live value for `key`, if any.
    ///
    /// Falls back to the disk tier on a memory miss. Expired entries found
    /// in either tier are purged from both and reported as absent.
    pub fn get(&self, key: &str) -> Option<Fixture> {
        self.resolve(key, |entry| entry.value.clone())
    }

    // == Has ==
    /// Same lookup and purge rules as [`get`](Self::get), without cloning the value.
    pub fn has(&self, key: &str) -> bool {
        self.resolve(key, |_| ()).is_some()
    }

    fn resolve<R>(&self, key: &str, read: impl FnOnce(&CacheEntry) -> R) -> Option<R> {
        let now = self.now();
        let mut memory = self.shared.memory.lock();

        if let Some(slot) = memory.entries.get(key) {
            if !slot.entry.is_expired_at(now) {
                let result = read(&slot.entry);
                memory.stats.record_hit();
                return Some(result);
            }
            memory.entries.remove(key);
            self.delete_disk(key);
            memory.stats.record_miss();
            debug!("Expired data removed for key: {}", key);
            return None;
        }

        match self.shared.disk.load(key) {
            Ok(Some(entry)) if !entry.is_expired_at(now) => {
                let result = read(&entry);
                self.make_room(&mut memory, key);
                memory.insert(key.to_string(), entry);
                memory.stats.record_hit();
                debug!("Loaded key {} from disk", key);
                Some(result)
            }
            Ok(Some(_)) => {
                self.delete_disk(key);
                memory.stats.record_miss();
                debug!("Expired disk record removed for key: {}", key);
                None
            }
            Ok(None) => {
                memory.stats.record_miss();
                None
            }
            Err(err @ CacheError::Corrupt { .. }) => {
                warn!("{}", err);
                self.delete_disk(key);
                memory.stats.record_miss();
                None
            }
            Err(err) => {
                warn!("Failed to load data from disk for key {}: {}", key, err);
                memory.stats.record_miss();
                None
            }
        }
    }

    // == Remove ==
    /// Deletes `key` from both tiers. Absent keys are ignored.
    pub fn remove(&self, key: &str) {
        let mut memory = self.shared.memory.lock();
        memory.entries.remove(key);
        self.delete_disk(key);
        debug!("Data removed from cache for key: {}", key);
    }

    // == Clear ==
    /// Deletes every entry from both tiers.
    pub fn clear(&self) {
        let mut memory = self.shared.memory.lock();
        memory.entries.clear();
        if let Err(err) = self.shared.disk.clear() {
            warn!("Failed to clear disk cache: {}", err);
        }
        info!("Cache cleared");
    }

    // == Stats ==
    /// Returns a point-in-time snapshot of the cache.
    pub fn stats(&self) -> CacheStats {
        let now = self.now();
        let memory = self.shared.memory.lock();

        let mut stats = memory.stats.clone();
        stats.total = memory.entries.len();
        stats.expired = memory
            .entries
            .values()
            .filter(|slot| slot.entry.is_expired_at(now))
            .count();
        stats.valid = stats.total - stats.expired;
        stats.disk_entries = match self.shared.disk.count() {
            Ok(count) => count,
            Err(err) => {
                warn!("Failed to get disk cache size: {}", err);
                0
            }
        };
        stats
    }

    // == Get Or Create ==
    /// Returns the cached value for `key`, or stores and returns the value
    /// produced by `factory`.
    ///
    /// The factory runs outside the cache lock. If it fails nothing is stored
    /// and its error is returned unchanged.
    pub fn get_or_create<F, E>(&self, key: &str, factory: F) -> Result<Fixture, E>
    where
        F: FnOnce() -> Result<Fixture, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = factory()?;
        self.put(key, value.clone());
        Ok(value)
    }

    /// Cached user for `key`, generated by `source` when absent.
    pub fn get_or_create_user(&self, key: &str, source: &dyn FixtureSource) -> UserData {
        self.get_or_create_typed(key, Fixture::into_user, || source.generate_user_data())
    }

    /// Cached product for `key`, generated by `source` when absent.
    pub fn get_or_create_product(&self, key: &str, source: &dyn FixtureSource) -> ProductData {
        self.get_or_create_typed(key, Fixture::into_product, || {
            source.generate_product_data()
        })
    }

    /// Cached search term for `key`, generated by `source` when absent.
    pub fn get_or_create_search_term(&self, key: &str, source: &dyn FixtureSource) -> String {
        self.get_or_create_typed(key, Fixture::into_search_term, || {
            source.generate_search_term()
        })
    }

    /// Cached address for `key`, generated by `source` when absent.
    pub fn get_or_create_address(&self, key: &str, source: &dyn FixtureSource) -> AddressData {
        self.get_or_create_typed(key, Fixture::into_address, || {
            source.generate_address_data()
        })
    }

    /// A cached value of another kind is replaced by a generated one.
    fn get_or_create_typed<T>(
        &self,
        key: &str,
        extract: fn(Fixture) -> Option<T>,
        generate: impl FnOnce() -> T,
    ) -> T
    where
        T: Clone + Into<Fixture>,
    {
        if let Some(cached) = self.get(key) {
            let kind = cached.kind();
            match extract(cached) {
                Some(value) => return value,
                None => debug!("Replacing cached {} fixture for key: {}", kind, key),
            }
        }
        let value = generate();
        self.put(key, value.clone());
        value
    }

    // == Sweep Expired ==
    /// Removes every expired memory entry from both tiers.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.now();
        let mut memory = self.shared.memory.lock();

        let expired_keys: Vec<String> = memory
            .entries
            .iter()
            .filter(|(_, slot)| slot.entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            memory.entries.remove(key);
            self.delete_disk(key);
        }

        debug!(
            "Cache sweep completed. Remaining entries: {}",
            memory.entries.len()
        );
        expired_keys.len()
    }

    // == Flush ==
    /// Writes every live memory entry to disk, overwriting existing records.
    ///
    /// Returns the number of records written.
    pub fn flush(&self) -> usize {
        let now = self.now();
        let memory = self.shared.memory.lock();

        let mut written = 0;
        for (key, slot) in memory.entries.iter() {
            if slot.entry.is_expired_at(now) {
                continue;
            }
            if self.write_disk(key, &slot.entry) {
                written += 1;
            }
        }
        info!("Flushed {} cache entries to disk", written);
        written
    }

    // == Length ==
    /// Returns the number of entries in the memory tier.
    pub fn len(&self) -> usize {
        self.shared.memory.lock().entries.len()
    }

    // == Is Empty ==
    /// Returns true if the memory tier holds no entries.
    pub fn is_empty(&self) -> bool {
        self.shared.memory.lock().entries.is_empty()
    }

    /// Configuration the cache was opened with.
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    // == Internal Helpers ==
    fn now(&self) -> DateTime<Utc> {
        self.shared.clock.now()
    }

    /// Evicts the oldest entries when `key` is new and the tier is full.
    fn make_room(&self, memory: &mut MemoryTier, key: &str) {
        let max_entries = self.shared.config.effective_max_entries();
        if memory.entries.contains_key(key) || memory.entries.len() < max_entries {
            return;
        }

        let count = (memory.entries.len() / EVICTION_DIVISOR).max(1);
        let mut by_age: Vec<(DateTime<Utc>, u64, String)> = memory
            .entries
            .iter()
            .map(|(k, slot)| (slot.entry.created_at, slot.seq, k.clone()))
            .collect();
        by_age.sort_unstable();

        for (_, _, oldest) in by_age.into_iter().take(count) {
            memory.entries.remove(&oldest);
            self.delete_disk(&oldest);
        }
        memory.stats.record_evictions(count);
        debug!("Removed {} oldest cache entries", count);
    }

    fn write_disk(&self, key: &str, entry: &CacheEntry) -> bool {
        match self.shared.disk.store(key, entry) {
            Ok(()) => true,
            Err(err) => {
                warn!("Failed to save data to disk for key {}: {}", key, err);
                false
            }
        }
    }

    fn delete_disk(&self, key: &str) {
        if let Err(err) = self.shared.disk.remove(key) {
            warn!("Failed to remove data from disk for key {}: {}", key, err);
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeDelta;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn test_cache(max_entries: usize) -> (TestDataCache, ManualClock, TempDir) {
        let dir = tempdir().unwrap();
        let clock = ManualClock::starting_now();
        let config = Config {
            max_entries,
            ..Config::default().with_cache_dir(dir.path())
        };
        let cache = TestDataCache::with_clock(&config, clock.clone());
        (cache, clock, dir)
    }

    fn email(address: &str) -> Fixture {
        Fixture::Record(BTreeMap::from([("email".to_string(), address.to_string())]))
    }

    #[test]
    fn test_store_new() {
        let (cache, _clock, _dir) = test_cache(100);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_and_get() {
        let (cache, _clock, dir) = test_cache(100);

        cache.put("key1", "laptop");

        assert_eq!(cache.get("key1"), Some(Fixture::from("laptop")));
        assert!(cache.has("key1"));
        assert_eq!(cache.len(), 1);
        assert!(dir.path().join("key1.json").exists());
    }

    #[test]
    fn test_get_nonexistent() {
        let (cache, _clock, _dir) = test_cache(100);
        assert_eq!(cache.get("nonexistent"), None);
        assert!(!cache.has("nonexistent"));
    }

    #[test]
    fn test_overwrite() {
        let (cache, clock, _dir) = test_cache(100);

        cache.put("key1", "v1");
        clock.advance(TimeDelta::hours(23));
        cache.put("key1", "v2");

        assert_eq!(cache.get("key1"), Some(Fixture::from("v2")));
        assert_eq!(cache.len(), 1);

        // The replacement restarted the TTL
        clock.advance(TimeDelta::hours(2));
        assert!(cache.has("key1"));
    }

    #[test]
    fn test_ttl_expiration_purges_both_tiers() {
        let (cache, clock, dir) = test_cache(100);

        cache.put_with_ttl("u1", email("a@b.com"), 1);
        assert_eq!(cache.get("u1"), Some(email("a@b.com")));

        clock.advance(TimeDelta::minutes(61));
        let before = cache.stats();
        assert_eq!(before.total, 1);
        assert_eq!(before.expired, 1);
        assert_eq!(before.valid, 0);

        assert_eq!(cache.get("u1"), None);

        let after = cache.stats();
        assert_eq!(after.total, 0);
        assert_eq!(after.expired, 0);
        assert_eq!(after.disk_entries, 0);
        assert!(!dir.path().join("u1.json").exists());
    }

    #[test]
    fn test_has_purges_expired() {
        let (cache, clock, _dir) = test_cache(100);
        cache.put_with_ttl("k", "book", 1);
        clock.advance(TimeDelta::hours(2));

        assert!(!cache.has("k"));
        assert_eq!(cache.stats().total, 0);
    }

    #[test]
    fn test_remove() {
        let (cache, _clock, dir) = test_cache(100);

        cache.put("key1", "value1");
        cache.remove("key1");

        assert!(cache.is_empty());
        assert_eq!(cache.get("key1"), None);
        assert!(!dir.path().join("key1.json").exists());
    }

    #[test]
    fn test_remove_nonexistent_is_noop() {
        let (cache, _clock, _dir) = test_cache(100);
        cache.put("keep", "value");

        let before = cache.stats();
        cache.remove("nonexistent");
        let after = cache.stats();

        assert_eq!(before, after);
    }

    #[test]
    fn test_clear() {
        let (cache, _clock, _dir) = test_cache(100);
        cache.put("a", "1");
        cache.put("b", "2");

        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.disk_entries, 0);
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_capacity_evicts_oldest_tenth() {
        let (cache, clock, _dir) = test_cache(20);

        for i in 0..20 {
            cache.put(format!("key{i}"), "v");
            clock.advance(TimeDelta::seconds(1));
        }
        assert_eq!(cache.len(), 20);

        cache.put("key20", "v");

        // 20 / 10 = 2 oldest evicted, then one inserted
        assert_eq!(cache.len(), 19);
        assert!(!cache.has("key0"));
        assert!(!cache.has("key1"));
        assert!(cache.has("key2"));
        assert!(cache.has("key20"));

        let stats = cache.stats();
        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.disk_entries, 19);
    }

    #[test]
    fn test_capacity_ties_broken_by_insertion_order() {
        // Clock never moves, so every entry shares created_at
        let (cache, _clock, _dir) = test_cache(3);

        cache.put("first", "v");
        cache.put("second", "v");
        cache.put("third", "v");
        cache.put("fourth", "v");

        assert_eq!(cache.len(), 3);
        assert!(!cache.has("first"));
        assert!(cache.has("second"));
        assert!(cache.has("fourth"));
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let (cache, _clock, _dir) = test_cache(2);
        cache.put("a", "1");
        cache.put("b", "2");

        cache.put("a", "3");

        assert_eq!(cache.len(), 2);
        assert!(cache.has("b"));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_memory_miss_falls_back_to_disk() {
        let dir = tempdir().unwrap();
        let clock = ManualClock::starting_now();
        let config = Config::default().with_cache_dir(dir.path());
        let writer = TestDataCache::with_clock(&config, clock.clone());
        let reader = TestDataCache::with_clock(&config, clock.clone());

        writer.put("late", "camera");

        // The reader rehydrated before the write, so this comes from disk
        assert_eq!(reader.len(), 0);
        assert_eq!(reader.get("late"), Some(Fixture::from("camera")));
        assert_eq!(reader.len(), 1);
    }

    #[test]
    fn test_expired_disk_record_is_purged_on_read() {
        let dir = tempdir().unwrap();
        let clock = ManualClock::starting_now();
        let config = Config::default().with_cache_dir(dir.path());
        let writer = TestDataCache::with_clock(&config, clock.clone());
        let reader = TestDataCache::with_clock(&config, clock.clone());

        writer.put_with_ttl("old", "phone", 1);
        clock.advance(TimeDelta::hours(2));

        assert!(!reader.has("old"));
        assert!(!dir.path().join("old.json").exists());
    }

    #[test]
    fn test_corrupt_disk_record_is_absent_and_removed() {
        let (cache, _clock, dir) = test_cache(100);
        let path = dir.path().join("broken.json");
        fs::write(&path, b"{\"key\": \"broken\"").unwrap();

        assert_eq!(cache.get("broken"), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_removing_similar_key_keeps_other_record() {
        let (cache, clock, dir) = test_cache(100);
        cache.put("a/b", "camera");

        let before = cache.stats();
        cache.remove("a_b");
        assert_eq!(cache.stats(), before);

        let config = Config::default().with_cache_dir(dir.path());
        let restarted = TestDataCache::with_clock(&config, clock.clone());
        assert_eq!(restarted.get("a/b"), Some(Fixture::from("camera")));
    }

    #[test]
    fn test_expiring_similar_key_keeps_other_record() {
        let (cache, clock, dir) = test_cache(100);
        cache.put_with_ttl("a_b", "short", 1);
        cache.put_with_ttl("a/b", "long", 48);
        clock.advance(TimeDelta::hours(2));

        assert_eq!(cache.get("a_b"), None);
        assert_eq!(cache.sweep_expired(), 0);

        let config = Config::default().with_cache_dir(dir.path());
        let restarted = TestDataCache::with_clock(&config, clock.clone());
        assert_eq!(restarted.get("a/b"), Some(Fixture::from("long")));
    }

    #[test]
    fn test_stats_counters() {
        let (cache, _clock, _dir) = test_cache(100);

        cache.put("key1", "value1");
        cache.get("key1");
        cache.get("nonexistent");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total, 1);
        assert_eq!(stats.valid, 1);
        assert_eq!(stats.disk_entries, 1);
    }

    #[test]
    fn test_sweep_expired() {
        let (cache, clock, dir) = test_cache(100);

        cache.put_with_ttl("short", "v", 1);
        cache.put_with_ttl("long", "v", 10);
        clock.advance(TimeDelta::hours(2));

        assert_eq!(cache.sweep_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(!dir.path().join("short.json").exists());
        assert!(dir.path().join("long.json").exists());

        // Nothing left to sweep
        assert_eq!(cache.sweep_expired(), 0);
    }

    #[test]
    fn test_flush_restores_missing_records() {
        let (cache, clock, dir) = test_cache(100);
        cache.put_with_ttl("live", "v", 5);
        cache.put_with_ttl("dying", "v", 1);
        fs::remove_file(dir.path().join("live.json")).unwrap();
        clock.advance(TimeDelta::hours(2));

        assert_eq!(cache.flush(), 1);
        assert!(dir.path().join("live.json").exists());

        // Flushing again rewrites the same record
        assert_eq!(cache.flush(), 1);
        assert_eq!(cache.stats().disk_entries, 2);
    }

    #[test]
    fn test_get_or_create_caches_first_result() {
        let (cache, _clock, _dir) = test_cache(100);
        let mut calls = 0;

        let first: Result<Fixture, ()> = cache.get_or_create("term", || {
            calls += 1;
            Ok(Fixture::from("laptop"))
        });
        let second: Result<Fixture, ()> = cache.get_or_create("term", || {
            calls += 1;
            Ok(Fixture::from("shoes"))
        });

        assert_eq!(first, Ok(Fixture::from("laptop")));
        assert_eq!(second, Ok(Fixture::from("laptop")));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_get_or_create_propagates_factory_error() {
        let (cache, _clock, _dir) = test_cache(100);

        let result = cache.get_or_create("k", || Err::<Fixture, _>("generator offline"));

        assert_eq!(result, Err("generator offline"));
        assert!(!cache.has("k"));
        assert_eq!(cache.stats().disk_entries, 0);
    }

    #[test]
    fn test_typed_get_or_create_replaces_other_kind() {
        let (cache, _clock, _dir) = test_cache(100);
        let source = crate::fixtures::RandomFixtures::seeded(5);
        cache.put("k", "not a user");

        let user = cache.get_or_create_user("k", &source);

        assert_eq!(cache.get("k"), Some(Fixture::User(user)));
    }
}
