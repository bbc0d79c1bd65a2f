//! Cache Engine Module
//!
//! Main cache engine: insertion-ordered entry map with TTL expiration,
//! size-triggered FIFO eviction, tag lookup and write-through persistence.

use std::collections::HashMap;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backing::BackingStore;
use crate::cache::{CacheEntry, CacheStats, FifoTracker, Tags, Ttl, NO_EXPIRY};
use crate::error::{CacheError, Result};

/// Fixed per-entry bookkeeping added to every size estimate.
pub const ENTRY_OVERHEAD: usize = 64;

const BYTES_PER_MB: usize = 1024 * 1024;

// == Cache ==
/// Process-local key/value cache.
///
/// Every mutation is applied to memory and then mirrored synchronously to the
/// backing store, if one is configured. Every read that misses memory is
/// retried against the backing store and repopulates memory on success.
///
/// The engine does no locking of its own. Share it across tasks behind a
/// single exclusive lock, as the HTTP layer does.
#[derive(Debug)]
pub struct Cache<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// First-insertion order of keys
    order: FifoTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Sum of estimated entry sizes
    used_bytes: usize,
    /// Soft cap on `used_bytes`
    max_memory_bytes: Option<usize>,
    /// TTL in seconds applied when `Ttl::Default` is requested
    default_ttl: Option<u64>,
    /// Write-through target
    store: Option<Box<dyn BackingStore>>,
}

impl<V> Default for Cache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            order: FifoTracker::new(),
            stats: CacheStats::new(),
            used_bytes: 0,
            max_memory_bytes: None,
            default_ttl: None,
            store: None,
        }
    }
}

impl<V> Cache<V>
where
    V: Serialize + DeserializeOwned + Clone,
{
    // == Constructors ==
    /// Creates an unbounded, memory-only cache with no default TTL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the estimated in-memory footprint at `bytes`.
    pub fn with_max_memory_bytes(mut self, bytes: usize) -> Self {
        self.max_memory_bytes = Some(bytes);
        self
    }

    /// Caps the estimated in-memory footprint at `mb` mebibytes.
    pub fn with_max_memory_mb(self, mb: usize) -> Self {
        self.with_max_memory_bytes(mb.saturating_mul(BYTES_PER_MB))
    }

    /// Applies `seconds` to entries stored with `Ttl::Default`. Zero disables it.
    pub fn with_default_ttl(mut self, seconds: u64) -> Self {
        self.default_ttl = (seconds > 0).then_some(seconds);
        self
    }

    /// Mirrors every mutation to `store` and falls back to it on memory misses.
    pub fn with_backing_store(mut self, store: impl BackingStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn max_memory_bytes(&self) -> Option<usize> {
        self.max_memory_bytes
    }

    pub fn default_ttl(&self) -> Option<u64> {
        self.default_ttl
    }

    pub fn has_backing_store(&self) -> bool {
        self.store.is_some()
    }

    // == Set ==
    /// Stores `value` under `key`, fully replacing any existing entry.
    ///
    /// A value that encodes to `null` (`None`, `()`, `Value::Null`) is not
    /// stored: the call returns `Ok(None)` and touches neither memory nor the
    /// backing store. A value of a type that cannot hold null but still
    /// encodes to it (`f64::NAN`) is a serialization error. Encoding happens before any mutation, so a value that
    /// cannot be serialized leaves the cache untouched.
    ///
    /// Returns the stored value.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: V,
        ttl: Ttl,
        tags: impl Into<Tags>,
    ) -> Result<Option<V>> {
        let key = key.into();
        let expires_at = ttl.expires_at(self.default_ttl, Utc::now());
        let mut entry = CacheEntry::new(value, tags.into(), expires_at);

        let document = serde_json::to_value(&entry)?;
        if document.get("data").map_or(true, serde_json::Value::is_null) {
            // NaN and infinite floats also encode as null; only types that
            // decode from null carry a real "no value".
            if serde_json::from_value::<V>(serde_json::Value::Null).is_err() {
                return Err(CacheError::Serialization(serde::ser::Error::custom(format!(
                    "value for key '{}' encodes to null",
                    key
                ))));
            }
            debug!("Ignoring null value for key '{}'", key);
            return Ok(None);
        }
        let blob = serde_json::to_vec(&document)?;
        entry.size = estimate_size(&key, blob.len());

        self.make_room(&key, entry.size);

        let data = entry.data.clone();
        self.insert_entry(key.clone(), entry);

        if let Some(store) = self.store.as_mut() {
            store.set(&key, &blob)?;
        }
        Ok(Some(data))
    }

    /// Alias of [`Cache::set`].
    pub fn add(
        &mut self,
        key: impl Into<String>,
        value: V,
        ttl: Ttl,
        tags: impl Into<Tags>,
    ) -> Result<Option<V>> {
        self.set(key, value, ttl, tags)
    }

    // == Get ==
    /// Retrieves the value stored under `key`.
    ///
    /// On a memory miss the backing store is consulted and a found entry is
    /// loaded into memory. An expired entry is deleted from memory and from
    /// the backing store, and reported as absent.
    pub fn get(&mut self, key: &str) -> Result<Option<V>> {
        if !self.materialize(key)? {
            return Ok(None);
        }
        Ok(self.entries.get(key).map(|entry| entry.data.clone()))
    }

    /// Like [`Cache::get`], returning `default` when nothing is stored.
    pub fn get_or(&mut self, key: &str, default: V) -> Result<V> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    // == Delete ==
    /// Removes `key` from memory and, unconditionally, from the backing store.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        self.remove_from_memory(key);
        if let Some(store) = self.store.as_mut() {
            store.delete(key)?;
        }
        Ok(())
    }

    // == Presence ==
    /// Returns true if `key` maps to a live entry.
    ///
    /// Presence does not depend on the value: empty strings, `false` and `0`
    /// are all reported present.
    pub fn has(&mut self, key: &str) -> Result<bool> {
        self.materialize(key)
    }

    /// Alias of [`Cache::has`].
    pub fn exists(&mut self, key: &str) -> Result<bool> {
        self.has(key)
    }

    // == TTL ==
    /// Replaces the TTL of a live entry. Zero means "never expires".
    ///
    /// Absent or expired keys are left alone.
    pub fn set_ttl(&mut self, key: &str, seconds: u64) -> Result<&mut Self> {
        if self.materialize(key)? {
            let expires_at = Ttl::Seconds(seconds).expires_at(None, Utc::now());
            if let Some(entry) = self.entries.get_mut(key) {
                entry.expires_at = expires_at;
            }
            self.write_through(key)?;
        }
        Ok(self)
    }

    /// Returns seconds left before `key` expires.
    ///
    /// `Some(NO_EXPIRY)` (-1) for entries that never expire, `None` when the
    /// key is absent.
    pub fn get_ttl(&mut self, key: &str) -> Result<Option<i64>> {
        if !self.materialize(key)? {
            return Ok(None);
        }
        Ok(self
            .entries
            .get(key)
            .map(|entry| entry.ttl_remaining().unwrap_or(NO_EXPIRY)))
    }

    // == Tags ==
    /// Replaces the tag set of a live entry.
    pub fn set_tags(&mut self, key: &str, tags: impl Into<Tags>) -> Result<&mut Self> {
        if self.materialize(key)? {
            if let Some(entry) = self.entries.get_mut(key) {
                entry.tags = tags.into();
            }
            self.write_through(key)?;
        }
        Ok(self)
    }

    /// Returns the values of in-memory entries sharing a tag with `tags`,
    /// oldest first.
    ///
    /// Only entries currently loaded in memory are considered; the backing
    /// store is not indexed by tag.
    pub fn get_tags(&self, tags: impl Into<Tags>) -> Vec<V> {
        let query = tags.into();
        let now = Utc::now();
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key))
            .filter(|entry| !entry.is_expired_at(now) && entry.tags.intersects(&query))
            .map(|entry| entry.data.clone())
            .collect()
    }

    // == Remember ==
    /// Stores `value` unless `key` is already present, then returns whatever
    /// is cached under `key`.
    pub fn remember(
        &mut self,
        key: impl Into<String>,
        value: V,
        ttl: Ttl,
        tags: impl Into<Tags>,
    ) -> Result<Option<V>> {
        let key = key.into();
        if !self.has(&key)? {
            self.set(key.clone(), value, ttl, tags)?;
        }
        self.get(&key)
    }

    // == Bulk Operations ==
    /// Drops every in-memory entry and clears the backing store.
    ///
    /// Backing store failures are logged, not returned.
    pub fn clear(&mut self) -> &mut Self {
        self.entries.clear();
        self.order.clear();
        self.used_bytes = 0;
        self.refresh_footprint();

        if let Some(store) = self.store.as_mut() {
            if let Err(e) = store.clear() {
                warn!("Failed to clear backing store: {}", e);
            }
        }
        info!("Cache cleared");
        self
    }

    /// Removes every expired in-memory entry from memory and the backing store.
    ///
    /// Entries that exist only in the backing store are not inspected. A
    /// failed backing store delete is logged and the sweep moves on.
    pub fn delete_expired(&mut self) -> &mut Self {
        let now = Utc::now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_from_memory(key);
            self.stats.record_expiration();
            if let Some(store) = self.store.as_mut() {
                if let Err(e) = store.delete(key) {
                    warn!("Failed to delete expired key '{}' from backing store: {}", key, e);
                }
            }
        }

        if !expired.is_empty() {
            debug!("Removed {} expired entries", expired.len());
        }
        self
    }

    // == Introspection ==
    /// In-memory keys, oldest first.
    pub fn get_keys(&self) -> Vec<String> {
        self.order.iter().map(str::to_string).collect()
    }

    /// Estimated in-memory footprint in bytes.
    pub fn get_size(&self) -> usize {
        self.used_bytes
    }

    /// Number of in-memory entries.
    pub fn get_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    // == Internals ==
    /// Brings `key` into memory if the backing store has it, then drops it if
    /// expired. Returns true if a live entry is now in memory.
    fn materialize(&mut self, key: &str) -> Result<bool> {
        if !self.entries.contains_key(key) {
            self.load(key)?;
        }

        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.stats.record_miss();
                return Ok(false);
            }
        };

        if expired {
            debug!("Key '{}' expired", key);
            self.remove_from_memory(key);
            self.stats.record_expiration();
            self.stats.record_miss();
            if let Some(store) = self.store.as_mut() {
                store.delete(key)?;
            }
            return Ok(false);
        }

        self.stats.record_hit();
        Ok(true)
    }

    fn load(&mut self, key: &str) -> Result<()> {
        let Some(store) = self.store.as_ref() else {
            return Ok(());
        };
        let Some(blob) = store.get(key)? else {
            return Ok(());
        };

        let mut entry: CacheEntry<V> = serde_json::from_slice(&blob)?;
        entry.size = estimate_size(key, blob.len());
        debug!("Loaded key '{}' from backing store", key);

        self.make_room(key, entry.size);
        self.insert_entry(key.to_string(), entry);
        Ok(())
    }

    /// Re-encodes the entry under `key`, refreshes its size estimate and
    /// mirrors it to the backing store.
    fn write_through(&mut self, key: &str) -> Result<()> {
        let Some(entry) = self.entries.get_mut(key) else {
            return Ok(());
        };
        let blob = serde_json::to_vec(&*entry)?;
        let size = estimate_size(key, blob.len());
        self.used_bytes = self.used_bytes - entry.size + size;
        entry.size = size;
        self.refresh_footprint();

        if let Some(store) = self.store.as_mut() {
            store.set(key, &blob)?;
        }
        Ok(())
    }

    /// Evicts oldest-inserted entries until `incoming` bytes fit under the cap.
    ///
    /// The entry being replaced under `key` is never a victim; its current
    /// size is credited against the cap. Evicted entries stay in the backing
    /// store.
    fn make_room(&mut self, key: &str, incoming: usize) {
        let Some(max) = self.max_memory_bytes else {
            return;
        };
        let replaced = self.entries.get(key).map_or(0, |entry| entry.size);
        let projected = self.used_bytes - replaced + incoming;
        if projected < max {
            return;
        }

        // Free until the footprint lands strictly under the cap.
        let overflow = projected - max;
        let mut freed = 0;
        let mut victims = Vec::new();
        for candidate in self.order.iter() {
            if freed > overflow {
                break;
            }
            if candidate == key {
                continue;
            }
            freed += self.entries.get(candidate).map_or(0, |entry| entry.size);
            victims.push(candidate.to_string());
        }

        for victim in victims {
            self.remove_from_memory(&victim);
            self.stats.record_eviction();
            debug!("Evicted key '{}' to respect memory cap", victim);
        }
    }

    fn insert_entry(&mut self, key: String, entry: CacheEntry<V>) {
        self.used_bytes += entry.size;
        self.order.insert(&key);
        if let Some(old) = self.entries.insert(key, entry) {
            self.used_bytes -= old.size;
        }
        self.refresh_footprint();
    }

    fn remove_from_memory(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.order.remove(key);
        self.used_bytes -= entry.size;
        self.refresh_footprint();
        Some(entry)
    }

    fn refresh_footprint(&mut self) {
        self.stats.set_footprint(self.entries.len(), self.used_bytes);
    }
}

/// Size proxy for an entry: key bytes plus encoded entry bytes plus overhead.
fn estimate_size(key: &str, encoded_len: usize) -> usize {
    key.len() + encoded_len + ENTRY_OVERHEAD
}
