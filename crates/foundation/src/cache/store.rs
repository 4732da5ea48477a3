//! Bounded per-namespace cache store
//!
//! LRU eviction with lazy TTL expiry over a plain `HashMap`. One instance
//! backs each cache namespace.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;

/// Number of entries sampled when estimating memory usage
const SIZE_SAMPLE: usize = 10;

/// A single cache namespace: a bounded LRU map with a fixed TTL
///
/// Values are stored as JSON. Expired entries are dropped lazily when they
/// are next read; there is no background sweep.
#[derive(Debug)]
pub struct NamespaceStore {
    /// Cached values keyed by caller-built keys
    entries: HashMap<String, CacheEntry>,
    /// Entry cap enforced on insert
    max_entries: usize,
    /// Time-to-live applied to every entry
    ttl: Duration,
    /// Monotonic stamp; a larger value means more recently used
    access_counter: u64,
    hits: u64,
    misses: u64,
    /// Capacity evictions only; TTL expiry is not counted here
    evictions: u64,
}

#[derive(Debug)]
struct CacheEntry {
    value: Value,
    created_at: Instant,
    last_access: u64,
    /// Serialized size, computed on demand and dropped on overwrite
    size_hint: Option<usize>,
}

impl NamespaceStore {
    /// Create a store with the given capacity and TTL
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::with_capacity(max_entries),
            max_entries,
            ttl,
            access_counter: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Get a cached value
    ///
    /// A hit refreshes the entry's recency stamp. An entry past its TTL is
    /// removed here and reported as a miss.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        self.access_counter += 1;
        match self.entries.get_mut(key) {
            Some(entry) if entry.created_at.elapsed() < self.ttl => {
                entry.last_access = self.access_counter;
                self.hits += 1;
                Some(entry.value.clone())
            }
            Some(_) => {
                // Expired: drop the entry and count the miss
                self.entries.remove(key);
                self.misses += 1;
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert or overwrite a value
    ///
    /// Overwriting refreshes both the TTL and the LRU position. If the store
    /// is at capacity, least recently used entries are evicted first.
    pub fn set(&mut self, key: String, value: Value) {
        self.access_counter += 1;

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = value;
            entry.created_at = Instant::now();
            entry.last_access = self.access_counter;
            entry.size_hint = None;
            return;
        }

        while self.entries.len() >= self.max_entries && !self.entries.is_empty() {
            self.evict_lru();
        }

        self.entries.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
                last_access: self.access_counter,
                size_hint: None,
            },
        );
    }

    /// Remove one key
    ///
    /// Returns whether an entry was present.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop all entries, keeping the hit/miss/eviction counters
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries currently stored (expired ones included until read)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry cap for this namespace
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Drop the entry with the oldest recency stamp
    ///
    /// The access counter is strictly monotonic, so ties cannot occur and
    /// entries that were never read leave in insertion order.
    fn evict_lru(&mut self) {
        let lru_key = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(key, _)| key.clone());
        if let Some(key) = lru_key {
            self.entries.remove(&key);
            self.evictions += 1;
        }
    }

    /// Get store statistics
    pub fn stats(&self) -> NamespaceStats {
        let lookups = self.hits + self.misses;
        let hit_rate = if lookups > 0 {
            self.hits as f64 / lookups as f64
        } else {
            0.0
        };

        NamespaceStats {
            entries: self.entries.len(),
            capacity: self.max_entries,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            hit_rate,
        }
    }

    /// Estimate the memory held by this store, in bytes
    ///
    /// Serializes up to [`SIZE_SAMPLE`] entries, caches their sizes, and
    /// extrapolates the average over the whole store. Advisory only.
    pub fn sampled_size_bytes(&mut self) -> usize {
        if self.entries.is_empty() {
            return 0;
        }

        let mut sampled = 0usize;
        let mut sampled_bytes = 0usize;
        for entry in self.entries.values_mut().take(SIZE_SAMPLE) {
            let size = match entry.size_hint {
                Some(size) => size,
                None => {
                    let size = serde_json::to_string(&entry.value)
                        .map(|s| s.len())
                        .unwrap_or(0);
                    entry.size_hint = Some(size);
                    size
                }
            };
            sampled += 1;
            sampled_bytes += size;
        }

        (sampled_bytes / sampled) * self.entries.len()
    }
}

/// Statistics for a single namespace
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Hits over total lookups (0.0 when there has been no traffic)
    pub hit_rate: f64,
}
