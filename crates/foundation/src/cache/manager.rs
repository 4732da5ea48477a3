//! Multi-namespace cache manager
//!
//! Routes every tool's cache traffic to the right namespace store.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::config::CacheConfig;
use super::store::{NamespaceStats, NamespaceStore};
use crate::error::{Error, Result};

/// Multi-namespace cache manager
///
/// Routes reads and writes to independent namespace stores, each with its
/// own capacity, TTL, and statistics.
///
/// ```text
/// ┌─────────────────────────────────────────────┐
/// │                CacheManager                 │
/// ├─────────────────────────────────────────────┤
/// │  projectDetection ──  LRU + TTL store       │
/// │  gitOperations    ──  LRU + TTL store       │
/// │  goModules        ──  LRU + TTL store       │
/// │  ...one independent store per namespace     │
/// └─────────────────────────────────────────────┘
/// ```
///
/// # Usage
///
/// ```rust,ignore
/// let cache = Arc::new(CacheManager::new());
///
/// if let Some(status) = cache.get::<GitStatus>(NS_GIT_OPERATIONS, &key)? {
///     return Ok(status);
/// }
/// let status = run_git_status(&repo).await?;
/// cache.set(NS_GIT_OPERATIONS, &key, &status)?;
/// ```
///
/// All methods take `&self`; clones of the `Arc` can be used freely across
/// tasks.
#[derive(Debug)]
pub struct CacheManager {
    config: CacheConfig,
    enabled: AtomicBool,
    stores: HashMap<String, Mutex<NamespaceStore>>,
}

impl CacheManager {
    /// Create a manager with the default namespace set
    pub fn new() -> Self {
        Self::build(CacheConfig::default())
    }

    /// Create a manager from an explicit configuration, validating it first
    ///
    /// Fails with [`Error::Config`] when the configuration does not
    /// validate. The namespace set is fixed from here on.
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: CacheConfig) -> Self {
        let stores = config
            .namespaces
            .iter()
            .map(|(name, ns)| {
                let store = NamespaceStore::new(ns.max_entries, ns.ttl());
                (name.clone(), Mutex::new(store))
            })
            .collect();

        Self {
            enabled: AtomicBool::new(config.enabled),
            stores,
            config,
        }
    }

    // =========================================================================
    // Lookup & Store
    // =========================================================================

    /// Get a cached value
    ///
    /// Returns `Ok(None)` on a miss or while caching is disabled. A stored
    /// value that does not deserialize as `T` surfaces as [`Error::Json`];
    /// an unknown namespace is always an error, disabled or not.
    pub fn get<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Result<Option<T>> {
        let store = self.store(namespace)?;
        if !self.is_enabled() {
            return Ok(None);
        }

        match store.lock().get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Store a value
    ///
    /// A no-op while caching is disabled. Overwriting an existing key
    /// refreshes its TTL and LRU position.
    pub fn set<T: Serialize>(&self, namespace: &str, key: &str, value: &T) -> Result<()> {
        let store = self.store(namespace)?;
        if !self.is_enabled() {
            return Ok(());
        }

        let json = serde_json::to_value(value)?;
        store.lock().set(key.to_string(), json);
        Ok(())
    }

    // =========================================================================
    // Invalidation
    // =========================================================================

    /// Remove a single key, reporting whether an entry was present
    ///
    /// Invalidation works even while caching is disabled.
    pub fn invalidate(&self, namespace: &str, key: &str) -> Result<bool> {
        let removed = self.store(namespace)?.lock().invalidate(key);
        if removed {
            debug!("Invalidated cache entry {}:{}", namespace, key);
        }
        Ok(removed)
    }

    /// Drop every entry in one namespace
    pub fn invalidate_namespace(&self, namespace: &str) -> Result<()> {
        self.store(namespace)?.lock().clear();
        debug!("Cleared cache namespace {}", namespace);
        Ok(())
    }

    /// Drop every entry in every namespace
    ///
    /// Hit/miss/eviction counters survive, so stats remain meaningful
    /// across a clear.
    pub fn clear_all(&self) {
        for store in self.stores.values() {
            store.lock().clear();
        }
        debug!("Cleared all cache namespaces");
    }

    // =========================================================================
    // Enable / Disable
    // =========================================================================

    /// Whether reads and writes currently go through
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Toggle caching at runtime
    ///
    /// Disabling does not drop stored entries; they become reachable again
    /// once re-enabled (TTL permitting).
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        debug!("Cache {}", if enabled { "enabled" } else { "disabled" });
    }

    // =========================================================================
    // Statistics & Memory Accounting
    // =========================================================================

    /// Statistics for one namespace, `None` if the name is unknown
    pub fn stats(&self, namespace: &str) -> Option<NamespaceStats> {
        self.stores.get(namespace).map(|s| s.lock().stats())
    }

    /// Statistics for every namespace plus totals
    pub fn all_stats(&self) -> CacheManagerStats {
        let namespaces: BTreeMap<String, NamespaceStats> = self
            .stores
            .iter()
            .map(|(name, store)| (name.clone(), store.lock().stats()))
            .collect();

        CacheManagerStats {
            namespaces,
            estimated_memory_bytes: self.estimated_memory_bytes(),
            max_memory_mb: self.config.max_memory_mb,
            enabled: self.is_enabled(),
        }
    }

    /// Estimate total memory held across all namespaces, in bytes
    ///
    /// Based on per-namespace sampling; advisory only.
    pub fn estimated_memory_bytes(&self) -> usize {
        self.stores
            .values()
            .map(|s| s.lock().sampled_size_bytes())
            .sum()
    }

    /// Estimate total memory held across all namespaces, in MB
    pub fn estimated_memory_mb(&self) -> f64 {
        self.estimated_memory_bytes() as f64 / (1024.0 * 1024.0)
    }

    /// Names of the configured namespaces, sorted
    pub fn namespaces(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.stores.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The configuration this manager was built from
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn store(&self, namespace: &str) -> Result<&Mutex<NamespaceStore>> {
        self.stores
            .get(namespace)
            .ok_or_else(|| Error::UnknownNamespace(namespace.to_string()))
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics across every namespace
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheManagerStats {
    pub namespaces: BTreeMap<String, NamespaceStats>,
    pub estimated_memory_bytes: usize,
    pub max_memory_mb: usize,
    pub enabled: bool,
}

impl CacheManagerStats {
    /// Hit rate over all namespaces combined
    pub fn overall_hit_rate(&self) -> f64 {
        let hits: u64 = self.namespaces.values().map(|s| s.hits).sum();
        let misses: u64 = self.namespaces.values().map(|s| s.misses).sum();
        let lookups = hits + misses;

        if lookups > 0 {
            hits as f64 / lookups as f64
        } else {
            0.0
        }
    }
}
