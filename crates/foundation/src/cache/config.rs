//! Cache and checksum-tracking configuration
//!
//! JSON with camelCase keys, the same shape the server reports back to
//! clients. Every field has a default so an empty object is a valid config.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::checksum::HashAlgorithm;
use crate::error::{Error, Result};

// ============================================================================
// Namespace Constants
// ============================================================================

/// Project type detection results
pub const NS_PROJECT_DETECTION: &str = "projectDetection";
/// Git status, branch, and log output
pub const NS_GIT_OPERATIONS: &str = "gitOperations";
/// Go module metadata
pub const NS_GO_MODULES: &str = "goModules";
/// Node package metadata
pub const NS_NODE_MODULES: &str = "nodeModules";
/// Directory listings
pub const NS_FILE_LISTS: &str = "fileLists";
/// Which-style command availability probes
pub const NS_COMMAND_AVAILABILITY: &str = "commandAvailability";
/// Test runner output
pub const NS_TEST_RESULTS: &str = "testResults";
/// Suggestion engine results
pub const NS_SMART_SUGGESTIONS: &str = "smartSuggestions";

// ============================================================================
// Configuration Types
// ============================================================================

/// Top-level cache settings, including checksum tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Master switch; when disabled, reads miss and writes are dropped
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Advisory memory budget in MB, surfaced in stats but never enforced
    #[serde(default = "default_max_memory_mb", rename = "maxMemoryMB")]
    pub max_memory_mb: usize,

    /// Per-namespace capacity and TTL
    ///
    /// The key set here is the complete set of namespaces the manager will
    /// accept at runtime.
    #[serde(default = "default_namespaces")]
    pub namespaces: BTreeMap<String, NamespaceConfig>,

    /// File checksum tracking settings
    #[serde(default)]
    pub checksum_tracking: ChecksumConfig,
}

/// Limits for a single cache namespace
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceConfig {
    /// Most entries the namespace holds before eviction starts
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Entry time-to-live in milliseconds
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
}

/// Checksum tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecksumConfig {
    /// Whether the background watch loop may run
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Interval between background check passes, in milliseconds
    #[serde(default = "default_watch_interval_ms")]
    pub watch_interval_ms: u64,

    /// Content hash algorithm
    #[serde(default)]
    pub algorithm: HashAlgorithm,

    /// Files at or above this size are never content-hashed; metadata
    /// differences alone count as changes for them
    #[serde(default = "default_large_file_threshold_bytes")]
    pub large_file_threshold_bytes: u64,
}

// Default value functions
fn default_enabled() -> bool {
    true
}
fn default_max_memory_mb() -> usize {
    100
}
fn default_max_entries() -> usize {
    100
}
fn default_ttl_ms() -> u64 {
    300_000
} // 5 minutes
fn default_watch_interval_ms() -> u64 {
    5_000
}
fn default_large_file_threshold_bytes() -> u64 {
    100 * 1024 * 1024
} // 100MB

fn default_namespaces() -> BTreeMap<String, NamespaceConfig> {
    BTreeMap::from([
        (
            NS_PROJECT_DETECTION.to_string(),
            NamespaceConfig::new(50, 600_000), // 10 minutes
        ),
        (
            NS_GIT_OPERATIONS.to_string(),
            NamespaceConfig::new(200, 30_000), // 30 seconds
        ),
        (
            NS_GO_MODULES.to_string(),
            NamespaceConfig::new(100, 300_000), // 5 minutes
        ),
        (
            NS_NODE_MODULES.to_string(),
            NamespaceConfig::new(100, 300_000), // 5 minutes
        ),
        (
            NS_FILE_LISTS.to_string(),
            NamespaceConfig::new(200, 60_000), // 1 minute
        ),
        (
            NS_COMMAND_AVAILABILITY.to_string(),
            NamespaceConfig::new(300, 1_800_000), // 30 minutes
        ),
        (
            NS_TEST_RESULTS.to_string(),
            NamespaceConfig::new(100, 120_000), // 2 minutes
        ),
        (
            NS_SMART_SUGGESTIONS.to_string(),
            NamespaceConfig::new(150, 300_000), // 5 minutes
        ),
    ])
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_memory_mb: default_max_memory_mb(),
            namespaces: default_namespaces(),
            checksum_tracking: ChecksumConfig::default(),
        }
    }
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_ms: default_ttl_ms(),
        }
    }
}

impl Default for ChecksumConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            watch_interval_ms: default_watch_interval_ms(),
            algorithm: HashAlgorithm::default(),
            large_file_threshold_bytes: default_large_file_threshold_bytes(),
        }
    }
}

impl NamespaceConfig {
    pub fn new(max_entries: usize, ttl_ms: u64) -> Self {
        Self {
            max_entries,
            ttl_ms,
        }
    }

    /// Get the TTL as a Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl ChecksumConfig {
    /// Get the watch interval as a Duration
    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms)
    }
}

impl CacheConfig {
    /// Parse and validate a configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    /// Check limits; a config that fails here must not be used
    pub fn validate(&self) -> Result<()> {
        for (name, ns) in &self.namespaces {
            if ns.max_entries == 0 {
                return Err(Error::Config(format!(
                    "namespace {name}: maxEntries must be at least 1"
                )));
            }
            if ns.ttl_ms == 0 {
                return Err(Error::Config(format!(
                    "namespace {name}: ttlMs must be at least 1"
                )));
            }
        }
        if self.checksum_tracking.watch_interval_ms == 0 {
            return Err(Error::Config(
                "checksumTracking.watchIntervalMs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_namespaces_present() {
        let config = CacheConfig::default();

        assert!(config.enabled);
        assert_eq!(config.namespaces.len(), 8);
        assert_eq!(config.namespaces[NS_GO_MODULES].max_entries, 100);
        assert_eq!(config.namespaces[NS_GIT_OPERATIONS].ttl_ms, 30_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_object_is_valid() {
        let config = CacheConfig::from_json_str("{}").unwrap();

        assert!(config.enabled);
        assert_eq!(config.max_memory_mb, 100);
        assert_eq!(config.namespaces.len(), 8);
        assert_eq!(config.checksum_tracking.watch_interval_ms, 5_000);
        assert_eq!(config.checksum_tracking.algorithm, HashAlgorithm::Sha256);
    }

    #[test]
    fn test_camel_case_keys() {
        let json = r#"{
            "enabled": false,
            "maxMemoryMB": 50,
            "namespaces": {
                "goModules": { "maxEntries": 2, "ttlMs": 1000 }
            },
            "checksumTracking": {
                "enabled": false,
                "watchIntervalMs": 250,
                "algorithm": "md5"
            }
        }"#;
        let config = CacheConfig::from_json_str(json).unwrap();

        assert!(!config.enabled);
        assert_eq!(config.max_memory_mb, 50);
        assert_eq!(config.namespaces.len(), 1);
        assert_eq!(config.namespaces[NS_GO_MODULES].max_entries, 2);
        assert_eq!(config.namespaces[NS_GO_MODULES].ttl(), Duration::from_secs(1));
        assert!(!config.checksum_tracking.enabled);
        assert_eq!(config.checksum_tracking.algorithm, HashAlgorithm::Md5);
    }

    #[test]
    fn test_serialized_form_uses_camel_case() {
        let json = serde_json::to_value(CacheConfig::default()).unwrap();

        assert!(json.get("maxMemoryMB").is_some());
        assert!(json.get("checksumTracking").is_some());
        assert!(json["namespaces"].get("projectDetection").is_some());
        assert!(json["namespaces"]["projectDetection"].get("maxEntries").is_some());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let json = r#"{"namespaces": {"goModules": {"maxEntries": 0, "ttlMs": 1000}}}"#;
        assert!(CacheConfig::from_json_str(json).is_err());

        let json = r#"{"namespaces": {"goModules": {"maxEntries": 10, "ttlMs": 0}}}"#;
        assert!(CacheConfig::from_json_str(json).is_err());

        let json = r#"{"checksumTracking": {"watchIntervalMs": 0}}"#;
        assert!(CacheConfig::from_json_str(json).is_err());
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let json = r#"{"checksumTracking": {"algorithm": "crc32"}}"#;
        assert!(CacheConfig::from_json_str(json).is_err());
    }
}
