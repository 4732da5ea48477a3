//! # toolsmith-foundation
//!
//! Foundation layer for Toolsmith:
//! - Cache: multi-namespace LRU + TTL caching for tool results
//! - Checksum: file change tracking that drives cache invalidation
//! - Config: JSON configuration for both
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │  MCP tool handlers (git, go, node, cargo, ...)    │
//! │          │ lookups                                │
//! │          ▼                                        │
//! │  CacheManager ─ one NamespaceStore per namespace  │
//! │          ▲                                        │
//! │          │ invalidation (ChangeListener)          │
//! │  ChecksumTracker ─ watch loop, two-phase checks   │
//! └───────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod checksum;
pub mod error;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Cache (namespaced tool-result caching)
// ============================================================================
pub use cache::{
    // Config
    CacheConfig,
    ChecksumConfig,
    NamespaceConfig,
    // Key construction
    CacheKey,
    // Manager
    CacheManager,
    CacheManagerStats,
    // Store
    NamespaceStats,
    NamespaceStore,
    // Namespace Constants
    NS_COMMAND_AVAILABILITY,
    NS_FILE_LISTS,
    NS_GIT_OPERATIONS,
    NS_GO_MODULES,
    NS_NODE_MODULES,
    NS_PROJECT_DETECTION,
    NS_SMART_SUGGESTIONS,
    NS_TEST_RESULTS,
};

// ============================================================================
// Checksum (file change tracking)
// ============================================================================
pub use checksum::{
    ChangeListener,
    CheckReport,
    // Tracker
    ChecksumTracker,
    // Hashing
    HashAlgorithm,
    // Cache bridge
    NamespaceInvalidator,
    TrackerStats,
};
