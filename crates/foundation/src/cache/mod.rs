//! # Toolsmith Cache System
//!
//! In-process caching for tool results, shared by every tool the server
//! exposes.
//!
//! ## Design Principles
//!
//! 1. **Bounded by construction** - Every namespace has a hard entry cap
//!    with LRU eviction and a TTL; nothing grows without limit
//! 2. **Lazy expiry** - Entries expire when read, not on a timer; there is
//!    no background sweep to schedule or tune
//! 3. **Advisory accounting** - Memory usage is estimated by sampling and
//!    reported, never enforced
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      CacheManager                        │
//! ├──────────────────────────────────────────────────────────┤
//! │  projectDetection  gitOperations  goModules  nodeModules │
//! │  fileLists  commandAvailability  testResults  ...        │
//! │                                                          │
//! │  one NamespaceStore each: LRU + TTL + hit/miss counters  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use toolsmith_foundation::cache::{CacheManager, NS_GIT_OPERATIONS};
//!
//! let cache = CacheManager::new();
//!
//! let mut key = CacheKey::new();
//! key.push_str("git_status");
//! key.push_str(workdir);
//! let key = key.finalize();
//!
//! if let Some(status) = cache.get::<GitStatus>(NS_GIT_OPERATIONS, &key)? {
//!     return Ok(status);
//! }
//! let status = run_git_status(workdir).await?;
//! cache.set(NS_GIT_OPERATIONS, &key, &status)?;
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Cache configuration and namespace constants
//! - [`key`] - Cache key construction
//! - [`store`] - Per-namespace LRU + TTL store
//! - [`manager`] - Multi-namespace cache manager

pub mod config;
pub mod key;
pub mod manager;
pub mod store;

// Re-exports for convenience
pub use config::{
    CacheConfig, ChecksumConfig, NamespaceConfig, NS_COMMAND_AVAILABILITY, NS_FILE_LISTS,
    NS_GIT_OPERATIONS, NS_GO_MODULES, NS_NODE_MODULES, NS_PROJECT_DETECTION, NS_SMART_SUGGESTIONS,
    NS_TEST_RESULTS,
};

pub use key::{hash_json, CacheKey};

pub use manager::{CacheManager, CacheManagerStats};

pub use store::{NamespaceStats, NamespaceStore};
