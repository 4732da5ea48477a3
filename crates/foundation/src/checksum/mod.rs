//! # Toolsmith Checksum Tracking
//!
//! Detects content changes in dependency files (`go.mod`, `package.json`,
//! lockfiles) so that caches built from them can be invalidated instead of
//! going stale.
//!
//! Detection is two-phase: metadata (mtime + size) rules out the common
//! unchanged case without touching file contents; only files whose
//! metadata moved get hashed. The [`ChecksumTracker`] exposes one-shot
//! checks and an interval-driven background watch loop.
//!
//! ## Modules
//!
//! - [`hasher`] - Content hash algorithms (sha256, md5)
//! - [`tracker`] - Tracked files, change listeners, watch loop

pub mod hasher;
pub mod tracker;

// Re-exports for convenience
pub use hasher::HashAlgorithm;

pub use tracker::{
    ChangeListener, CheckReport, ChecksumTracker, NamespaceInvalidator, TrackerStats,
};
