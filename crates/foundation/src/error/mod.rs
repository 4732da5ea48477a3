//! Error types for Toolsmith
//!
//! All errors are managed centrally.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Toolsmith error type
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Cache
    // ========================================================================
    #[error("Unknown cache namespace: {0}")]
    UnknownNamespace(String),

    // ========================================================================
    // Checksum tracking
    // ========================================================================
    #[error("File is not tracked: {}", .0.display())]
    UntrackedFile(PathBuf),

    // ========================================================================
    // External error conversion
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
