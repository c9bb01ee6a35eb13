//! Error types for the TDP CLI
//!
//! One closed set of error kinds covers both pipeline stages. Per-partition
//! fetch failures are not errors (they are outcomes, see `fetch`); only
//! faults that abort a whole invocation surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Comprehensive error type for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("Network request failed: {0}. Check your internet connection and the archive URL.")]
    Http(#[from] reqwest::Error),

    /// Ledger database operation failed
    #[error("Ledger database error: {0}")]
    Db(#[from] rusqlite::Error),

    /// JSON serialization failed
    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Month range arguments are invalid
    #[error("Invalid range: {0}. Use --year Y [--month M] or --from YYYY-MM --to YYYY-MM.")]
    InvalidRange(String),

    /// A rename during stage or canonical promotion failed; the whole fetch
    /// range aborts and partial files are left in place for forensics
    #[error("Storage fault: failed to promote '{path}': {message}")]
    StorageFault { path: PathBuf, message: String },

    /// A discovered file failed the pre-hash sanity checks
    #[error("Sanity check failed for '{path}': {reason}")]
    Sanity { path: PathBuf, reason: SanityViolation },

    /// A known relative path re-appeared with different content
    #[error("Checksum collision for '{raw_path}': existing={existing} new={actual}")]
    ChecksumCollision {
        raw_path: String,
        existing: String,
        actual: String,
    },

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Reasons a file can fail the ingestion sanity checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanityViolation {
    /// File disappeared between discovery and processing
    Missing,
    /// Path is a directory or other non-regular file
    NotAFile,
    /// Symbolic links are not supported by the ingestion stage
    Symlink,
    /// File exists but has zero bytes
    ZeroBytes,
}

impl std::fmt::Display for SanityViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SanityViolation::Missing => write!(f, "file not found"),
            SanityViolation::NotAFile => write!(f, "not a regular file"),
            SanityViolation::Symlink => write!(f, "symlinks are not supported"),
            SanityViolation::ZeroBytes => write!(f, "file is zero bytes"),
        }
    }
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid range error
    pub fn invalid_range(msg: impl Into<String>) -> Self {
        Self::InvalidRange(msg.into())
    }

    /// Create a storage fault error
    pub fn storage_fault(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::StorageFault {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a sanity violation error
    pub fn sanity(path: impl Into<PathBuf>, reason: SanityViolation) -> Self {
        Self::Sanity {
            path: path.into(),
            reason,
        }
    }
}
