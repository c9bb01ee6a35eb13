//! Error types for TDP

use thiserror::Error;

/// Result type alias for TDP operations
pub type Result<T> = std::result::Result<T, TdpError>;

/// Main error type for TDP
#[derive(Error, Debug)]
pub enum TdpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
