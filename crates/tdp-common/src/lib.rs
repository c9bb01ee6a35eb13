//! TDP Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities for the TDP (Trip Data Pipeline) workspace members:
//!
//! - **Checksums**: streaming SHA-256 with byte accounting and timing
//! - **Error Handling**: common error and result types
//! - **Logging**: tracing subscriber configuration
//!
//! # Example
//!
//! ```no_run
//! use tdp_common::checksum::compute_file_checksum;
//!
//! fn fingerprint(path: &str) -> tdp_common::Result<()> {
//!     let checksum = compute_file_checksum(path)?;
//!     println!("{} ({} bytes)", checksum.sha256_hex, checksum.bytes_hashed);
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{Result, TdpError};
