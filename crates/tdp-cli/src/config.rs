//! Configuration for the TDP CLI
//!
//! The archive URL template is configuration, not logic: it carries
//! `{dataset}`, `{year}` and `{month}` placeholders, with the month
//! substituted zero-padded to two digits.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// CLI Configuration Constants
// ============================================================================

/// Default archive URL template (NYC TLC trip record data)
pub const DEFAULT_ARCHIVE_URL: &str =
    "https://d37ci6vzurychx.cloudfront.net/trip-data/{dataset}_{year}-{month}.parquet";

/// Source tag used in the canonical path layout (`source=<tag>`)
pub const SOURCE_TAG: &str = "tlc";

/// File extension of fetched partitions
pub const DATA_EXTENSION: &str = "parquet";

/// Connect and per-read timeout for partition downloads, in seconds
///
/// Applied per socket operation, not to the whole transfer: monthly
/// partitions can be large and a healthy download may legitimately take
/// minutes.
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 30;

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Archive URL template with {dataset}/{year}/{month} placeholders
    pub archive_url: String,
}

impl Config {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self {
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
        }
    }

    /// Load config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Ok(url) = std::env::var("TDP_ARCHIVE_URL") {
            config.archive_url = url;
        }
        config
    }

    /// Resolve the source locator for one partition
    pub fn source_uri(&self, dataset: &str, year: i32, month: u32) -> Result<String> {
        if !self.archive_url.contains("{dataset}") {
            return Err(CliError::config(format!(
                "Archive URL template missing {{dataset}} placeholder: {}",
                self.archive_url
            )));
        }
        Ok(self
            .archive_url
            .replace("{dataset}", dataset)
            .replace("{year}", &format!("{:04}", year))
            .replace("{month}", &format!("{:02}", month)))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
