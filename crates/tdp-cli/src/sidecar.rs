//! Provenance sidecar handling
//!
//! Each canonical file gets a co-located `<file>.meta.json` written exactly
//! once at promotion. Reads are best-effort: the ingestion stage only wants
//! the source locator, and any IO or parse problem is treated the same as
//! an absent sidecar.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Provenance record for one canonical file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sidecar {
    pub source_uri: String,
    pub dataset: String,
    pub year: i32,
    pub month: u32,
    pub fetched_at_utc: DateTime<Utc>,
    pub bytes: u64,
}

/// Path of the sidecar for a canonical file
pub fn sidecar_path(final_path: &Path) -> PathBuf {
    let mut name = final_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push_str(".meta.json");
    final_path.with_file_name(name)
}

/// Write the provenance sidecar next to a freshly promoted canonical file
pub fn write_sidecar(
    final_path: &Path,
    source_uri: &str,
    dataset: &str,
    year: i32,
    month: u32,
    bytes: u64,
) -> Result<()> {
    let sidecar = Sidecar {
        source_uri: source_uri.to_string(),
        dataset: dataset.to_string(),
        year,
        month,
        fetched_at_utc: Utc::now(),
        bytes,
    };
    let content = serde_json::to_string(&sidecar)?;
    std::fs::write(sidecar_path(final_path), content)?;
    Ok(())
}

/// Read the source locator from the sidecar adjacent to `path`, if any
///
/// Lossy by design: IO errors and malformed JSON are indistinguishable from
/// a missing sidecar. See DESIGN.md for the open question on this.
pub fn read_source_uri(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(sidecar_path(path)).ok()?;
    let sidecar: Sidecar = serde_json::from_str(&content).ok()?;
    Some(sidecar.source_uri)
}
