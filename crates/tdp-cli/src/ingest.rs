//! Ingestion planner and runner
//!
//! Turns a tree of raw files into ledger entries, once, safely. Discovery
//! is deterministic (sorted paths), every file passes sanity checks before
//! hashing, and a checksum mismatch against a known path aborts the whole
//! run as a data-integrity error.

use crate::config::DATA_EXTENSION;
use crate::error::{CliError, Result, SanityViolation};
use crate::layout::posix_relative;
use crate::ledger::{LedgerStore, NewFileRecord, RunCounts, RunStatus};
use crate::sidecar;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tdp_common::checksum::compute_file_checksum;
use tracing::{debug, info, warn};

/// Options for one ingestion invocation
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub dry_run: bool,
    pub raw_root: PathBuf,
    pub db_path: PathBuf,
}

/// Result of one completed (successful) ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: String,
    pub counts: RunCounts,
}

/// Recursively enumerate data files under the raw root
///
/// Returns lexicographically sorted paths for reproducible run logs. The
/// staging subtree is part of the walk; in-flight `.partial` files never
/// match the data extension and staged files are legitimate candidates.
pub fn discover_raw_files(raw_root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !raw_root.exists() {
        return Ok(files);
    }

    for entry in walkdir::WalkDir::new(raw_root) {
        let entry = entry.map_err(|e| CliError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) == Some(DATA_EXTENSION) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Pre-hash sanity checks; returns the file size on success
///
/// Symlinks are a hard error for this stage of the pipeline.
pub fn sanity_check_file(path: &Path) -> Result<u64> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(_) => return Err(CliError::sanity(path, SanityViolation::Missing)),
    };

    if meta.file_type().is_symlink() {
        return Err(CliError::sanity(path, SanityViolation::Symlink));
    }
    if !meta.is_file() {
        return Err(CliError::sanity(path, SanityViolation::NotAFile));
    }
    if meta.len() == 0 {
        return Err(CliError::sanity(path, SanityViolation::ZeroBytes));
    }

    Ok(meta.len())
}

/// Run one ingestion invocation
///
/// Dry-run performs the same discovery, sanity checks, and hashing as a
/// real run, but never touches the ledger database.
pub fn run(options: &IngestOptions) -> Result<RunSummary> {
    let run_id = crate::ledger::store::generate_run_id();
    let start_time = Utc::now();

    let files = discover_raw_files(&options.raw_root)?;
    let detected = files.len() as u64;
    info!(%run_id, detected, dry_run = options.dry_run, "Ingestion run starting");

    if options.dry_run {
        println!("[DRY RUN] run_id: {}", run_id);
        println!("[DRY RUN] Files detected: {}", detected);
        for path in &files {
            sanity_check_file(path)?;
            let checksum = compute_file_checksum(path).map_err(anyhow::Error::from)?;
            let raw_path = relative_key(path, &options.raw_root)?;
            debug!(%raw_path, checksum = %checksum.sha256_hex, "Planned");
            println!("  WOULD INGEST: {}", raw_path);
        }
        return Ok(RunSummary {
            run_id,
            counts: RunCounts {
                detected,
                ingested: 0,
                skipped: 0,
            },
        });
    }

    let store = LedgerStore::open(&options.db_path)?;
    store.insert_run_start(&run_id, start_time)?;

    let mut counts = RunCounts {
        detected,
        ingested: 0,
        skipped: 0,
    };

    let outcome = ingest_files(&store, &run_id, &files, &options.raw_root, &mut counts);

    match outcome {
        Ok(()) => {
            store.update_run_end(&run_id, Utc::now(), RunStatus::Success, counts, None, None)?;
            if let Some(row) = store.get_run(&run_id)? {
                println!("{}", format_run_summary(&row));
            }
            Ok(RunSummary { run_id, counts })
        },
        Err(err) => {
            warn!(%run_id, error = %err, "Ingestion run failed");
            // Best-effort finalization: the provisional failure row stands
            // even if this update cannot be applied
            let trace = format!("{:?}", err);
            let _ = store.update_run_end(
                &run_id,
                Utc::now(),
                RunStatus::Failure,
                counts,
                Some(&err.to_string()),
                Some(&trace),
            );
            Err(err)
        },
    }
}

/// Process every discovered file against the registry
fn ingest_files(
    store: &LedgerStore,
    run_id: &str,
    files: &[PathBuf],
    raw_root: &Path,
    counts: &mut RunCounts,
) -> Result<()> {
    for path in files {
        let file_size = sanity_check_file(path)?;
        let checksum = compute_file_checksum(path).map_err(anyhow::Error::from)?;
        let raw_path = relative_key(path, raw_root)?;

        if let Some(existing) = store.get_registry_entry(&raw_path)? {
            if existing.checksum_sha256 == checksum.sha256_hex {
                // Steady state on repeated runs
                counts.skipped += 1;
                println!("SKIPPED: {}", raw_path);
                continue;
            }
            return Err(CliError::ChecksumCollision {
                raw_path,
                existing: existing.checksum_sha256,
                actual: checksum.sha256_hex,
            });
        }

        let source_uri = sidecar::read_source_uri(path);
        store.insert_file_registry(&NewFileRecord {
            raw_path: raw_path.clone(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            checksum_sha256: checksum.sha256_hex,
            file_size_bytes: file_size,
            bytes_hashed: checksum.bytes_hashed,
            checksum_duration_ms: checksum.duration_ms,
            source_uri,
            first_seen_at: Utc::now(),
            first_ingestion_run_id: run_id.to_string(),
        })?;
        counts.ingested += 1;
        info!(%raw_path, "Ingested");
    }
    Ok(())
}

fn relative_key(path: &Path, raw_root: &Path) -> Result<String> {
    posix_relative(path, raw_root).ok_or_else(|| {
        CliError::config(format!(
            "Discovered file '{}' is not under raw root '{}'",
            path.display(),
            raw_root.display()
        ))
    })
}

/// One-line human summary of a finalized run
pub fn format_run_summary(row: &crate::ledger::store::RunRow) -> String {
    let duration = match (&row.end_time, parse_time(&row.start_time)) {
        (Some(end), Some(start)) => match parse_time(end) {
            Some(end) => format!("{:.1}s", (end - start).num_milliseconds() as f64 / 1000.0),
            None => "?".to_string(),
        },
        _ => "?".to_string(),
    };

    format!(
        "{} | {} | {} detected, {} ingested, {} skipped | {}",
        row.run_id,
        row.status,
        row.files_detected,
        row.files_ingested,
        row.files_skipped,
        duration
    )
}

fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
