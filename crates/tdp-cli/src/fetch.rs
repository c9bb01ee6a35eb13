//! Staged fetcher for remote dataset partitions
//!
//! Acquires one partition at a time into the canonical layout, crash-safely
//! and idempotently:
//!
//! 1. skip if the canonical file already exists (no network call)
//! 2. stream the download into a `.partial` staging file
//! 3. reject empty downloads
//! 4. rename `.partial` -> staged (atomic, same directory)
//! 5. re-check the canonical path, then rename staged -> canonical and
//!    write the provenance sidecar
//!
//! Rename failures in steps 4 and 5 abort the whole range with a storage
//! fault, leaving the partial or staged file in place for forensics. Every
//! other failure is local to its partition and iteration continues.
//!
//! One JSON attempt record per partition is emitted on stdout.

use crate::config::{Config, DOWNLOAD_TIMEOUT_SECS};
use crate::error::{CliError, Result};
use crate::layout::{partition_paths, PartitionPaths, Period, PeriodRange};
use crate::progress;
use crate::sidecar;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Why a partition was skipped without being fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Canonical file already present (before download, or lost race after)
    AlreadyExists,
    /// Remote returned 404/403/410: the partition legitimately does not exist
    ExpectedAbsence,
}

impl SkipReason {
    fn as_str(self) -> &'static str {
        match self {
            SkipReason::AlreadyExists => "already_exists",
            SkipReason::ExpectedAbsence => "expected_absence",
        }
    }
}

/// Why a partition failed without aborting the range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    /// Download completed but produced no bytes
    ZeroBytes,
    /// Timeout, connection error, or mid-stream read failure
    NetworkError,
    /// Non-success HTTP status other than the expected-absence set
    ServerError,
}

impl FailReason {
    fn as_str(self) -> &'static str {
        match self {
            FailReason::ZeroBytes => "zero_bytes",
            FailReason::NetworkError => "network_error",
            FailReason::ServerError => "server_error",
        }
    }
}

/// Outcome of one partition attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped {
        reason: SkipReason,
        http_status: Option<u16>,
        bytes: Option<u64>,
    },
    Downloaded {
        bytes: u64,
        duration_ms: u64,
    },
    Failed {
        reason: FailReason,
        http_status: Option<u16>,
        error: Option<String>,
    },
}

/// Totals for one range invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub downloaded: u64,
    pub skipped: u64,
    pub failed: u64,
    /// Bytes written to canonical files by this invocation
    pub bytes: u64,
}

/// One structured log record per fetch attempt, emitted on stdout
#[derive(Debug, Serialize)]
struct AttemptRecord<'a> {
    timestamp: DateTime<Utc>,
    level: &'static str,
    action: &'static str,
    dataset: &'a str,
    year: i32,
    month: u32,
    source_uri: &'a str,
    target_path: String,
    raw_root: String,
    bytes: Option<u64>,
    duration_ms: Option<u64>,
    status: &'static str,
    reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Result of streaming one response body into the partial file
enum DownloadStatus {
    Complete,
    Absent { http_status: u16 },
    Failed { reason: FailReason, http_status: Option<u16>, error: Option<String> },
}

/// Staged fetcher over a templated archive
pub struct Fetcher {
    client: reqwest::Client,
    config: Config,
}

impl Fetcher {
    /// Create a fetcher with the standard timeouts and client identifier
    pub fn new(config: Config) -> Result<Self> {
        let timeout = Duration::from_secs(DOWNLOAD_TIMEOUT_SECS);
        Self::with_timeouts(config, timeout, timeout)
    }

    /// Timeouts bound the connection attempt and each socket read, not the
    /// whole transfer: a healthy slow download of a large partition must
    /// complete, while a stalled connection still aborts.
    fn with_timeouts(config: Config, connect: Duration, read: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect)
            .read_timeout(read)
            .user_agent(concat!("tdp-fetch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    /// Fetch an inclusive month range, one partition at a time
    ///
    /// Per-partition failures are counted and iteration continues; a
    /// storage fault during promotion aborts immediately with an error.
    pub async fn fetch_range(
        &self,
        raw_root: &Path,
        dataset: &str,
        start: Period,
        end: Period,
    ) -> Result<FetchSummary> {
        let mut summary = FetchSummary::default();

        for period in PeriodRange::inclusive(start, end) {
            let source_uri = self.config.source_uri(dataset, period.year, period.month)?;
            let paths = partition_paths(raw_root, dataset, period);
            let started = Instant::now();

            debug!(dataset, %period, %source_uri, "Fetching partition");

            let result = self.fetch_partition(&paths, &source_uri, dataset, period).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(err) => {
                    // Storage fault: log the attempt, then abort the range
                    emit_attempt(
                        raw_root,
                        dataset,
                        period,
                        &source_uri,
                        &paths,
                        "failed",
                        Some("rename_failed"),
                        None,
                        Some(duration_ms),
                        None,
                        Some(err.to_string()),
                    )?;
                    return Err(err);
                },
            };

            match &outcome {
                Outcome::Skipped { reason, http_status, bytes } => {
                    summary.skipped += 1;
                    info!(dataset, %period, reason = reason.as_str(), "Partition skipped");
                    emit_attempt(
                        raw_root,
                        dataset,
                        period,
                        &source_uri,
                        &paths,
                        "skipped",
                        Some(reason.as_str()),
                        *bytes,
                        Some(duration_ms),
                        *http_status,
                        None,
                    )?;
                },
                Outcome::Downloaded { bytes, duration_ms } => {
                    summary.downloaded += 1;
                    summary.bytes += *bytes;
                    info!(dataset, %period, bytes, "Partition downloaded");
                    emit_attempt(
                        raw_root,
                        dataset,
                        period,
                        &source_uri,
                        &paths,
                        "success",
                        None,
                        Some(*bytes),
                        Some(*duration_ms),
                        None,
                        None,
                    )?;
                },
                Outcome::Failed { reason, http_status, error } => {
                    summary.failed += 1;
                    warn!(
                        dataset,
                        %period,
                        reason = reason.as_str(),
                        error = error.as_deref().unwrap_or(""),
                        "Partition failed"
                    );
                    emit_attempt(
                        raw_root,
                        dataset,
                        period,
                        &source_uri,
                        &paths,
                        "failed",
                        Some(reason.as_str()),
                        None,
                        Some(duration_ms),
                        *http_status,
                        error.clone(),
                    )?;
                },
            }
        }

        info!(
            dataset,
            downloaded = summary.downloaded,
            skipped = summary.skipped,
            failed = summary.failed,
            total = %progress::format_bytes(summary.bytes),
            "Fetch range complete"
        );

        Ok(summary)
    }

    /// Run the per-partition state machine
    ///
    /// `Err` is reserved for faults that must abort the whole range.
    async fn fetch_partition(
        &self,
        paths: &PartitionPaths,
        source_uri: &str,
        dataset: &str,
        period: Period,
    ) -> Result<Outcome> {
        // Existence check: re-running a completed range is a no-op
        if paths.final_path.exists() {
            return Ok(Outcome::Skipped {
                reason: SkipReason::AlreadyExists,
                http_status: None,
                bytes: None,
            });
        }

        if let Some(staging_dir) = paths.partial_path.parent() {
            std::fs::create_dir_all(staging_dir)?;
        }

        let started = Instant::now();
        match self.download_to_partial(source_uri, &paths.partial_path).await {
            DownloadStatus::Complete => {},
            DownloadStatus::Absent { http_status } => {
                return Ok(Outcome::Skipped {
                    reason: SkipReason::ExpectedAbsence,
                    http_status: Some(http_status),
                    bytes: None,
                });
            },
            DownloadStatus::Failed { reason, http_status, error } => {
                return Ok(Outcome::Failed { reason, http_status, error });
            },
        }

        // Non-empty check
        let size = match std::fs::metadata(&paths.partial_path) {
            Ok(meta) if meta.len() > 0 => meta.len(),
            _ => {
                return Ok(Outcome::Failed {
                    reason: FailReason::ZeroBytes,
                    http_status: None,
                    error: None,
                });
            },
        };

        // Stage promotion: drop the .partial suffix within the staging dir
        std::fs::rename(&paths.partial_path, &paths.staged_path)
            .map_err(|e| CliError::storage_fault(&paths.partial_path, e.to_string()))?;

        // Canonical promotion, re-checking for a concurrent producer
        if paths.final_path.exists() {
            let _ = std::fs::remove_file(&paths.staged_path);
            return Ok(Outcome::Skipped {
                reason: SkipReason::AlreadyExists,
                http_status: None,
                bytes: Some(size),
            });
        }

        if let Some(parent) = paths.final_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CliError::storage_fault(parent, e.to_string()))?;
        }
        std::fs::rename(&paths.staged_path, &paths.final_path)
            .map_err(|e| CliError::storage_fault(&paths.staged_path, e.to_string()))?;

        sidecar::write_sidecar(
            &paths.final_path,
            source_uri,
            dataset,
            period.year,
            period.month,
            size,
        )
        .map_err(|e| CliError::storage_fault(&paths.final_path, e.to_string()))?;

        Ok(Outcome::Downloaded {
            bytes: size,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Stream one GET response into the partial file in fixed chunks
    async fn download_to_partial(&self, source_uri: &str, partial: &Path) -> DownloadStatus {
        let response = match self.client.get(source_uri).send().await {
            Ok(response) => response,
            Err(e) => {
                return DownloadStatus::Failed {
                    reason: FailReason::NetworkError,
                    http_status: None,
                    error: Some(e.to_string()),
                };
            },
        };

        let status = response.status();
        if matches!(status.as_u16(), 404 | 403 | 410) {
            return DownloadStatus::Absent {
                http_status: status.as_u16(),
            };
        }
        if !status.is_success() {
            return DownloadStatus::Failed {
                reason: FailReason::ServerError,
                http_status: Some(status.as_u16()),
                error: None,
            };
        }

        let total_size = response.content_length().unwrap_or(0);
        let pb = progress::create_download_progress(total_size, source_uri);

        let mut file = match std::fs::File::create(partial) {
            Ok(file) => file,
            Err(e) => {
                pb.abandon();
                return DownloadStatus::Failed {
                    reason: FailReason::NetworkError,
                    http_status: None,
                    error: Some(e.to_string()),
                };
            },
        };

        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    pb.abandon();
                    return DownloadStatus::Failed {
                        reason: FailReason::NetworkError,
                        http_status: None,
                        error: Some(e.to_string()),
                    };
                },
            };
            if let Err(e) = file.write_all(&chunk) {
                pb.abandon();
                return DownloadStatus::Failed {
                    reason: FailReason::NetworkError,
                    http_status: None,
                    error: Some(e.to_string()),
                };
            }
            downloaded += chunk.len() as u64;
            pb.set_position(downloaded);
        }

        pb.finish_and_clear();
        DownloadStatus::Complete
    }
}

/// Serialize one attempt record to a single stdout line
#[allow(clippy::too_many_arguments)]
fn emit_attempt(
    raw_root: &Path,
    dataset: &str,
    period: Period,
    source_uri: &str,
    paths: &PartitionPaths,
    status: &'static str,
    reason: Option<&'static str>,
    bytes: Option<u64>,
    duration_ms: Option<u64>,
    http_status: Option<u16>,
    error: Option<String>,
) -> Result<()> {
    let record = AttemptRecord {
        timestamp: Utc::now(),
        level: "INFO",
        action: "fetch",
        dataset,
        year: period.year,
        month: period.month,
        source_uri,
        target_path: paths.final_path.display().to_string(),
        raw_root: raw_root.display().to_string(),
        bytes,
        duration_ms,
        status,
        reason,
        http_status,
        error,
    };
    println!("{}", serde_json::to_string(&record)?);
    Ok(())
}
