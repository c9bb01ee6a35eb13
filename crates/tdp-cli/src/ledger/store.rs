//! Ledger store handle and operations
//!
//! One `LedgerStore` wraps one SQLite connection. Every mutating call
//! commits before returning; rusqlite autocommits each statement, and the
//! WAL journal gives atomic commit boundaries across concurrent
//! invocations.

use crate::error::Result;
use crate::ledger::schema;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

/// Terminal status of an ingestion run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failure,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Failure => "failure",
        }
    }
}

/// Per-run file counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub detected: u64,
    pub ingested: u64,
    pub skipped: u64,
}

/// Stored registry facts consulted during ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub raw_path: String,
    pub checksum_sha256: String,
}

/// A new registry row, inserted once per distinct relative path
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub raw_path: String,
    pub file_name: String,
    pub checksum_sha256: String,
    pub file_size_bytes: u64,
    pub bytes_hashed: u64,
    pub checksum_duration_ms: u64,
    pub source_uri: Option<String>,
    pub first_seen_at: DateTime<Utc>,
    pub first_ingestion_run_id: String,
}

/// Handle to the ingestion ledger
pub struct LedgerStore {
    conn: Connection,
}

impl LedgerStore {
    /// Open (or create) the ledger at `db_path`
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(std::time::Duration::from_secs(30))?;

        schema::init_schema(&conn)?;
        debug!(db_path = %db_path.display(), "Ledger opened");

        Ok(Self { conn })
    }

    /// Open an in-memory ledger (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Insert the placeholder row for a starting run
    ///
    /// The provisional status is `failure`: a crashed run is observably
    /// failed rather than missing or silently successful.
    pub fn insert_run_start(&self, run_id: &str, start_time: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO ingestion_runs
                (run_id, start_time, status, files_detected, files_ingested, files_skipped)
            VALUES (?1, ?2, 'failure', 0, 0, 0)
            "#,
            params![run_id, format_time(start_time)],
        )?;
        Ok(())
    }

    /// Finalize exactly one run row with its terminal status and counts
    pub fn update_run_end(
        &self,
        run_id: &str,
        end_time: DateTime<Utc>,
        status: RunStatus,
        counts: RunCounts,
        error_message: Option<&str>,
        error_trace: Option<&str>,
    ) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE ingestion_runs
            SET end_time = ?1, status = ?2, files_detected = ?3,
                files_ingested = ?4, files_skipped = ?5,
                error_message = ?6, error_trace = ?7
            WHERE run_id = ?8
            "#,
            params![
                format_time(end_time),
                status.as_str(),
                counts.detected,
                counts.ingested,
                counts.skipped,
                error_message,
                error_trace,
                run_id,
            ],
        )?;
        Ok(())
    }

    /// Insert a new file registry row
    ///
    /// Fails with a constraint violation if the relative path is already
    /// registered; callers are expected to check first, the constraint is
    /// the correctness backstop.
    pub fn insert_file_registry(&self, record: &NewFileRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO file_registry (
                raw_path, file_name, checksum_sha256, file_size_bytes,
                bytes_hashed, checksum_duration_ms, source_uri,
                first_seen_at, first_ingestion_run_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.raw_path,
                record.file_name,
                record.checksum_sha256,
                record.file_size_bytes,
                record.bytes_hashed,
                record.checksum_duration_ms,
                record.source_uri,
                format_time(record.first_seen_at),
                record.first_ingestion_run_id,
            ],
        )?;
        Ok(())
    }

    /// Point lookup by relative path
    pub fn get_registry_entry(&self, raw_path: &str) -> Result<Option<RegistryEntry>> {
        let entry = self
            .conn
            .query_row(
                "SELECT raw_path, checksum_sha256 FROM file_registry WHERE raw_path = ?1",
                params![raw_path],
                |row| {
                    Ok(RegistryEntry {
                        raw_path: row.get(0)?,
                        checksum_sha256: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    /// Fetch the finalized run row for summary display
    pub fn get_run(&self, run_id: &str) -> Result<Option<RunRow>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT run_id, start_time, end_time, status,
                       files_detected, files_ingested, files_skipped
                FROM ingestion_runs WHERE run_id = ?1
                "#,
                params![run_id],
                |row| {
                    Ok(RunRow {
                        run_id: row.get(0)?,
                        start_time: row.get(1)?,
                        end_time: row.get(2)?,
                        status: row.get(3)?,
                        files_detected: row.get(4)?,
                        files_ingested: row.get(5)?,
                        files_skipped: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }
}

/// One row of `ingestion_runs`, as stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRow {
    pub run_id: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub status: String,
    pub files_detected: u64,
    pub files_ingested: u64,
    pub files_skipped: u64,
}

/// Generate a unique, time-sortable run identifier
pub fn generate_run_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", timestamp, &suffix[..8])
}

fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}
