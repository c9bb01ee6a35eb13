//! SQLite schema for the ingestion ledger

use crate::error::Result;
use rusqlite::Connection;

/// Initialize the ledger schema
///
/// Idempotent: safe to invoke against an existing store.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS ingestion_runs (
            run_id TEXT PRIMARY KEY,
            start_time TEXT NOT NULL,
            end_time TEXT,
            status TEXT NOT NULL,
            files_detected INTEGER NOT NULL,
            files_ingested INTEGER NOT NULL,
            files_skipped INTEGER NOT NULL,
            error_message TEXT,
            error_trace TEXT
        )
        "#,
        [],
    )?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS file_registry (
            raw_path TEXT PRIMARY KEY,
            file_name TEXT NOT NULL,
            checksum_sha256 TEXT NOT NULL,
            file_size_bytes INTEGER NOT NULL,
            bytes_hashed INTEGER NOT NULL,
            checksum_duration_ms INTEGER,
            source_uri TEXT,
            first_seen_at TEXT NOT NULL,
            first_ingestion_run_id TEXT NOT NULL,

            -- A mismatch means the file changed between stat and hash,
            -- or a corrupted hash pass
            CONSTRAINT bytes_match CHECK (bytes_hashed = file_size_bytes),
            FOREIGN KEY (first_ingestion_run_id) REFERENCES ingestion_runs(run_id)
        )
        "#,
        [],
    )?;

    // Indexes for audit queries
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_registry_checksum ON file_registry(checksum_sha256)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_registry_file_name ON file_registry(file_name)",
        [],
    )?;

    Ok(())
}
