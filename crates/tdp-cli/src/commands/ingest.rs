//! `tdp ingest` command implementation
//!
//! Runs discovery plus either a dry-run preview or a real ledger run.

use crate::error::Result;
use crate::ingest::{self, IngestOptions, RunSummary};
use std::path::PathBuf;

/// Run the ingestion stage
pub async fn run(dry_run: bool, raw_root: String, db_path: String) -> Result<RunSummary> {
    let options = IngestOptions {
        dry_run,
        raw_root: PathBuf::from(raw_root),
        db_path: PathBuf::from(db_path),
    };
    ingest::run(&options)
}
