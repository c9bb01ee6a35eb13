//! Durable ingestion ledger
//!
//! SQLite-backed registry of previously-ingested files plus per-run
//! records. WAL journaling with atomic commit boundaries makes concurrent
//! invocations against the same store safe.

pub mod schema;
pub mod store;

pub use store::{LedgerStore, NewFileRecord, RegistryEntry, RunCounts, RunRow, RunStatus};
