// Storage module: report persistence behind a backend trait.

mod sqlite;

use crate::config::StorageConfig;
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;

pub use sqlite::SqliteStorage;

/// One persisted report row. `risks` and `findings` are reconstructed from
/// their stored encoding on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRecord {
    pub id: i64,
    pub summary: String,
    pub risks: Vec<String>,
    pub findings: Vec<String>,
    pub recommendation: String,
    pub risk_score: i64,
    pub confidence: i64,
    pub created_at: String,
}

/// Report persistence. Rows are append-only: the application never updates
/// or deletes them, and `risk_score` is always the scorer's output for the
/// `risks` list at write time.
pub trait StorageBackend: Send + Sync {
    /// Idempotently creates the backing table; safe on every process start.
    fn ensure_initialized(&self) -> Result<()>;

    /// Appends one row, capturing the local-clock timestamp at call time.
    /// Returns the assigned id. I/O failures propagate to the caller.
    #[allow(clippy::too_many_arguments)]
    fn save_report(
        &self,
        summary: &str,
        risks: &[String],
        findings: &[String],
        recommendation: &str,
        risk_score: i64,
        confidence: i64,
    ) -> Result<i64>;

    /// All rows, newest first (descending id). No pagination, no filtering.
    fn fetch_reports(&self) -> Result<Vec<ReportRecord>>;

    /// A single row by id, used by the PDF export route.
    fn fetch_report(&self, id: i64) -> Result<Option<ReportRecord>>;
}

pub fn build_storage(config: &StorageConfig) -> Arc<dyn StorageBackend> {
    Arc::new(SqliteStorage::new(config.db_path.clone()))
}
