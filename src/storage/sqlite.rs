// SQLite storage implementation for the single report table.
use crate::storage::{ReportRecord, StorageBackend};
use anyhow::Result;
use chrono::Local;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct SqliteStorage {
    db_path: PathBuf,
    initialized: AtomicBool,
    init_guard: Mutex<()>,
}

impl SqliteStorage {
    pub fn new(db_path: String) -> Self {
        let path = if db_path.trim().is_empty() {
            PathBuf::from("./data/synapse.db")
        } else {
            PathBuf::from(db_path)
        };
        Self {
            db_path: path,
            initialized: AtomicBool::new(false),
            init_guard: Mutex::new(()),
        }
    }

    fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn open(&self) -> Result<Connection> {
        self.ensure_db_dir()?;
        let conn = Connection::open(&self.db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();
        Ok(conn)
    }

    fn now_local() -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Lists are stored as JSON arrays. Earlier data generations joined
    /// elements with bare commas, so reads fall back to comma-splitting
    /// when the text is not valid JSON.
    fn parse_string_list(raw: &str) -> Vec<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        if let Ok(items) = serde_json::from_str::<Vec<String>>(trimmed) {
            return items;
        }
        trimmed
            .split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }

    fn string_list_to_json(list: &[String]) -> String {
        serde_json::to_string(list).unwrap_or_else(|_| "[]".to_string())
    }

    fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ReportRecord> {
        let risks: String = row.get(2)?;
        let findings: String = row.get(3)?;
        Ok(ReportRecord {
            id: row.get(0)?,
            summary: row.get(1)?,
            risks: Self::parse_string_list(&risks),
            findings: Self::parse_string_list(&findings),
            recommendation: row.get(4)?,
            risk_score: row.get(5)?,
            confidence: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

const SELECT_COLUMNS: &str =
    "id, summary, risks, findings, recommendation, risk_score, confidence, created_at";

impl StorageBackend for SqliteStorage {
    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized.load(Ordering::SeqCst) {
            return Ok(());
        }
        let _guard = self.init_guard.lock();
        if self.initialized.load(Ordering::SeqCst) {
            return Ok(());
        }
        let conn = self.open()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              summary TEXT,
              risks TEXT,
              findings TEXT,
              recommendation TEXT,
              risk_score INTEGER,
              confidence INTEGER,
              created_at TEXT
            );
            "#,
        )?;
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn save_report(
        &self,
        summary: &str,
        risks: &[String],
        findings: &[String],
        recommendation: &str,
        risk_score: i64,
        confidence: i64,
    ) -> Result<i64> {
        self.ensure_initialized()?;
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO reports \
             (summary, risks, findings, recommendation, risk_score, confidence, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                summary,
                Self::string_list_to_json(risks),
                Self::string_list_to_json(findings),
                recommendation,
                risk_score,
                confidence,
                Self::now_local(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn fetch_reports(&self) -> Result<Vec<ReportRecord>> {
        self.ensure_initialized()?;
        let conn = self.open()?;
        let mut statement = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM reports ORDER BY id DESC"
        ))?;
        let rows = statement.query_map([], Self::record_from_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn fetch_report(&self, id: i64) -> Result<Option<ReportRecord>> {
        self.ensure_initialized()?;
        let conn = self.open()?;
        let record = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM reports WHERE id = ?"),
                params![id],
                Self::record_from_row,
            )
            .optional()?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage() -> (tempfile::TempDir, SqliteStorage) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db_path = dir.path().join("reports.db");
        let storage = SqliteStorage::new(db_path.to_string_lossy().to_string());
        storage.ensure_initialized().expect("initialize storage");
        (dir, storage)
    }

    #[test]
    fn initialization_is_idempotent() {
        let (_dir, storage) = temp_storage();
        storage.ensure_initialized().expect("second init");
        let fresh = SqliteStorage::new(storage.db_path.to_string_lossy().to_string());
        fresh.ensure_initialized().expect("init over existing table");
    }

    #[test]
    fn saved_rows_come_back_newest_first_with_fields_intact() {
        let (_dir, storage) = temp_storage();
        let first = storage
            .save_report("first", &["r1".to_string()], &["f1".to_string()], "rec1", 20, 90)
            .expect("save first");
        let second = storage
            .save_report("second", &["r2".to_string()], &["f2".to_string()], "rec2", 35, 91)
            .expect("save second");
        assert!(second > first);

        let records = storage.fetch_reports().expect("fetch");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, second);
        assert_eq!(records[0].summary, "second");
        assert_eq!(records[0].risks, vec!["r2".to_string()]);
        assert_eq!(records[0].findings, vec!["f2".to_string()]);
        assert_eq!(records[0].recommendation, "rec2");
        assert_eq!(records[0].risk_score, 35);
        assert_eq!(records[0].confidence, 91);
        assert!(!records[0].created_at.is_empty());
        assert_eq!(records[1].id, first);
    }

    #[test]
    fn list_elements_containing_commas_round_trip() {
        let (_dir, storage) = temp_storage();
        let risks = vec!["supply chain, vendor side".to_string(), "other".to_string()];
        let findings = vec!["margin up, churn down".to_string()];
        let id = storage
            .save_report("s", &risks, &findings, "rec", 40, 88)
            .expect("save");
        let record = storage.fetch_report(id).expect("fetch").expect("exists");
        assert_eq!(record.risks, risks);
        assert_eq!(record.findings, findings);
    }

    #[test]
    fn legacy_comma_joined_rows_still_parse() {
        let (_dir, storage) = temp_storage();
        let conn = storage.open().expect("open");
        conn.execute(
            "INSERT INTO reports \
             (summary, risks, findings, recommendation, risk_score, confidence, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params!["legacy", "a,b", "x, y", "rec", 40, 90, "2024-01-01 00:00:00"],
        )
        .expect("raw insert");
        let records = storage.fetch_reports().expect("fetch");
        assert_eq!(records[0].risks, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(records[0].findings, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn fetch_report_misses_cleanly() {
        let (_dir, storage) = temp_storage();
        assert!(storage.fetch_report(42).expect("fetch").is_none());
    }
}
