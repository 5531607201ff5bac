//! Append-only audit trail of import runs.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::fmt;

/// Maximum stored length of the joined error message.
pub const MAX_ERROR_MESSAGE: usize = 1000;

/// Outcome of an import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    Completed,
    CompletedWithErrors,
    Failed,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Completed => "completed",
            ImportStatus::CompletedWithErrors => "completed_with_errors",
            ImportStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One audit row.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRecord {
    pub import_type: String,
    pub source_file: String,
    pub records_processed: i64,
    pub status: ImportStatus,
    pub error_message: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl ImportRecord {
    /// Build a record, deriving the status from the error list.
    pub fn new(import_type: &str, source_file: &str, records_processed: i64, errors: &[String]) -> Self {
        let status = if errors.is_empty() {
            ImportStatus::Completed
        } else {
            ImportStatus::CompletedWithErrors
        };
        ImportRecord {
            import_type: import_type.to_string(),
            source_file: source_file.to_string(),
            records_processed,
            status,
            error_message: join_errors(errors),
            completed_at: Utc::now(),
        }
    }

    /// Build the record of a run that aborted.
    pub fn failed(import_type: &str, source_file: &str, records_processed: i64, error: &str) -> Self {
        ImportRecord {
            status: ImportStatus::Failed,
            ..Self::new(import_type, source_file, records_processed, &[error.to_string()])
        }
    }
}

fn join_errors(errors: &[String]) -> Option<String> {
    if errors.is_empty() {
        return None;
    }
    Some(errors.join("; ").chars().take(MAX_ERROR_MESSAGE).collect())
}

/// Append an audit row.
pub fn record(conn: &Connection, entry: &ImportRecord) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO import_log
             (import_type, source_file, records_processed, status, error_message, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.import_type,
            entry.source_file,
            entry.records_processed,
            entry.status.as_str(),
            entry.error_message,
            entry.completed_at
        ],
    )?;
    Ok(())
}

/// Most recent audit rows, newest first.
pub fn recent(conn: &Connection, limit: i64) -> rusqlite::Result<Vec<(String, String, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT import_type, status, records_processed FROM import_log ORDER BY id DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map([limit], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;

    #[test]
    fn test_status_from_errors() {
        let ok = ImportRecord::new("variants", "a.tsv", 10, &[]);
        assert_eq!(ok.status, ImportStatus::Completed);
        assert_eq!(ok.error_message, None);

        let errors = vec!["row 2: bad".to_string(), "row 5: bad".to_string()];
        let partial = ImportRecord::new("variants", "a.tsv", 10, &errors);
        assert_eq!(partial.status, ImportStatus::CompletedWithErrors);
        assert_eq!(partial.error_message.as_deref(), Some("row 2: bad; row 5: bad"));

        let failed = ImportRecord::failed("genes", "g.gtf", 0, "no such file");
        assert_eq!(failed.status.to_string(), "failed");
    }

    #[test]
    fn test_error_message_truncated() {
        let errors = vec!["x".repeat(800), "y".repeat(800)];
        let entry = ImportRecord::new("variants", "a.tsv", 2, &errors);
        assert_eq!(entry.error_message.unwrap().chars().count(), MAX_ERROR_MESSAGE);
    }

    #[test]
    fn test_record_appends() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();
        record(&conn, &ImportRecord::new("genes", "g.gtf", 3, &[])).unwrap();
        record(&conn, &ImportRecord::failed("variants", "v.tsv", 0, "boom")).unwrap();

        let rows = recent(&conn, 10).unwrap();
        assert_eq!(
            rows,
            vec![
                ("variants".to_string(), "failed".to_string(), 0),
                ("genes".to_string(), "completed".to_string(), 3),
            ]
        );
    }
}
