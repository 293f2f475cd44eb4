use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use summio_common::{Error, Result};
use tracing::info;

use crate::codec::{decode_summaries, encode_summaries};
use crate::migrations::MigrationSet;
use crate::runner::migrate;
use crate::{open_connection, parse_datetime};

const SELECT_COLUMNS: &str =
    "SELECT id, file, summary, title, intermediate_summary, created_at FROM pdf_summary";

/// Persistent storage for PDF summaries.
pub struct SummaryStore {
    conn: Mutex<Connection>,
}

/// A persisted summary of one uploaded PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfSummary {
    pub id: i64,
    pub file: String,
    pub summary: String,
    pub title: String,
    pub intermediate_summary: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller when storing a new summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSummary {
    pub file: String,
    pub summary: String,
    pub title: String,
    pub intermediate_summary: Vec<String>,
}

/// Row as stored, before the list column is decoded.
struct RawSummary {
    id: i64,
    file: String,
    summary: String,
    title: String,
    intermediate_summary: String,
    created_at: String,
}

impl RawSummary {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            file: row.get(1)?,
            summary: row.get(2)?,
            title: row.get(3)?,
            intermediate_summary: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn decode(self) -> Result<PdfSummary> {
        let created_at = parse_datetime(&self.created_at)
            .map_err(|e| Error::Corruption(format!("summary {}: {e}", self.id)))?;
        let intermediate_summary = decode_summaries(&self.intermediate_summary).map_err(|e| {
            Error::Corruption(format!("summary {}: {e}", self.id))
        })?;
        Ok(PdfSummary {
            id: self.id,
            file: self.file,
            summary: self.summary,
            title: self.title,
            intermediate_summary,
            created_at,
        })
    }
}

impl SummaryStore {
    /// Open the database at `db_path`, bring it up to date with `migrations`
    /// and wrap it.
    pub fn open(db_path: &Path, migrations: &MigrationSet) -> Result<Self> {
        info!("opening summary store at {}", db_path.display());
        let conn = open_connection(db_path)?;
        migrate(&conn, migrations)?;
        Ok(Self::from_connection(conn))
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("failed to open in-memory database: {e}")))?;
        migrate(&conn, &MigrationSet::embedded()?)?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap a connection whose schema is already current.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Database("summary store lock poisoned".into()))
    }

    pub fn insert(&self, summary: &NewSummary) -> Result<i64> {
        let intermediate = encode_summaries(&summary.intermediate_summary)?;
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO pdf_summary (file, summary, title, intermediate_summary)
             VALUES (?1, ?2, ?3, ?4)",
            params![summary.file, summary.summary, summary.title, intermediate],
        )
        .map_err(|e| Error::Database(format!("could not insert pdf summary: {e}")))?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get(&self, id: i64) -> Result<Option<PdfSummary>> {
        let conn = self.connection()?;
        let raw = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                RawSummary::from_row,
            )
            .optional()
            .map_err(|e| Error::Database(format!("could not get pdf summary: {e}")))?;

        raw.map(RawSummary::decode).transpose()
    }

    /// Newest first. `None` means no limit.
    pub fn list(&self, limit: Option<usize>, offset: usize) -> Result<Vec<PdfSummary>> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare(&format!(
                "{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2"
            ))
            .map_err(|e| Error::Database(format!("failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map(params![sql_limit(limit), offset as i64], RawSummary::from_row)
            .map_err(|e| Error::Database(format!("failed to query pdf summaries: {e}")))?;

        collect_rows(rows)
    }

    /// Case-insensitive substring search over title and summary text.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<PdfSummary>> {
        let pattern = format!("%{}%", escape_like(query));
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare(&format!(
                "{SELECT_COLUMNS}
                 WHERE title LIKE ?1 ESCAPE '\\' OR summary LIKE ?1 ESCAPE '\\'
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2"
            ))
            .map_err(|e| Error::Database(format!("failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map(params![pattern, sql_limit(limit)], RawSummary::from_row)
            .map_err(|e| Error::Database(format!("failed to search pdf summaries: {e}")))?;

        collect_rows(rows)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.connection()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM pdf_summary", [], |row| row.get(0))
            .map_err(|e| Error::Database(format!("failed to count pdf summaries: {e}")))?;
        Ok(count as usize)
    }
}

fn collect_rows<F>(rows: rusqlite::MappedRows<'_, F>) -> Result<Vec<PdfSummary>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<RawSummary>,
{
    let mut summaries = Vec::new();
    for row in rows {
        let raw = row.map_err(|e| Error::Database(format!("failed to read summary row: {e}")))?;
        summaries.push(raw.decode()?);
    }
    Ok(summaries)
}

/// SQLite treats a negative LIMIT as unbounded.
fn sql_limit(limit: Option<usize>) -> i64 {
    limit.map_or(-1, |n| n as i64)
}

fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
