pub mod codec;
pub mod migration_store;
pub mod migrations;
pub mod runner;
pub mod summary_store;

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use summio_common::{Error, Result};

pub use migration_store::{MigrationRecord, MigrationStore};
pub use migrations::{MigrationScript, MigrationSet};
pub use runner::{MigrationReport, MigrationRunner, MigrationStatus, migrate};
pub use summary_store::{NewSummary, PdfSummary, SummaryStore};

/// Open (creating if needed) the database file with the pragmas every
/// connection in this crate expects.
pub fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .map_err(|e| Error::Database(format!("failed to open database: {e}")))?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

    Ok(conn)
}

/// Parse a stored timestamp. Text that is neither RFC 3339 nor SQLite's
/// `datetime('now')` form is corruption.
pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    // SQLite datetime('now') produces "YYYY-MM-DD HH:MM:SS"
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::Corruption(format!("invalid timestamp {s:?}: {e}")))
}
