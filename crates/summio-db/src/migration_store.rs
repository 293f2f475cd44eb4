use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use summio_common::{Error, Result};

use crate::parse_datetime;

/// Name of the bookkeeping table. The first embedded migration creates it.
pub const META_TABLE: &str = "migration_meta";

/// A schema version that has been applied to this database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub version: String,
    pub applied_at: DateTime<Utc>,
}

/// Tracks applied schema versions in the `migration_meta` table.
pub struct MigrationStore<'c> {
    conn: &'c Connection,
}

impl<'c> MigrationStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Whether the metadata table exists yet. `false` means a fresh database.
    pub fn table_exists(&self) -> Result<bool> {
        self.conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1",
                params![META_TABLE],
                |_| Ok(()),
            )
            .optional()
            .map(|row| row.is_some())
            .map_err(|e| Error::Database(format!("failed to probe {META_TABLE}: {e}")))
    }

    pub fn is_applied(&self, version: &str) -> Result<bool> {
        self.conn
            .query_row(
                "SELECT 1 FROM migration_meta WHERE version = ?1",
                params![version],
                |_| Ok(()),
            )
            .optional()
            .map(|row| row.is_some())
            .map_err(|e| {
                Error::Database(format!("failed to check migration {version}: {e}"))
            })
    }

    /// Run `sql` and record `version` as applied, atomically.
    ///
    /// The script and the bookkeeping insert share one transaction, so a
    /// failure in either leaves neither behind.
    pub fn apply(&self, version: &str, sql: &str) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| Error::Migration(format!("failed to begin migration {version}: {e}")))?;

        tx.execute_batch(sql)
            .map_err(|e| Error::Migration(format!("could not execute migration {version}: {e}")))?;

        let applied_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        tx.execute(
            "INSERT INTO migration_meta (version, applied_at) VALUES (?1, ?2)",
            params![version, applied_at],
        )
        .map_err(|e| Error::Migration(format!("could not record migration {version}: {e}")))?;

        tx.commit()
            .map_err(|e| Error::Migration(format!("failed to commit migration {version}: {e}")))
    }

    /// All applied versions, ascending.
    pub fn applied(&self) -> Result<Vec<MigrationRecord>> {
        if !self.table_exists()? {
            return Ok(Vec::new());
        }

        let mut stmt = self
            .conn
            .prepare("SELECT version, applied_at FROM migration_meta ORDER BY version ASC")
            .map_err(|e| Error::Database(format!("failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|e| Error::Database(format!("failed to query migrations: {e}")))?;

        let mut records = Vec::new();
        for row in rows {
            let (version, applied_at) =
                row.map_err(|e| Error::Database(format!("failed to read migration row: {e}")))?;
            let applied_at = parse_datetime(&applied_at)
                .map_err(|e| Error::Corruption(format!("migration {version}: {e}")))?;
            records.push(MigrationRecord {
                version,
                applied_at,
            });
        }
        Ok(records)
    }
}
