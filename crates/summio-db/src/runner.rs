use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use summio_common::{Error, Result};
use tracing::info;

use crate::migration_store::{MigrationRecord, MigrationStore};
use crate::migrations::MigrationSet;

/// Outcome of a migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

/// A script paired with when (if ever) it was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub version: String,
    pub name: String,
    pub applied_at: Option<DateTime<Utc>>,
}

/// Applies every unapplied script of a [`MigrationSet`], in version order.
///
/// Meant to run once at startup, before anything else touches the database.
/// It is not safe to run two runners against the same file concurrently.
pub struct MigrationRunner<'a> {
    store: MigrationStore<'a>,
    set: &'a MigrationSet,
}

impl<'a> MigrationRunner<'a> {
    pub fn new(conn: &'a Connection, set: &'a MigrationSet) -> Self {
        Self {
            store: MigrationStore::new(conn),
            set,
        }
    }

    pub fn run(&self) -> Result<MigrationReport> {
        let mut report = MigrationReport::default();

        if self.store.table_exists()? {
            self.check_applied_prefix(&self.store.applied()?)?;
        }

        for script in self.set.scripts() {
            // Until the metadata table exists there is nothing to consult;
            // the bootstrap script creates it.
            if self.store.table_exists()? && self.store.is_applied(&script.version)? {
                info!("migration {} already applied", script.version);
                report.skipped.push(script.version.clone());
                continue;
            }

            info!("applying migration {} ({})", script.version, script.name);
            self.store.apply(&script.version, &script.sql)?;
            report.applied.push(script.version.clone());
        }

        if !report.applied.is_empty() {
            info!(
                "applied {} migration(s), schema now at {}",
                report.applied.len(),
                self.set.latest_version().unwrap_or("none")
            );
        }

        Ok(report)
    }

    /// Applied versions must be exactly the first `n` scripts of the set.
    /// Anything else means a gap that would apply out of order, or a schema
    /// newer than this binary.
    fn check_applied_prefix(&self, applied: &[MigrationRecord]) -> Result<()> {
        let scripts = self.set.scripts();

        for (i, record) in applied.iter().enumerate() {
            match scripts.get(i) {
                Some(script) if script.version == record.version => {}
                Some(script) if scripts.iter().any(|s| s.version == record.version) => {
                    return Err(Error::Migration(format!(
                        "migration {} is pending but later version {} is already applied",
                        script.version, record.version
                    )));
                }
                _ => {
                    return Err(Error::Migration(format!(
                        "database has migration {} which this build does not know",
                        record.version
                    )));
                }
            }
        }

        Ok(())
    }

    /// Every known script with its applied timestamp, pending ones as `None`.
    pub fn status(&self) -> Result<Vec<MigrationStatus>> {
        let applied = self.store.applied()?;

        Ok(self
            .set
            .scripts()
            .iter()
            .map(|script| MigrationStatus {
                version: script.version.clone(),
                name: script.name.clone(),
                applied_at: applied
                    .iter()
                    .find(|r| r.version == script.version)
                    .map(|r| r.applied_at),
            })
            .collect())
    }
}

/// Bring `conn` up to date with `set`.
pub fn migrate(conn: &Connection, set: &MigrationSet) -> Result<MigrationReport> {
    MigrationRunner::new(conn, set).run()
}
