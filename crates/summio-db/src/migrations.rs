use summio_common::{Error, Result};

/// A single schema change, identified by the version prefix of its filename.
///
/// Scripts are plain SQL batches named `NNNN_description.sql`. The version is
/// everything before the first underscore and is compared lexically, so it
/// must be zero-padded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationScript {
    pub version: String,
    pub name: String,
    pub sql: String,
}

impl MigrationScript {
    /// Build a script from its filename, deriving the version from the prefix.
    pub fn from_file(name: &str, sql: &str) -> Result<Self> {
        let version = version_from_filename(name)?;
        Ok(Self {
            version: version.to_string(),
            name: name.to_string(),
            sql: sql.to_string(),
        })
    }
}

/// Migrations shipped inside the binary, in no particular order.
const EMBEDDED: &[(&str, &str)] = &[
    (
        "0001_create_migration_meta.sql",
        include_str!("../migrations/0001_create_migration_meta.sql"),
    ),
    (
        "0002_create_pdf_summary.sql",
        include_str!("../migrations/0002_create_pdf_summary.sql"),
    ),
    (
        "0003_index_pdf_summary.sql",
        include_str!("../migrations/0003_index_pdf_summary.sql"),
    ),
];

/// An ordered, duplicate-free set of migration scripts.
///
/// Constructed once and handed to the runner; it never changes afterwards.
#[derive(Debug, Clone, Default)]
pub struct MigrationSet {
    scripts: Vec<MigrationScript>,
}

impl MigrationSet {
    /// The scripts compiled into this crate.
    pub fn embedded() -> Result<Self> {
        Self::from_files(EMBEDDED.iter().copied())
    }

    /// Build a set from `(filename, sql)` pairs.
    ///
    /// Scripts are sorted by version. Two files sharing a version prefix are
    /// rejected rather than letting one of them win silently.
    pub fn from_files<'a, I>(files: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut scripts = files
            .into_iter()
            .map(|(name, sql)| MigrationScript::from_file(name, sql))
            .collect::<Result<Vec<_>>>()?;

        scripts.sort_by(|a, b| a.version.cmp(&b.version).then_with(|| a.name.cmp(&b.name)));

        if let Some(pair) = scripts.windows(2).find(|w| w[0].version == w[1].version) {
            return Err(Error::Migration(format!(
                "duplicate migration version {}: {} and {}",
                pair[0].version, pair[0].name, pair[1].name
            )));
        }

        Ok(Self { scripts })
    }

    pub fn scripts(&self) -> &[MigrationScript] {
        &self.scripts
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    pub fn latest_version(&self) -> Option<&str> {
        self.scripts.last().map(|s| s.version.as_str())
    }
}

/// Extract the version prefix (text before the first `_`) from a script name.
pub fn version_from_filename(name: &str) -> Result<&str> {
    match name.split_once('_') {
        Some((version, _)) if !version.is_empty() => Ok(version),
        _ => Err(Error::Migration(format!(
            "migration file {name:?} must be named <version>_<description>.sql"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_prefix_before_first_underscore() {
        assert_eq!(
            version_from_filename("0002_create_pdf_summary.sql").unwrap(),
            "0002"
        );
        assert_eq!(version_from_filename("0010_a_b_c.sql").unwrap(), "0010");
    }

    #[test]
    fn malformed_names_are_rejected() {
        assert!(version_from_filename("init.sql").is_err());
        assert!(version_from_filename("_init.sql").is_err());
    }

    #[test]
    fn scripts_sort_lexically_by_version() {
        let set = MigrationSet::from_files([
            ("0010_third.sql", "SELECT 3;"),
            ("0001_first.sql", "SELECT 1;"),
            ("0002_second.sql", "SELECT 2;"),
        ])
        .unwrap();

        let versions: Vec<_> = set.scripts().iter().map(|s| s.version.as_str()).collect();
        assert_eq!(versions, ["0001", "0002", "0010"]);
        assert_eq!(set.latest_version(), Some("0010"));
    }

    #[test]
    fn duplicate_versions_are_rejected() {
        let err = MigrationSet::from_files([
            ("0001_first.sql", "SELECT 1;"),
            ("0001_again.sql", "SELECT 1;"),
        ])
        .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("duplicate migration version 0001"), "{msg}");
        assert!(msg.contains("0001_again.sql"));
        assert!(msg.contains("0001_first.sql"));
    }

    #[test]
    fn embedded_set_starts_with_metadata_table() {
        let set = MigrationSet::embedded().unwrap();
        assert!(!set.is_empty());
        let first = &set.scripts()[0];
        assert_eq!(first.version, "0001");
        assert!(first.sql.contains("migration_meta"));
    }
}
