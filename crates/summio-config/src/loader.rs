use std::path::{Path, PathBuf};
use std::str::FromStr;

use summio_common::{Error, Result};
use tracing::info;

use crate::model::AppConfig;

/// Builds an [`AppConfig`] from an optional config file plus environment
/// overrides. Environment values always win over the file.
pub struct ConfigLoader {
    path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<AppConfig> {
        self.load_with(|key| std::env::var(key).ok())
    }

    /// Like [`load`](Self::load) but reads variables through `lookup`.
    pub fn load_with<F>(&self, lookup: F) -> Result<AppConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match &self.path {
            Some(path) => {
                let config = read_config_file(path)?;
                info!("loaded config from {}", path.display());
                config
            }
            None => AppConfig::default(),
        };

        apply_env(&mut config, &lookup)?;
        config.validate()?;
        Ok(config)
    }
}

fn read_config_file(path: &Path) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "yml" | "yaml" => serde_yaml::from_str(&contents)
            .map_err(|e| Error::Config(format!("YAML parse error: {e}"))),
        "toml" => {
            toml::from_str(&contents).map_err(|e| Error::Config(format!("TOML parse error: {e}")))
        }
        other => Err(Error::Config(format!(
            "unsupported config extension: {other}"
        ))),
    }
}

fn apply_env<F>(config: &mut AppConfig, lookup: &F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = var("DB_PATH") {
        config.storage.db_path = PathBuf::from(v);
    }
    if let Some(v) = var("FILES_PATH") {
        config.storage.files_dir = PathBuf::from(v);
    }
    if let Some(v) = var("FRONTEND_PATH") {
        config.storage.frontend_dir = PathBuf::from(v);
    }
    if let Some(v) = var("ADDRESS") {
        config.server.address = v;
    }
    if let Some(v) = var("DEBUG") {
        config.server.debug = parse_flag(&v);
    }
    if let Some(v) = var("OPENAI_API_KEY") {
        config.llm.api_key = Some(v);
    }
    if let Some(v) = var("OPENAI_BASE_URL") {
        config.llm.base_url = v;
    }
    if let Some(v) = var("OPENAI_MODEL") {
        config.llm.model = v;
    }
    if let Some(v) = var("SUMMIO_MAX_CONCURRENCY") {
        config.llm.max_concurrency = parse_number("SUMMIO_MAX_CONCURRENCY", &v)?;
    }
    if let Some(v) = var("SUMMIO_MAX_UPLOAD_BYTES") {
        config.server.max_upload_bytes = parse_number("SUMMIO_MAX_UPLOAD_BYTES", &v)?;
    }

    Ok(())
}

/// Any value other than an explicit "off" spelling enables the flag.
fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {value:?}")))
}
