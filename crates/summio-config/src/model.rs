use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use summio_common::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address. A bare `:port` binds every interface.
    pub address: String,
    /// Log request failure details and enable per-request tracing.
    pub debug: bool,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: ":1323".to_string(),
            debug: false,
            max_upload_bytes: 32 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        if self.address.starts_with(':') {
            format!("0.0.0.0{}", self.address)
        } else {
            self.address.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: PathBuf,
    /// Where uploaded PDFs are written.
    pub files_dir: PathBuf,
    /// Built frontend assets, served for every non-API path.
    pub frontend_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("summiodb.sqlite3"),
            files_dir: PathBuf::from("data"),
            frontend_dir: PathBuf::from("frontend/dist"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Upper bound on chunk summaries requested at once.
    pub max_concurrency: usize,
    /// Chunk size in whitespace-separated tokens.
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.2,
            max_concurrency: 10,
            chunk_size: 512,
            chunk_overlap: 100,
        }
    }
}

impl LlmConfig {
    /// The provider key, which the server cannot start without.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Config("missing env var \"OPENAI_API_KEY\"".into()))
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.server.address.trim().is_empty() {
            return Err(Error::Config("listen address cannot be empty".into()));
        }
        if self.llm.max_concurrency == 0 {
            return Err(Error::Config("llm.max_concurrency must be at least 1".into()));
        }
        if self.llm.chunk_size == 0 {
            return Err(Error::Config("llm.chunk_size must be at least 1".into()));
        }
        if self.llm.chunk_overlap >= self.llm.chunk_size {
            return Err(Error::Config(format!(
                "llm.chunk_overlap ({}) must be smaller than llm.chunk_size ({})",
                self.llm.chunk_overlap, self.llm.chunk_size
            )));
        }
        Ok(())
    }
}
