use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("migration error: {0}")]
    Migration(String),

    /// Stored content could not be decoded back into its typed form.
    #[error("data corruption: {0}")]
    Corruption(String),

    #[error("summarizer error: {0}")]
    Summarizer(String),

    #[error("llm provider error: {0}")]
    Llm(String),

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
