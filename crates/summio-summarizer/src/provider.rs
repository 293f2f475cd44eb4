use async_trait::async_trait;
use summio_common::Result;

/// A text-completion backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Send a single user prompt and return the model's reply text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
