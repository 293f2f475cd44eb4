use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use serde::{Deserialize, Serialize};
use summio_common::{Error, Result};
use summio_config::LlmConfig;
use tracing::{debug, info};

use crate::loader::{TextSplitter, extract_pdf_text};
use crate::openai::OpenAiProvider;
use crate::provider::LlmProvider;

const MAP_PROMPT: &str = "Write a concise one-line summary of the following: \n\n\"{context}\"\n\nCONCISE ONELINE SUMMARY:";

const COMBINE_PROMPT: &str =
    "Write a concise summary of the following in markdown format:\n\n\"{context}\"\n\nMARKDOWN RESULT:";

const TITLE_PROMPT: &str =
    "Write a very concise title for the following summary:\n\n\"{context}\"\n\nTITLE:";

/// Result of summarizing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub summary: String,
    pub title: String,
    /// One-line summary per chunk, in document order.
    pub intermediate_summary: Vec<String>,
}

/// Turns a stored PDF into a [`Summary`].
#[async_trait]
pub trait DocumentSummarizer: Send + Sync {
    async fn summarize_pdf(&self, path: &Path) -> Result<Summary>;
}

/// Map-reduce summarization: one-line summaries per chunk, a combined
/// markdown summary, then a title for it.
pub struct Summarizer {
    provider: Arc<dyn LlmProvider>,
    splitter: TextSplitter,
    max_concurrency: usize,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn LlmProvider>, splitter: TextSplitter, max_concurrency: usize) -> Self {
        Self {
            provider,
            splitter,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let provider = OpenAiProvider::from_config(config)?;
        Ok(Self::new(
            Arc::new(provider),
            TextSplitter::new(config.chunk_size, config.chunk_overlap),
            config.max_concurrency,
        ))
    }

    pub async fn summarize_text(&self, text: &str) -> Result<Summary> {
        let chunks = self.splitter.split(text);
        info!(
            "document split into {} chunk(s), summarizing with {}",
            chunks.len(),
            self.provider.name()
        );
        self.summarize_chunks(&chunks).await
    }

    pub async fn summarize_chunks(&self, chunks: &[String]) -> Result<Summary> {
        if chunks.is_empty() {
            return Err(Error::InvalidInput(
                "document contains no extractable text".into(),
            ));
        }

        // `buffered` keeps results in chunk order while bounding in-flight calls.
        let intermediate_summary: Vec<String> = stream::iter(chunks.iter().cloned())
            .map(|chunk| {
                let provider = Arc::clone(&self.provider);
                async move { complete_prompt(provider.as_ref(), MAP_PROMPT, &chunk).await }
            })
            .buffered(self.max_concurrency)
            .try_collect()
            .await?;
        debug!("map step produced {} summaries", intermediate_summary.len());

        let combined = intermediate_summary.join("\n\n");
        let provider = self.provider.as_ref();
        let summary = complete_prompt(provider, COMBINE_PROMPT, &combined).await?;
        let title = clean_title(&complete_prompt(provider, TITLE_PROMPT, &summary).await?);

        Ok(Summary {
            summary,
            title,
            intermediate_summary,
        })
    }
}

#[async_trait]
impl DocumentSummarizer for Summarizer {
    async fn summarize_pdf(&self, path: &Path) -> Result<Summary> {
        let bytes = tokio::fs::read(path).await?;
        let text = tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
            .await
            .map_err(|e| Error::Summarizer(format!("pdf extraction task failed: {e}")))??;

        info!("pdf loaded: {} ({} bytes of text)", path.display(), text.len());
        self.summarize_text(&text).await
    }
}

async fn complete_prompt(provider: &dyn LlmProvider, template: &str, context: &str) -> Result<String> {
    provider.complete(&template.replace("{context}", context)).await
}

fn clean_title(raw: &str) -> String {
    raw.trim()
        .trim_start_matches("TITLE:")
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '*' || c == '#')
        .trim()
        .to_string()
}
