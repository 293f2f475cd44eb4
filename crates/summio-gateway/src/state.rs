use std::sync::Arc;

use summio_config::AppConfig;
use summio_db::SummaryStore;
use summio_summarizer::DocumentSummarizer;

/// Shared application state accessible from all request handlers.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<SummaryStore>,
    pub summarizer: Arc<dyn DocumentSummarizer>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<SummaryStore>,
        summarizer: Arc<dyn DocumentSummarizer>,
    ) -> Self {
        Self {
            config,
            store,
            summarizer,
        }
    }

    pub fn debug(&self) -> bool {
        self.config.server.debug
    }
}

pub type SharedState = Arc<AppState>;
