use std::sync::Arc;

use summio_common::{Error, Result};
use summio_config::AppConfig;
use summio_db::{MigrationSet, SummaryStore};
use summio_summarizer::{DocumentSummarizer, Summarizer};
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// The HTTP server: migrates the database, then serves the API and static files.
pub struct GatewayServer {
    config: AppConfig,
    summarizer: Option<Arc<dyn DocumentSummarizer>>,
}

impl GatewayServer {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            summarizer: None,
        }
    }

    /// Use `summarizer` instead of building one from the LLM config.
    pub fn with_summarizer(mut self, summarizer: Arc<dyn DocumentSummarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub async fn run(self) -> Result<()> {
        let summarizer: Arc<dyn DocumentSummarizer> = match self.summarizer {
            Some(summarizer) => summarizer,
            None => Arc::new(Summarizer::from_config(&self.config.llm)?),
        };

        let files_dir = &self.config.storage.files_dir;
        tokio::fs::create_dir_all(files_dir).await.map_err(|e| {
            Error::Gateway(format!(
                "failed to create files directory {}: {e}",
                files_dir.display()
            ))
        })?;

        // Schema must be current before the first request is accepted.
        let migrations = MigrationSet::embedded()?;
        let store = SummaryStore::open(&self.config.storage.db_path, &migrations)?;
        info!("{} pdf summaries on record", store.count()?);

        let addr = self.config.server.bind_address();
        let state = Arc::new(AppState::new(self.config, Arc::new(store), summarizer));
        let app = build_router(state);

        let listener = TcpListener::bind(&addr).await?;
        info!("Summio listening on {}", addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::Gateway(format!("server error: {e}")))?;

        Ok(())
    }
}
