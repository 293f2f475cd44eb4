use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::frontend;
use crate::handlers::{get_summary, health, list_summaries, upload_pdf};
use crate::state::SharedState;

/// Route prefix under which uploaded PDFs are served back.
pub const DOCS_PREFIX: &str = "/api/static/docs";

pub fn build_router(state: SharedState) -> Router {
    let storage = &state.config.storage;
    let docs = ServeDir::new(&storage.files_dir);
    let body_limit = DefaultBodyLimit::max(state.config.server.max_upload_bytes);

    let router = Router::new()
        .route("/health", get(health))
        .route("/api/pdf", get(list_summaries).post(upload_pdf))
        .route("/api/pdf/{id}", get(get_summary))
        .nest_service(DOCS_PREFIX, docs);

    #[cfg(feature = "embed-frontend")]
    let router = router.fallback(frontend::serve_embedded);
    #[cfg(not(feature = "embed-frontend"))]
    let router = router.fallback_service(frontend::serve_dir(&storage.frontend_dir));

    router
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
