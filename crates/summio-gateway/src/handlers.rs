use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Path, Query, State};
use serde::Deserialize;
use summio_common::Error;
use summio_db::{NewSummary, PdfSummary};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::SharedState;
use crate::upload::{is_pdf, read_file_field, store_upload};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
    /// Substring to look for in titles and summaries.
    pub q: Option<String>,
}

pub async fn health() -> &'static str {
    "ok"
}

/// `GET /api/pdf`
pub async fn list_summaries(
    State(state): State<SharedState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<PdfSummary>>>, ApiError> {
    let Query(params) =
        params.map_err(|e| ApiError::bad_request("Invalid query parameters", e, state.debug()))?;

    let result = match params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(query) => state.store.search(query, params.limit),
        None => state.store.list(params.limit, params.offset),
    };

    let summaries = result
        .map_err(|e| ApiError::from_error(e, "Could not get PDF summaries", state.debug()))?;
    Ok(Json(ApiResponse::success(summaries)))
}

/// `GET /api/pdf/{id}`
pub async fn get_summary(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PdfSummary>>, ApiError> {
    let id: i64 = id
        .parse()
        .map_err(|e| ApiError::bad_request("Invalid PDF summary id", e, state.debug()))?;

    let summary = state
        .store
        .get(id)
        .and_then(|found| found.ok_or_else(|| Error::NotFound(format!("PDF summary {id}"))))
        .map_err(|e| ApiError::from_error(e, "Could not get PDF summary", state.debug()))?;

    Ok(Json(ApiResponse::success(summary)))
}

/// `POST /api/pdf`: store the upload, summarize it, persist the result.
pub async fn upload_pdf(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<PdfSummary>>, ApiError> {
    let debug = state.debug();
    let mut multipart =
        multipart.map_err(|e| ApiError::bad_request("Could not get form file", e, debug))?;
    let bytes = read_file_field(&mut multipart, debug).await?;

    if !is_pdf(&bytes) {
        return Err(ApiError::bad_request(
            "Invalid mime type",
            "upload does not start with a PDF header",
            debug,
        ));
    }

    let (file, path) = store_upload(&state.config.storage.files_dir, &bytes)
        .await
        .map_err(|e| ApiError::from_error(e.into(), "Could not create file", debug))?;

    // The file only outlives this request if its record was stored.
    let result = summarize_and_record(&state, file, &path).await;
    if result.is_err() {
        if let Err(rm) = tokio::fs::remove_file(&path).await {
            warn!("failed to remove {} after upload error: {rm}", path.display());
        }
    }

    result.map(|stored| Json(ApiResponse::success(stored)))
}

async fn summarize_and_record(
    state: &SharedState,
    file: String,
    path: &std::path::Path,
) -> Result<PdfSummary, ApiError> {
    let debug = state.debug();
    let summary = state
        .summarizer
        .summarize_pdf(path)
        .await
        .map_err(|e| ApiError::from_error(e, "Could not summarize docs", debug))?;

    let record = NewSummary {
        file,
        summary: summary.summary,
        title: summary.title,
        intermediate_summary: summary.intermediate_summary,
    };
    let id = state
        .store
        .insert(&record)
        .map_err(|e| ApiError::from_error(e, "Could not insert pdf summary", debug))?;
    info!("stored summary {id} for {}", record.file);

    state
        .store
        .get(id)
        .and_then(|found| found.ok_or_else(|| Error::Database(format!("summary {id} vanished"))))
        .map_err(|e| ApiError::from_error(e, "Could not insert pdf summary", debug))
}
