use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use summio_common::Error;
use thiserror::Error;
use tracing::{debug, warn};

use crate::response::ApiResponse;

/// Request-level failure. The message is what the client sees; causes are
/// logged, never returned.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Classify `err` and log it. `message` replaces the cause for anything
    /// the client did not do wrong.
    pub fn from_error(err: Error, message: &str, debug_mode: bool) -> Self {
        report(debug_mode, message, &err);
        match err {
            Error::InvalidInput(detail) => Self::BadRequest(detail),
            Error::NotFound(detail) => Self::NotFound(detail),
            _ => Self::Internal(message.to_string()),
        }
    }

    /// Reject bad input, logging `cause` when it adds anything.
    pub fn bad_request(message: &str, cause: impl std::fmt::Display, debug_mode: bool) -> Self {
        report(debug_mode, message, &cause);
        Self::BadRequest(message.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn report(debug_mode: bool, message: &str, cause: &dyn std::fmt::Display) {
    if debug_mode {
        warn!("{message}: {cause}");
    } else {
        debug!("{message}: {cause}");
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ApiResponse::error(self.to_string()))).into_response()
    }
}
