//! The single-page frontend. Served from `frontend_dir` on disk by default;
//! with the `embed-frontend` feature the bundle is compiled into the binary.

#[cfg(not(feature = "embed-frontend"))]
use std::path::Path;

#[cfg(not(feature = "embed-frontend"))]
use tower_http::services::{ServeDir, ServeFile};

/// Served for the root and for any path the bundle does not contain.
pub const INDEX: &str = "index.html";

/// Map a request path onto a file name inside the bundle.
pub fn asset_path(uri_path: &str) -> &str {
    match uri_path.trim_start_matches('/') {
        "" => INDEX,
        path => path,
    }
}

#[cfg(not(feature = "embed-frontend"))]
pub fn serve_dir(dir: &Path) -> ServeDir<ServeFile> {
    // Unknown paths fall through to index.html so client-side routes work.
    ServeDir::new(dir).fallback(ServeFile::new(dir.join(INDEX)))
}

#[cfg(feature = "embed-frontend")]
mod embedded {
    use axum::body::Body;
    use axum::http::{StatusCode, Uri, header};
    use axum::response::{IntoResponse, Response};
    use rust_embed::RustEmbed;

    use super::{INDEX, asset_path};

    #[derive(RustEmbed)]
    #[folder = "../../frontend/dist"]
    struct Assets;

    pub async fn serve_embedded(uri: Uri) -> Response {
        let path = asset_path(uri.path());
        if let Some(file) = Assets::get(path) {
            return asset_response(path, file.data.into_owned());
        }
        match Assets::get(INDEX) {
            Some(index) => asset_response(INDEX, index.data.into_owned()),
            None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
        }
    }

    fn asset_response(path: &str, body: Vec<u8>) -> Response {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        ([(header::CONTENT_TYPE, mime.to_string())], Body::from(body)).into_response()
    }
}

#[cfg(feature = "embed-frontend")]
pub use embedded::serve_embedded;
