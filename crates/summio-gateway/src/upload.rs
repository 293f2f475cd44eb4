use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use rand::Rng;

use crate::error::ApiError;

const PDF_MAGIC: &[u8] = b"%PDF-";
const NAME_LETTERS: usize = 10;
const FORM_FIELD: &str = "file";

/// Content sniffing; the client-supplied content type is not trusted.
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// `<10 random lowercase letters>-<unix timestamp>.pdf`
pub fn generate_file_name() -> String {
    let mut rng = rand::rng();
    let letters: String = (0..NAME_LETTERS)
        .map(|_| char::from(b'a' + rng.random_range(0..26u8)))
        .collect();
    format!("{letters}-{}.pdf", chrono::Utc::now().timestamp())
}

/// Pull the bytes of the `file` field out of a multipart body.
pub async fn read_file_field(multipart: &mut Multipart, debug: bool) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request("Could not get form file", e, debug))?
    {
        if field.name() == Some(FORM_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request("Could not get form file", e, debug))?;
            return Ok(bytes.to_vec());
        }
    }

    Err(ApiError::bad_request(
        "Could not get form file",
        "missing multipart field \"file\"",
        debug,
    ))
}

/// Write an upload under a fresh name in `dir`, returning the name and path.
pub async fn store_upload(dir: &Path, bytes: &[u8]) -> std::io::Result<(String, PathBuf)> {
    let name = generate_file_name();
    let path = dir.join(&name);
    tokio::fs::write(&path, bytes).await?;
    Ok((name, path))
}
