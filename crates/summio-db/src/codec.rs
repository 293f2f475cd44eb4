//! Storage form of the intermediate-summary list: a JSON array of strings in
//! a single `TEXT` column.

use summio_common::{Error, Result};

pub fn encode_summaries(items: &[String]) -> Result<String> {
    Ok(serde_json::to_string(items)?)
}

/// Decode a stored list. Anything that is not a JSON array of strings is
/// reported as corruption.
pub fn decode_summaries(raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw)
        .map_err(|e| Error::Corruption(format!("invalid intermediate summary list: {e}")))
}
