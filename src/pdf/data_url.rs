//! Data-URL handling for overlay images

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::document::{DocumentError, DocumentResult};

/// Only PNG canvases are accepted as overlays
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Why an overlay payload was not usable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataUrlRejection {
    /// Missing or different `data:image/png;base64,` prefix
    WrongPrefix,
    /// Prefix was fine but the payload is not base64
    BadBase64(String),
}

/// Strip the PNG data-URL prefix and decode the payload.
///
/// Whitespace inside the payload (line-wrapped base64) is ignored.
pub fn decode_png_data_url(data_url: &str) -> Result<Vec<u8>, DataUrlRejection> {
    let payload = data_url
        .strip_prefix(PNG_DATA_URL_PREFIX)
        .ok_or(DataUrlRejection::WrongPrefix)?;

    decode_base64(payload).map_err(|e| DataUrlRejection::BadBase64(e.to_string()))
}

/// Decode standard base64, tolerating embedded whitespace
pub fn decode_base64(input: &str) -> DocumentResult<Vec<u8>> {
    let compact: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    BASE64
        .decode(compact.as_bytes())
        .map_err(|e| DocumentError::InvalidContent(format!("Invalid base64: {}", e)))
}

/// Encode bytes as standard base64
pub fn encode_base64(data: &[u8]) -> String {
    BASE64.encode(data)
}
