//! Signing routes
//!
//! Endpoints:
//! - POST /upload - Render every page of an uploaded PDF for preview
//! - POST /submit - Overlay drawn images onto the original PDF and deliver it

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Multipart, Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::delivery::{deliver, Delivery};
use crate::document::OverlayRequest;
use crate::error::{AppError, Result};
use crate::pdf::{decode_base64, encode_base64, render_pages, sign_pdf_blocking};
use crate::state::AppState;

/// File name used when the client does not send one
pub const DEFAULT_FILENAME: &str = "document.pdf";

/// Only files with this extension are accepted for upload
const ALLOWED_EXTENSION: &str = "pdf";

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    /// Preview zoom; the configured default applies when absent
    pub zoom: Option<f32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    pub page_count: usize,
    pub pages: Vec<PagePreview>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePreview {
    pub index: usize,
    /// Base64 PNG, without a data-URL prefix
    pub image_base64: String,
    pub width: u32,
    pub height: u32,
}

/// Submit body after lenient decoding
#[derive(Debug, Default)]
pub struct SubmitRequest {
    pub pages: Vec<OverlayRequest>,
    pub original_pdf: Option<String>,
    pub filename: String,
}

impl SubmitRequest {
    /// Decode a submit body.
    ///
    /// A body that is not a JSON object counts as `{}`. Overlay entries that
    /// are not objects are dropped; the rest of the request still applies.
    pub fn from_body(body: &[u8]) -> Self {
        let mut object = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => map,
            _ => {
                tracing::debug!("Submit body is not a JSON object, treating as empty");
                Default::default()
            }
        };

        let pages = match object.remove("pages") {
            Some(Value::Array(entries)) => entries
                .into_iter()
                .filter_map(|entry| serde_json::from_value::<OverlayRequest>(entry).ok())
                .collect(),
            _ => Vec::new(),
        };

        let original_pdf = match object.remove("original_pdf") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
            _ => None,
        };

        let filename = match object.remove("filename") {
            Some(Value::String(s)) if !s.is_empty() => s,
            _ => DEFAULT_FILENAME.to_string(),
        };

        Self {
            pages,
            original_pdf,
            filename,
        }
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the signing router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_pdf))
        .route("/submit", post(submit_pdf))
}

// ============================================================================
// Handlers
// ============================================================================

/// Render an uploaded PDF for preview
async fn upload_pdf(
    State(state): State<AppState>,
    query: Option<Query<UploadQuery>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let zoom = query
        .and_then(|Query(q)| q.zoom)
        .unwrap_or(state.config().render.zoom);

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        let filename = field.file_name().map(|s| s.to_string());

        tracing::debug!("Received field: name='{}', filename={:?}", name, filename);

        // Plain form values named "file" are not uploads
        let (true, Some(filename)) = (name == "file", filename) else {
            continue;
        };
        let data = field.bytes().await?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload.ok_or_else(|| AppError::MissingInput("No file".into()))?;
    if filename.is_empty() {
        return Err(AppError::MissingInput("No file selected".into()));
    }
    if !is_allowed_filename(&filename) {
        return Err(AppError::InvalidFormat("Only PDF allowed".into()));
    }

    tracing::debug!("Read {} bytes of '{}'", data.len(), filename);

    let rendered = render_pages(data.to_vec(), zoom).await?;
    let pages: Vec<PagePreview> = rendered
        .into_iter()
        .map(|page| PagePreview {
            index: page.index,
            image_base64: encode_base64(&page.data),
            width: page.width,
            height: page.height,
        })
        .collect();

    tracing::info!(page_count = pages.len(), zoom = zoom, "Rendered '{}' for preview", filename);

    Ok(Json(UploadResponse {
        success: true,
        filename,
        page_count: pages.len(),
        pages,
    }))
}

/// Overlay drawn pages onto the original and deliver the result
async fn submit_pdf(
    State(state): State<AppState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<Delivery>> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(rejection.body_text())
        } else {
            AppError::InvalidFormat(rejection.body_text())
        }
    })?;

    let request = SubmitRequest::from_body(&body);
    let encoded = request
        .original_pdf
        .ok_or_else(|| AppError::MissingInput("No original PDF".into()))?;
    let pdf = decode_base64(strip_data_url_prefix(&encoded))?;

    tracing::debug!(
        overlays = request.pages.len(),
        size = pdf.len(),
        "Signing '{}'",
        request.filename
    );

    let signed = sign_pdf_blocking(pdf, request.pages).await?;
    let delivery = deliver(&state, request.filename, signed.data).await?;

    Ok(Json(delivery))
}

/// `name.pdf`, case-insensitive
fn is_allowed_filename(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.eq_ignore_ascii_case(ALLOWED_EXTENSION))
        .unwrap_or(false)
}

/// Accept the PDF either as bare base64 or as a `data:...;base64,` URL
fn strip_data_url_prefix(encoded: &str) -> &str {
    match encoded.split_once(";base64,") {
        Some((scheme, payload)) if scheme.starts_with("data:") => payload,
        _ => encoded,
    }
}
