//! Download route for stored delivery
//!
//! Only mounted when `DELIVERY_MODE=stored`.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::error::{AppError, Result};
use crate::state::AppState;

use super::sign::DEFAULT_FILENAME;

pub fn router() -> Router<AppState> {
    Router::new().route("/download/:doc_id", get(download_pdf))
}

/// Stream a stored signed document back as an attachment
async fn download_pdf(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Response> {
    let store = state
        .document_store()
        .ok_or_else(|| AppError::NotFound(format!("Document not found: {}", doc_id)))?;

    let stored = store.fetch(&doc_id).await?;

    tracing::debug!(doc_id = %doc_id, size = stored.data.len(), "Serving signed document");

    let disposition = format!(
        "attachment; filename=\"{}\"",
        attachment_filename(&stored.record.filename)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        stored.data,
    )
        .into_response())
}

/// Reduce a client-supplied name to something safe inside a quoted header value
fn attachment_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_filename() {
        assert_eq!(attachment_filename("lease.pdf"), "lease.pdf");
        assert_eq!(attachment_filename("../../etc/passwd"), "passwd");
        assert_eq!(attachment_filename("C:\\docs\\a.pdf"), "a.pdf");
        assert_eq!(attachment_filename("say \"hi\".pdf"), "say _hi_.pdf");
        assert_eq!(attachment_filename("résumé.pdf"), "r_sum_.pdf");
        assert_eq!(attachment_filename("line\nbreak.pdf"), "line_break.pdf");
        assert_eq!(attachment_filename(""), DEFAULT_FILENAME);
        assert_eq!(attachment_filename("dir/"), DEFAULT_FILENAME);
    }
}
