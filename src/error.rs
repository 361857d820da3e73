//! Error types for the PDF signing server

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::document::DocumentError;
use crate::storage::StorageError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// A required input is absent
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Input is present but has the wrong shape
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingInput(_) | AppError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Document(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            AppError::Document(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Multipart(e) => e.status(),
        }
    }

    /// Error type and client-facing message
    fn describe(&self) -> (&'static str, String) {
        match self {
            AppError::MissingInput(msg) => ("missing_input", msg.clone()),
            AppError::InvalidFormat(msg) => ("invalid_format", msg.clone()),
            AppError::NotFound(msg) => ("not_found", msg.clone()),
            AppError::PayloadTooLarge(msg) => ("payload_too_large", msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("internal_error", "An internal error occurred".to_string())
            }
            AppError::Document(e) => match e {
                DocumentError::ParseError(_) => {
                    ("invalid_format", "Could not read the PDF".to_string())
                }
                DocumentError::InvalidContent(msg) => ("invalid_format", msg.clone()),
                DocumentError::SerializationError(_) => {
                    tracing::error!("Serialization error: {}", e);
                    (
                        "serialization_error",
                        "Failed to write the signed PDF".to_string(),
                    )
                }
                _ => {
                    tracing::error!("Document error: {}", e);
                    ("processing_error", "Failed to process the PDF".to_string())
                }
            },
            AppError::Storage(e) => match e {
                StorageError::NotFound(id) => ("not_found", format!("Document not found: {}", id)),
                _ => {
                    tracing::error!("Storage error: {}", e);
                    ("storage_error", "Storage error".to_string())
                }
            },
            AppError::Multipart(e) => {
                let error_type = if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    "payload_too_large"
                } else {
                    "invalid_format"
                };
                (error_type, e.body_text())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error_type, message) = self.describe();

        let body = Json(ErrorResponse {
            success: false,
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
