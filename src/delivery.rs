//! Delivery of signed documents
//!
//! A deployment either returns the signed bytes in the submit response
//! (inline) or stores them and returns an identifier (stored).

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::pdf::encode_base64;
use crate::state::AppState;

/// How signed documents are handed back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Base64 in the response, nothing retained
    #[default]
    Inline,
    /// Persisted, fetched later through `/download/{docId}`
    Stored,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMode::Inline => "inline",
            DeliveryMode::Stored => "stored",
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" | "stateless" => Ok(DeliveryMode::Inline),
            "stored" | "stateful" => Ok(DeliveryMode::Stored),
            other => Err(format!("Unknown delivery mode: {}", other)),
        }
    }
}

/// Submit response body, one shape per delivery mode
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Delivery {
    #[serde(rename_all = "camelCase")]
    Inline {
        success: bool,
        pdf_base64: String,
        filename: String,
    },
    #[serde(rename_all = "camelCase")]
    Stored {
        success: bool,
        doc_id: String,
        filename: String,
        download_url: String,
    },
}

/// Hand a finished document back according to the configured mode
pub async fn deliver(state: &AppState, filename: String, data: Vec<u8>) -> Result<Delivery> {
    match state.delivery_mode() {
        DeliveryMode::Inline => Ok(Delivery::Inline {
            success: true,
            pdf_base64: encode_base64(&data),
            filename,
        }),
        DeliveryMode::Stored => {
            let store = state
                .document_store()
                .ok_or_else(|| AppError::Internal("Stored delivery without a document store".into()))?;
            let record = store.store(&filename, &data).await?;

            Ok(Delivery::Stored {
                success: true,
                download_url: format!("/download/{}", record.id),
                doc_id: record.id.to_string(),
                filename,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::SignedDocumentStore;

    #[test]
    fn test_parse_delivery_mode() {
        assert_eq!("inline".parse::<DeliveryMode>().unwrap(), DeliveryMode::Inline);
        assert_eq!(" Stored ".parse::<DeliveryMode>().unwrap(), DeliveryMode::Stored);
        assert_eq!("stateful".parse::<DeliveryMode>().unwrap(), DeliveryMode::Stored);
        assert!("s3".parse::<DeliveryMode>().is_err());
        assert_eq!(DeliveryMode::default(), DeliveryMode::Inline);
    }

    #[test]
    fn test_delivery_json_shapes() {
        let inline = serde_json::to_value(Delivery::Inline {
            success: true,
            pdf_base64: "JVBERi0=".into(),
            filename: "a.pdf".into(),
        })
        .unwrap();
        assert_eq!(
            inline,
            serde_json::json!({"success": true, "pdfBase64": "JVBERi0=", "filename": "a.pdf"})
        );

        let stored = serde_json::to_value(Delivery::Stored {
            success: true,
            doc_id: "0123456789ab".into(),
            filename: "a.pdf".into(),
            download_url: "/download/0123456789ab".into(),
        })
        .unwrap();
        assert_eq!(stored["docId"], "0123456789ab");
        assert_eq!(stored["downloadUrl"], "/download/0123456789ab");
    }

    #[tokio::test]
    async fn test_deliver_inline_encodes_bytes() {
        let state = AppState::new(Config::default());
        let delivery = deliver(&state, "a.pdf".into(), b"%PDF".to_vec()).await.unwrap();
        assert_eq!(
            delivery,
            Delivery::Inline {
                success: true,
                pdf_base64: "JVBERg==".into(),
                filename: "a.pdf".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_deliver_stored_persists_bytes() {
        let state = AppState::with_store(Config::default(), SignedDocumentStore::in_memory());
        let delivery = deliver(&state, "a.pdf".into(), b"%PDF".to_vec()).await.unwrap();

        let Delivery::Stored { doc_id, download_url, .. } = delivery else {
            panic!("expected stored delivery");
        };
        assert_eq!(download_url, format!("/download/{}", doc_id));

        let store = state.document_store().unwrap();
        assert_eq!(store.fetch(&doc_id).await.unwrap().data, b"%PDF");
    }
}
