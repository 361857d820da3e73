//! PDF backends
//!
//! - [`loader`]: validation and read-only access through MuPDF
//! - [`rasterizer`]: page previews (MuPDF)
//! - [`data_url`]: base64 and `data:` URL helpers
//! - [`compositor`]: image overlays and serialization (lopdf)

pub mod compositor;
pub mod data_url;
pub mod loader;
pub mod rasterizer;

#[cfg(test)]
pub(crate) mod fixtures;

pub use compositor::{sign_pdf, sign_pdf_blocking, OverlayReport, SignedPdf, SigningDocument};
pub use data_url::{decode_base64, decode_png_data_url, encode_base64, PNG_DATA_URL_PREFIX};
pub use loader::{has_pdf_magic, PdfSource};
pub use rasterizer::{render_pages, render_source};
