//! Document pipeline types
//!
//! Shared vocabulary for the signing pipeline:
//!
//! ```text
//! upload ──▶ loader ──▶ rasterizer ──▶ RenderedPage[] (preview)
//!
//! submit ──▶ OverlayRequest[] ──▶ compositor ──▶ serializer ──▶ delivery
//! ```

mod error;
mod types;

pub use error::{DocumentError, DocumentResult, Result};
pub use types::{
    clamp_zoom, normalize_rotation, OverlayRequest, PageGeometry, PageRect, RenderedPage,
    DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM,
};
