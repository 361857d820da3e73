//! Core pipeline types

use serde::{Deserialize, Deserializer, Serialize};

/// Default rendering zoom for page previews
pub const DEFAULT_ZOOM: f32 = 1.5;

/// Smallest accepted zoom factor
pub const MIN_ZOOM: f32 = 0.1;

/// Largest accepted zoom factor
pub const MAX_ZOOM: f32 = 4.0;

/// Clamp a requested zoom into the supported range.
///
/// Non-finite values fall back to [`DEFAULT_ZOOM`].
pub fn clamp_zoom(zoom: f32) -> f32 {
    if zoom.is_finite() {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        DEFAULT_ZOOM
    }
}

/// Rectangle in PDF points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageRect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl PageRect {
    /// US Letter, used when a page carries no usable box
    pub const LETTER: PageRect = PageRect {
        x0: 0.0,
        y0: 0.0,
        x1: 612.0,
        y1: 792.0,
    };

    /// Build a rectangle from two arbitrary corners
    pub fn from_corners(ax: f32, ay: f32, bx: f32, by: f32) -> Self {
        Self {
            x0: ax.min(bx),
            y0: ay.min(by),
            x1: ax.max(bx),
            y1: ay.max(by),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Intersection of two boxes, `None` when they do not overlap
    pub fn intersect(&self, other: &PageRect) -> Option<PageRect> {
        let rect = PageRect {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        };
        (rect.width() > 0.0 && rect.height() > 0.0).then_some(rect)
    }
}

/// Geometry of a page as the compositor sees it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Visible box in unrotated user space (CropBox, else MediaBox)
    pub visible: PageRect,
    /// Display rotation, clockwise, one of 0 / 90 / 180 / 270
    pub rotation: u16,
}

impl PageGeometry {
    pub fn new(visible: PageRect, rotation: i64) -> Self {
        Self {
            visible,
            rotation: normalize_rotation(rotation),
        }
    }

    /// Transformation matrix `[a b c d e f]` mapping the image unit square
    /// onto the whole visible page, upright as displayed.
    ///
    /// The image is stretched: its own aspect ratio is ignored.
    pub fn overlay_matrix(&self) -> [f32; 6] {
        let PageRect { x0, y0, .. } = self.visible;
        let w = self.visible.width();
        let h = self.visible.height();

        match self.rotation {
            90 => [0.0, h, -w, 0.0, x0 + w, y0],
            180 => [-w, 0.0, 0.0, -h, x0 + w, y0 + h],
            270 => [0.0, -h, w, 0.0, x0, y0 + h],
            _ => [w, 0.0, 0.0, h, x0, y0],
        }
    }
}

/// Normalize a `/Rotate` value to 0, 90, 180 or 270.
///
/// Values that are not multiples of 90 are treated as 0, as viewers do.
pub fn normalize_rotation(rotation: i64) -> u16 {
    if rotation % 90 != 0 {
        return 0;
    }
    rotation.rem_euclid(360) as u16
}

/// A page rendered for preview
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// 0-based page index
    pub index: usize,
    /// PNG-encoded image
    pub data: Vec<u8>,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
}

/// Caller-supplied request to draw an image over one page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverlayRequest {
    /// 0-based page index; may be out of range, the compositor decides
    #[serde(default, deserialize_with = "lenient_index")]
    pub index: i64,
    /// `data:image/png;base64,...` payload
    #[serde(default, rename = "dataURL")]
    pub data_url: String,
}

impl OverlayRequest {
    pub fn new(index: i64, data_url: impl Into<String>) -> Self {
        Self {
            index,
            data_url: data_url.into(),
        }
    }

    /// Resolve the index against a page count
    pub fn page_index(&self, page_count: usize) -> Option<usize> {
        usize::try_from(self.index)
            .ok()
            .filter(|idx| *idx < page_count)
    }
}

/// Accept `3`, `3.0`, `"3"` or `null` for a page index.
///
/// Anything unusable maps to -1 so the entry is skipped rather than
/// failing the whole request.
fn lenient_index<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let index = match value {
        serde_json::Value::Null => 0,
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(-1),
        serde_json::Value::String(s) => s.trim().parse::<i64>().unwrap_or(-1),
        _ => -1,
    };
    Ok(index)
}
