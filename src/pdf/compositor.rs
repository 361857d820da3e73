//! Overlay compositor and serializer
//!
//! Draws caller-supplied images over whole pages and writes the document
//! back out. Uses lopdf, since the work is object-level editing: an image
//! XObject (with an `/SMask` when the image has transparency) is registered
//! in the page resources and a content stream that paints it over the
//! visible page box is appended.
//!
//! # Layering
//!
//! ```text
//! Contents = [ "q", <original streams...>, "Q q <cm> /SigOverlay0 Do Q", "q <cm> /SigOverlay1 Do Q" ]
//! ```
//!
//! The original content is bracketed by `q`/`Q` once per page so any
//! graphics state it leaves behind cannot move the overlay. Every overlay
//! is its own XObject, so repeated overlays on one page stack in request
//! order.

use std::collections::HashSet;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::document::{
    DocumentError, DocumentResult, OverlayRequest, PageGeometry, PageRect,
};

use super::data_url::{decode_png_data_url, DataUrlRejection};
use super::loader::{has_pdf_magic, rewrite_pdf};

/// Guard against cycles in malformed page trees
const MAX_TREE_DEPTH: usize = 32;

/// XObject name prefix for overlay images
const OVERLAY_NAME_PREFIX: &str = "SigOverlay";

/// Decoded overlay image split into PDF-ready planes
#[derive(Debug, Clone)]
pub struct OverlayImage {
    width: u32,
    height: u32,
    /// 8-bit RGB samples
    rgb: Vec<u8>,
    /// 8-bit alpha samples, `None` when the image is fully opaque
    alpha: Option<Vec<u8>>,
}

impl OverlayImage {
    /// Decode encoded image bytes (PNG in practice)
    pub fn decode(bytes: &[u8]) -> DocumentResult<Self> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(DocumentError::ImageError("Image has no pixels".into()));
        }

        let pixel_count = width as usize * height as usize;
        let mut rgb = Vec::with_capacity(pixel_count * 3);
        let mut alpha = Vec::with_capacity(pixel_count);
        for pixel in img.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
            alpha.push(pixel.0[3]);
        }

        let alpha = alpha.iter().any(|a| *a != u8::MAX).then_some(alpha);

        Ok(Self {
            width,
            height,
            rgb,
            alpha,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether a soft mask will be emitted
    pub fn has_transparency(&self) -> bool {
        self.alpha.is_some()
    }
}

/// Outcome of an overlay pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayReport {
    pub applied: usize,
    pub skipped: usize,
}

/// Final signed document
#[derive(Debug, Clone)]
pub struct SignedPdf {
    pub data: Vec<u8>,
    pub page_count: usize,
    pub report: OverlayReport,
}

/// A PDF opened for overlay editing.
///
/// Obtained with [`SigningDocument::open`] and consumed by
/// [`SigningDocument::finish`], which serializes it. Dropping it without
/// finishing discards all edits.
pub struct SigningDocument {
    doc: Document,
    page_ids: Vec<ObjectId>,
    /// Pages whose original content is already bracketed by q/Q
    wrapped: HashSet<ObjectId>,
}

impl SigningDocument {
    /// Parse PDF bytes.
    ///
    /// Files lopdf cannot read as-is (a stale or broken xref table, say)
    /// are rewritten through MuPDF first, so anything that previews can
    /// also be signed.
    pub fn open(data: &[u8]) -> DocumentResult<Self> {
        if !has_pdf_magic(data) {
            return Err(DocumentError::ParseError("Missing %PDF header".into()));
        }

        let doc = match Document::load_mem(data) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("Rebuilding PDF that could not be parsed directly: {}", e);
                let rebuilt = rewrite_pdf(data)
                    .map_err(|_| DocumentError::ParseError(e.to_string()))?;
                let doc = Document::load_mem(&rebuilt)
                    .map_err(|e| DocumentError::ParseError(e.to_string()))?;
                if doc.get_pages().is_empty() {
                    return Err(DocumentError::ParseError(format!("No pages after rebuild: {}", e)));
                }
                doc
            }
        };
        let page_ids = doc.get_pages().into_values().collect();

        Ok(Self {
            doc,
            page_ids,
            wrapped: HashSet::new(),
        })
    }

    /// Number of pages
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Visible box and rotation of a page
    pub fn page_geometry(&self, index: usize) -> DocumentResult<PageGeometry> {
        let page_id = self.page_id(index)?;

        let media_box = self
            .inherited(page_id, b"MediaBox")
            .and_then(|obj| self.parse_rect(obj))
            .unwrap_or(PageRect::LETTER);

        let visible = self
            .inherited(page_id, b"CropBox")
            .and_then(|obj| self.parse_rect(obj))
            .and_then(|crop| crop.intersect(&media_box))
            .unwrap_or(media_box);

        let rotation = match self.inherited(page_id, b"Rotate") {
            Some(Object::Integer(r)) => *r,
            Some(Object::Real(r)) => *r as i64,
            _ => 0,
        };

        Ok(PageGeometry::new(visible, rotation))
    }

    /// Apply overlay requests in order, skipping any that cannot be used.
    ///
    /// Never fails: an out-of-range index, a wrong data-URL prefix, bad
    /// base64 or an undecodable image only counts as skipped.
    pub fn apply_overlays(&mut self, requests: &[OverlayRequest]) -> OverlayReport {
        let mut report = OverlayReport::default();

        for request in requests {
            let Some(index) = request.page_index(self.page_count()) else {
                tracing::debug!(
                    index = request.index,
                    page_count = self.page_count(),
                    "Skipping overlay for out-of-range page"
                );
                report.skipped += 1;
                continue;
            };

            let png = match decode_png_data_url(&request.data_url) {
                Ok(png) => png,
                Err(DataUrlRejection::WrongPrefix) => {
                    tracing::debug!(index = index, "Skipping overlay without PNG data URL");
                    report.skipped += 1;
                    continue;
                }
                Err(DataUrlRejection::BadBase64(reason)) => {
                    tracing::warn!(index = index, "Skipping overlay with invalid base64: {}", reason);
                    report.skipped += 1;
                    continue;
                }
            };

            let result = OverlayImage::decode(&png).and_then(|image| self.apply_overlay(index, image));
            match result {
                Ok(()) => report.applied += 1,
                Err(e) => {
                    tracing::warn!(index = index, "Skipping overlay: {}", e);
                    report.skipped += 1;
                }
            }
        }

        report
    }

    /// Draw `image` stretched over the whole visible area of page `index`
    pub fn apply_overlay(&mut self, index: usize, image: OverlayImage) -> DocumentResult<()> {
        let page_id = self.page_id(index)?;
        let geometry = self.page_geometry(index)?;

        let image_id = self.add_image(image)?;
        let name = self.register_xobject(page_id, image_id)?;

        let [a, b, c, d, e, f] = geometry.overlay_matrix();
        let draw = format!("q {} {} {} {} {} {} cm /{} Do Q\n", a, b, c, d, e, f, name);
        self.append_content(page_id, draw)
    }

    /// Serialize the document, consuming it
    pub fn finish(mut self) -> DocumentResult<Vec<u8>> {
        let mut output = Vec::new();
        self.doc
            .save_to(&mut output)
            .map_err(|e| DocumentError::SerializationError(e.to_string()))?;
        Ok(output)
    }

    fn page_id(&self, index: usize) -> DocumentResult<ObjectId> {
        self.page_ids.get(index).copied().ok_or_else(|| {
            DocumentError::InvalidContent(format!(
                "Page {} out of range (page count {})",
                index,
                self.page_ids.len()
            ))
        })
    }

    /// Look up a page attribute, walking up the page tree for inherited ones
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = Some(page_id);
        let mut depth = 0;

        while let Some(id) = current {
            if depth > MAX_TREE_DEPTH {
                return None;
            }
            let dict = self.doc.get_object(id).and_then(|o| o.as_dict()).ok()?;
            if let Ok(value) = dict.get(key) {
                return Some(self.resolve(value));
            }
            current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
            depth += 1;
        }

        None
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            other => other,
        }
    }

    fn parse_rect(&self, obj: &Object) -> Option<PageRect> {
        let arr = obj.as_array().ok()?;
        if arr.len() != 4 {
            return None;
        }
        let mut values = [0.0_f32; 4];
        for (slot, item) in values.iter_mut().zip(arr) {
            *slot = obj_to_f32(self.resolve(item))?;
        }
        let rect = PageRect::from_corners(values[0], values[1], values[2], values[3]);
        (rect.width() > 0.0 && rect.height() > 0.0).then_some(rect)
    }

    fn add_image(&mut self, image: OverlayImage) -> DocumentResult<ObjectId> {
        let OverlayImage {
            width,
            height,
            rgb,
            alpha,
        } = image;

        let mut image_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        };

        if let Some(alpha) = alpha {
            let mut smask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                alpha,
            );
            smask.compress()?;
            let smask_id = self.doc.add_object(smask);
            image_dict.set("SMask", smask_id);
        }

        let mut stream = Stream::new(image_dict, rgb);
        stream.compress()?;
        Ok(self.doc.add_object(stream))
    }

    /// Register an image under a fresh name in the page's own resources.
    ///
    /// Inherited or shared resource dictionaries are copied onto the page
    /// first, so other pages never see the new entry.
    fn register_xobject(&mut self, page_id: ObjectId, image_id: ObjectId) -> DocumentResult<String> {
        let mut resources = match self.inherited(page_id, b"Resources") {
            Some(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        };

        let mut xobjects = match resources.get(b"XObject").map(|obj| self.resolve(obj)) {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        };

        let name = (0..)
            .map(|n| format!("{}{}", OVERLAY_NAME_PREFIX, n))
            .find(|candidate| !xobjects.has(candidate.as_bytes()))
            .unwrap_or_else(|| OVERLAY_NAME_PREFIX.to_string());

        xobjects.set(name.clone(), Object::Reference(image_id));
        resources.set("XObject", Object::Dictionary(xobjects));

        let page = self
            .doc
            .get_object_mut(page_id)
            .and_then(|o| o.as_dict_mut())?;
        page.set("Resources", Object::Dictionary(resources));

        Ok(name)
    }

    /// Current page content as a list of stream references
    fn content_refs(&self, page_id: ObjectId) -> Vec<Object> {
        let Ok(page) = self.doc.get_object(page_id).and_then(|o| o.as_dict()) else {
            return Vec::new();
        };

        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    fn append_content(&mut self, page_id: ObjectId, draw: String) -> DocumentResult<()> {
        let mut contents = self.content_refs(page_id);
        let wrap = !self.wrapped.contains(&page_id) && !contents.is_empty();

        let body = if wrap { format!("\nQ\n{}", draw) } else { draw };
        let overlay_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, body.into_bytes()));

        if wrap {
            let open_id = self
                .doc
                .add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
            contents.insert(0, Object::Reference(open_id));
        }
        contents.push(Object::Reference(overlay_id));

        let page = self
            .doc
            .get_object_mut(page_id)
            .and_then(|o| o.as_dict_mut())?;
        page.set("Contents", Object::Array(contents));
        self.wrapped.insert(page_id);

        Ok(())
    }
}

fn obj_to_f32(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(f) => Some(*f as f32),
        _ => None,
    }
}

/// Open, overlay, serialize
pub fn sign_pdf(data: &[u8], requests: &[OverlayRequest]) -> DocumentResult<SignedPdf> {
    let mut doc = SigningDocument::open(data)?;
    let report = doc.apply_overlays(requests);
    let page_count = doc.page_count();
    let data = doc.finish()?;

    tracing::info!(
        page_count = page_count,
        applied = report.applied,
        skipped = report.skipped,
        size = data.len(),
        "Signed document produced"
    );

    Ok(SignedPdf {
        data,
        page_count,
        report,
    })
}

/// [`sign_pdf`] on the blocking pool
pub async fn sign_pdf_blocking(
    data: Vec<u8>,
    requests: Vec<OverlayRequest>,
) -> DocumentResult<SignedPdf> {
    tokio::task::spawn_blocking(move || sign_pdf(&data, &requests))
        .await
        .map_err(|e| DocumentError::SerializationError(format!("Task join error: {}", e)))?
}
