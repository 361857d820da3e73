//! Page rasterizer
//!
//! Renders every page of a PDF to an opaque RGB PNG at a given zoom.

use std::io::Cursor;

use image::{DynamicImage, RgbImage};
use mupdf::{Colorspace, Matrix, Pixmap};

use crate::document::{clamp_zoom, DocumentError, DocumentResult, RenderedPage};

use super::loader::PdfSource;

/// Render all pages of `data` at `zoom`, off the async runtime.
///
/// Fails fast: the first page that cannot be rendered aborts the request
/// and no partial result is returned.
pub async fn render_pages(data: Vec<u8>, zoom: f32) -> DocumentResult<Vec<RenderedPage>> {
    tokio::task::spawn_blocking(move || {
        let source = PdfSource::from_bytes(data)?;
        render_source(&source, zoom)
    })
    .await
    .map_err(|e| DocumentError::RenderError(format!("Task join error: {}", e)))?
}

/// Render all pages of an already validated source
pub fn render_source(source: &PdfSource, zoom: f32) -> DocumentResult<Vec<RenderedPage>> {
    let zoom = clamp_zoom(zoom);
    let page_count = source.page_count();

    let pages = source.with_doc(|doc| {
        let matrix = Matrix::new_scale(zoom, zoom);
        let colorspace = Colorspace::device_rgb();

        let mut pages = Vec::with_capacity(page_count);
        for index in 0..page_count {
            let page = doc.load_page(index as i32).map_err(|e| {
                DocumentError::RenderError(format!("Failed to load page {}: {}", index, e))
            })?;
            let pixmap = page
                .to_pixmap(&matrix, &colorspace, false, true)
                .map_err(|e| {
                    DocumentError::RenderError(format!("Failed to render page {}: {}", index, e))
                })?;

            let (data, width, height) = encode_png(&pixmap)?;
            pages.push(RenderedPage {
                index,
                data,
                width,
                height,
            });
        }
        Ok(pages)
    })?;

    tracing::debug!(page_count = page_count, zoom = zoom, "Rendered page previews");
    Ok(pages)
}

/// Encode a pixmap as an RGB PNG, dropping any alpha channel
fn encode_png(pixmap: &Pixmap) -> DocumentResult<(Vec<u8>, u32, u32)> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    if n < 3 {
        return Err(DocumentError::RenderError(format!(
            "Unexpected pixmap with {} components",
            n
        )));
    }

    let mut rgb_buffer = Vec::with_capacity(width as usize * height as usize * 3);
    for pixel in samples.chunks_exact(n).take(width as usize * height as usize) {
        rgb_buffer.extend_from_slice(&pixel[..3]);
    }

    let img = RgbImage::from_raw(width, height, rgb_buffer)
        .ok_or_else(|| DocumentError::ImageError("Failed to create image buffer".to_string()))?;

    let mut output = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
        .map_err(|e| DocumentError::ImageError(e.to_string()))?;

    Ok((output, width, height))
}
