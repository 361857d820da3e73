//! In-memory PDF and PNG fixtures for unit tests

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::{ImageFormat, Rgba, RgbaImage};
use lopdf::{dictionary, Document, Object, Stream};

/// An N-page US Letter PDF, each page with a filled rectangle
pub fn sample_pdf(pages: usize) -> Vec<u8> {
    build_pdf(pages, |_| dictionary! {})
}

/// Same as [`sample_pdf`] with extra entries on every page dictionary
pub fn build_pdf<F>(pages: usize, mut page_extra: F) -> Vec<u8>
where
    F: FnMut(usize) -> lopdf::Dictionary,
{
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::with_capacity(pages);
    for i in 0..pages {
        let content = format!("0.2 0.4 0.8 rg 72 {} 200 100 re f", 72 + i * 10);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {},
        };
        for (key, value) in page_extra(i).iter() {
            page.set(key.clone(), value.clone());
        }
        kids.push(doc.add_object(page).into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("fixture PDF serializes");
    out
}

/// [`sample_pdf`] with a comment spliced in after the header line, so
/// every recorded object offset and `startxref` point too early
pub fn stale_xref_pdf(pages: usize) -> Vec<u8> {
    let pdf = sample_pdf(pages);
    let header_end = pdf.iter().position(|b| *b == b'\n').map_or(0, |p| p + 1);

    let mut out = pdf[..header_end].to_vec();
    out.push(b'%');
    out.extend(std::iter::repeat(b'x').take(300));
    out.push(b'\n');
    out.extend_from_slice(&pdf[header_end..]);
    out
}

/// A PNG with a transparent background and an opaque stroke
pub fn signature_png(width: u32, height: u32) -> Vec<u8> {
    let mut img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    let y = height / 2;
    for x in 0..width {
        img.put_pixel(x, y, Rgba([10, 10, 120, 255]));
    }
    encode_png(img)
}

/// A fully opaque PNG
pub fn opaque_png(width: u32, height: u32) -> Vec<u8> {
    encode_png(RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 255])))
}

/// Wrap PNG bytes in the data-URL form the browser canvas produces
pub fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(png))
}

fn encode_png(img: RgbaImage) -> Vec<u8> {
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .expect("fixture PNG encodes");
    out
}
