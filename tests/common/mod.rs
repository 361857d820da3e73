//! Shared fixtures for API tests

#![allow(dead_code)]

use std::io::Cursor;

use axum_test::TestServer;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::{ImageFormat, Rgba, RgbaImage};
use lopdf::{dictionary, Document, Object, Stream};

use pdf_sign_server::storage::SignedDocumentStore;
use pdf_sign_server::{app, AppState, Config};

/// Server in the default inline delivery mode
pub fn inline_server() -> TestServer {
    TestServer::new(app(AppState::new(Config::default()))).unwrap()
}

/// Server in stored delivery mode backed by `store`
pub fn stored_server(store: SignedDocumentStore) -> TestServer {
    TestServer::new(app(AppState::with_store(Config::default(), store))).unwrap()
}

/// An N-page US Letter PDF
pub fn sample_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::with_capacity(pages);
    for i in 0..pages {
        let content = format!("0 0 0 rg 100 {} 300 40 re f", 600 - i * 50);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {},
        });
        kids.push(page_id.into());
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
    doc.save_to(&mut out).unwrap();
    out
}

/// [`sample_pdf`] with bytes spliced in after the header, leaving every
/// xref offset stale. MuPDF repairs this on open; lopdf does not.
pub fn stale_xref_pdf(pages: usize) -> Vec<u8> {
    let pdf = sample_pdf(pages);
    let header_end = pdf.iter().position(|b| *b == b'\n').map_or(0, |p| p + 1);

    let mut out = pdf[..header_end].to_vec();
    out.extend_from_slice(format!("%{}\n", "x".repeat(300)).as_bytes());
    out.extend_from_slice(&pdf[header_end..]);
    out
}

/// A signature-like PNG: transparent with one opaque stroke
pub fn signature_png() -> Vec<u8> {
    let mut img = RgbaImage::from_pixel(60, 80, Rgba([0, 0, 0, 0]));
    for x in 5..55 {
        img.put_pixel(x, 40, Rgba([0, 0, 128, 255]));
    }
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png).unwrap();
    out
}

pub fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(png))
}

pub fn b64(data: &[u8]) -> String {
    BASE64.encode(data)
}

pub fn unb64(data: &str) -> Vec<u8> {
    BASE64.decode(data).unwrap()
}

/// Page count as seen by an independent parser
pub fn page_count(pdf: &[u8]) -> usize {
    Document::load_mem(pdf).unwrap().get_pages().len()
}

/// XObject names registered on each page
pub fn xobject_names(pdf: &[u8]) -> Vec<Vec<String>> {
    let doc = Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
            page.get(b"Resources")
                .and_then(|r| r.as_dict())
                .and_then(|r| r.get(b"XObject"))
                .and_then(|x| x.as_dict())
                .map(|x| {
                    x.iter()
                        .map(|(k, _)| String::from_utf8_lossy(k).to_string())
                        .collect()
                })
                .unwrap_or_default()
        })
        .collect()
}
