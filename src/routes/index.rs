//! Upload page

use axum::{response::Html, routing::get, Router};

use crate::state::AppState;

/// Single-page UI: upload, preview, draw, submit
const UPLOAD_PAGE: &str = include_str!("../../static/upload.html");

async fn index() -> Html<&'static str> {
    Html(UPLOAD_PAGE)
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}
