//! PDF Sign Server
//!
//! Upload a PDF, preview its pages as images, draw over them in the browser
//! and get the signed PDF back, either inline or through a download link.

pub mod config;
pub mod delivery;
pub mod document;
pub mod error;
pub mod pdf;
pub mod routes;
pub mod state;
pub mod storage;

pub use config::Config;
pub use error::{AppError, Result};
pub use routes::app;
pub use state::AppState;
