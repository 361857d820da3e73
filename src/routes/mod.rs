//! Route modules for the PDF signing server

pub mod download;
pub mod health;
pub mod index;
pub mod sign;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::delivery::DeliveryMode;
use crate::state::AppState;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .merge(index::router())
        .merge(health::router())
        .merge(sign::router());

    if state.delivery_mode() == DeliveryMode::Stored {
        router = router.merge(download::router());
    }

    router
        .layer(DefaultBodyLimit::max(state.config().server.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
