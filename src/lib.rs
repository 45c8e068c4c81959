//! OCR Gateway
//!
//! An HTTP front end that forwards uploaded documents and remote images to
//! OCR.space, and turns PDFs into CSV tables with an external converter.

pub mod config;
pub mod convert;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod ingest;
pub mod ocr;
pub mod routes;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{handler::HandlerWithoutStateExt, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let config = state.config();

    let static_files = ServeDir::new(&config.storage.static_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(routes::not_found.into_service());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/health", routes::health::router())
        .nest("/convert", routes::convert::router(config.server.max_upload_bytes))
        .nest("/download", routes::download::router())
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
