//! Route modules for the OCR Gateway

pub mod convert;
pub mod download;
pub mod health;

use axum::http::StatusCode;

/// Fallback for anything that is neither a route nor a static file
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "404 Page Not Found")
}
