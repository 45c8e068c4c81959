//! Artifact download routes
//!
//! Serves produced CSV files from the output directory as attachments.

use std::convert::Infallible;

use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the download router
pub fn router() -> Router<AppState> {
    Router::new().route("/:filename", get(download))
}

/// GET /download/:filename
async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    request: Request,
) -> Result<Response> {
    if !is_safe_file_name(&filename) {
        tracing::warn!(filename = %filename, "Rejected download name");
        return Err(AppError::BadRequest(format!("Invalid file name: {}", filename)));
    }

    let path = state.config().storage.output_dir.join(&filename);
    match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => {}
        _ => return Err(AppError::NotFound(format!("File '{}' not found", filename))),
    }

    let served: std::result::Result<_, Infallible> = ServeFile::new(&path).oneshot(request).await;
    let mut response = match served {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    };

    if response.status().is_success() {
        let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
            .map_err(|e| AppError::Internal(e.to_string()))?;
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, disposition);
    }

    tracing::debug!(filename = %filename, status = %response.status(), "Served download");
    Ok(response)
}

/// A single plain file name: no separators, no dot-prefixed names.
fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 255
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
