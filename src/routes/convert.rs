//! Conversion Routes
//!
//! Endpoints:
//! - POST /convert/pdfToText - OCR an uploaded PDF (`pdf` field)
//! - POST /convert/imgUrlToText - OCR a remote image (`{"imageURL": ...}`)
//! - POST /convert/imgToText - OCR an uploaded image (`image` field)
//! - POST /convert/pdfToCsv?ocrEnabled=true|false - extract tables to CSV

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Multipart, Query, State,
    },
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::convert::ConversionMode;
use crate::error::{AppError, Result};
use crate::ingest::UploadedFile;
use crate::ocr::OcrResult;
use crate::state::AppState;

/// Success message for CSV conversions
pub const CONVERTED_MESSAGE: &str = "PDF converted to CSV successfully";

/// Create the conversion router
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/pdfToText", post(pdf_to_text))
        .route("/imgUrlToText", post(img_url_to_text))
        .route("/imgToText", post(img_to_text))
        .route("/pdfToCsv", post(pdf_to_csv))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

#[derive(Debug, Deserialize)]
pub struct ImageUrlRequest {
    #[serde(rename = "imageURL")]
    pub image_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    #[serde(rename = "ocrEnabled")]
    pub ocr_enabled: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub message: String,
    /// Absolute download link for the CSV
    pub output_file_name: String,
}

/// POST /convert/pdfToText
async fn pdf_to_text(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<OcrResult>> {
    let upload = receive_upload(&state, multipart?, "pdf").await?;
    let result = state.ocr().recognize_from_local_file(&upload.path).await?;
    Ok(Json(result))
}

/// POST /convert/imgUrlToText
async fn img_url_to_text(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ImageUrlRequest>, JsonRejection>,
) -> Result<Json<OcrResult>> {
    let Json(request) = payload?;
    let url = request.image_url.trim();
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        _ => {
            return Err(AppError::BadRequest(format!(
                "imageURL must be an absolute http(s) URL, got '{}'",
                url
            )))
        }
    }

    let result = state.ocr().recognize_from_url(url).await?;
    Ok(Json(result))
}

/// POST /convert/imgToText
async fn img_to_text(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<OcrResult>> {
    let upload = receive_upload(&state, multipart?, "image").await?;
    let result = state
        .ocr()
        .recognize_from_local_image(&upload.path, &upload.extension)
        .await?;
    Ok(Json(result))
}

/// POST /convert/pdfToCsv
///
/// The flag is checked before the upload is stored, so a bad request
/// leaves nothing behind. An unparseable query counts as a bad flag.
async fn pdf_to_csv(
    State(state): State<AppState>,
    query: std::result::Result<Query<ConvertQuery>, QueryRejection>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ConvertResponse>> {
    let flag = query.ok().and_then(|Query(query)| query.ocr_enabled);
    let mode = ConversionMode::from_flag(flag.as_deref()).ok_or_else(|| {
        AppError::Validation("send correct request".to_string())
    })?;

    let upload = receive_upload(&state, multipart?, "pdf").await?;
    tracing::info!(base_name = %upload.base_name, ?mode, "Converting PDF to CSV");

    let artifact = state.orchestrator().run(upload, mode).await?;

    Ok(Json(ConvertResponse {
        message: CONVERTED_MESSAGE.to_string(),
        output_file_name: state.download_url(&artifact.download_name),
    }))
}

/// Store the file sent in `field_name`, ignoring any other fields
async fn receive_upload(
    state: &AppState,
    mut multipart: Multipart,
    field_name: &str,
) -> Result<UploadedFile> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Failed to read multipart field: {}", e);
        AppError::from(e)
    })? {
        if field.name() != Some(field_name) {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        return Ok(state.ingest().persist(&original_name, field).await?);
    }

    tracing::warn!(field = field_name, "No file field found in multipart upload");
    Err(AppError::BadRequest(format!(
        "No file provided. Use field name '{}'",
        field_name
    )))
}
