//! Error types for the OCR Gateway
//!
//! Internal failures keep their cause for logging and the `code` field, but
//! clients only ever see a coarse `error` message.

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::convert::ConversionError;
use crate::ingest::IngestError;
use crate::ocr::OcrError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Message returned for every internal failure
pub const GENERIC_ERROR: &str = "Something went wrong";

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Malformed request answered with the legacy 500 contract
    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Invalid JSON body: {0}")]
    JsonBody(#[from] JsonRejection),

    #[error("Invalid multipart body: {0}")]
    MultipartBody(#[from] MultipartRejection),

    #[error("Upload error: {0}")]
    Ingest(#[from] IngestError),

    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

/// Failures while reading multipart fields are client errors, except
/// for an exceeded body limit which keeps its 413
impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        match IngestError::from(e) {
            IngestError::Stream(msg) => AppError::BadRequest(format!("Failed to read upload: {}", msg)),
            other => AppError::Ingest(other),
        }
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::JsonBody(_) | AppError::MultipartBody(_) => "BAD_REQUEST",
            AppError::Ingest(IngestError::TooLarge) => "PAYLOAD_TOO_LARGE",
            AppError::Ingest(_) => "INGEST_ERROR",
            AppError::Ocr(OcrError::InvalidInput(_)) => "BAD_REQUEST",
            AppError::Ocr(_) => "UPSTREAM_ERROR",
            AppError::Conversion(ConversionError::Ocr(_)) => "UPSTREAM_ERROR",
            AppError::Conversion(ConversionError::Download(_)) => "DOWNLOAD_ERROR",
            AppError::Conversion(ConversionError::Extraction(_)) => "EXTRACTION_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::JsonBody(rejection) => (rejection.status(), rejection.body_text()),
            AppError::MultipartBody(rejection) => (rejection.status(), rejection.body_text()),
            AppError::Ingest(IngestError::TooLarge) => {
                tracing::warn!(code, "Rejected oversized upload");
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string())
            }
            AppError::Validation(msg) => {
                tracing::warn!(code, "Rejected request: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::Ocr(e) if e.status_code() == StatusCode::BAD_REQUEST => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            _ => {
                tracing::error!(code, error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR.to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractionError;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_internal_failures_are_collapsed() {
        let err: AppError = ConversionError::from(ExtractionError::NonZeroExit { code: Some(1) }).into();
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], GENERIC_ERROR);
        assert_eq!(body["code"], "EXTRACTION_ERROR");
    }

    #[tokio::test]
    async fn test_validation_keeps_message_and_500() {
        let response = AppError::Validation("send correct request".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "send correct request");
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_invalid_ocr_input_is_bad_request() {
        let err = AppError::from(OcrError::InvalidInput("no extension".to_string()));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
    }

    #[test]
    fn test_codes_distinguish_causes() {
        let upstream = AppError::from(ConversionError::from(OcrError::NoSearchablePdf));
        assert_eq!(upstream.code(), "UPSTREAM_ERROR");

        let download = AppError::from(ConversionError::from(crate::fetch::DownloadError::Status {
            url: "https://x/y.pdf".to_string(),
            status: 404,
        }));
        assert_eq!(download.code(), "DOWNLOAD_ERROR");

        assert_eq!(AppError::NotFound("x".into()).code(), "NOT_FOUND");
    }
}
