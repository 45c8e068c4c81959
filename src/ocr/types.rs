//! OCR Types
//!
//! Request and response types for the OCR.space parse API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What to recognize
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrInput {
    /// Remote file fetched by the provider
    Url(String),
    /// Local file uploaded as a form part
    File {
        file_name: String,
        mime_type: String,
        data: Vec<u8>,
    },
    /// `data:<mime>;base64,<payload>` URI
    Base64(String),
}

/// A single call to the OCR provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrRequest {
    pub input: OcrInput,
    pub api_key: String,
    /// Recognition language (provider default when `None`)
    pub language: Option<String>,
    /// Ask for a searchable PDF with a hidden text layer
    pub searchable_pdf: bool,
}

/// OCR result as returned by the provider.
///
/// Fields this service reads are typed; everything else is kept in `extra`
/// so the response can be handed back to clients unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    #[serde(rename = "ParsedResults", default, skip_serializing_if = "Vec::is_empty")]
    pub parsed_results: Vec<ParsedResult>,

    #[serde(rename = "OCRExitCode", default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i64>,

    #[serde(rename = "IsErroredOnProcessing", default)]
    pub is_errored_on_processing: bool,

    /// String, list of strings or null depending on the failure
    #[serde(rename = "ErrorMessage", default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<Value>,

    #[serde(rename = "SearchablePDFURL", default, skip_serializing_if = "Option::is_none")]
    pub searchable_pdf_url: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedResult {
    #[serde(rename = "ParsedText", default)]
    pub parsed_text: String,

    #[serde(rename = "FileParseExitCode", default, skip_serializing_if = "Option::is_none")]
    pub file_parse_exit_code: Option<i64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OcrResult {
    /// All recognized text, one block per parsed page/file
    pub fn text(&self) -> String {
        self.parsed_results
            .iter()
            .map(|r| r.parsed_text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Link to the generated searchable PDF.
    ///
    /// The provider fills this field with a sentence when no PDF was
    /// produced, so only absolute http(s) URLs are returned.
    pub fn searchable_pdf_url(&self) -> Option<&str> {
        let url = self.searchable_pdf_url.as_deref()?.trim();
        match reqwest::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Some(url),
            _ => None,
        }
    }

    /// Flattened error messages reported by the provider
    pub fn error_messages(&self) -> Vec<String> {
        match &self.error_message {
            Some(Value::String(msg)) if !msg.is_empty() => vec![msg.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("Failed to reach OCR service: {0}")]
    Transport(String),

    #[error("OCR service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid OCR response: {0}")]
    InvalidResponse(String),

    #[error("OCR processing failed: {0}")]
    Processing(String),

    #[error("OCR result has no searchable PDF")]
    NoSearchablePdf,

    #[error("Invalid OCR input: {0}")]
    InvalidInput(String),

    #[error("Failed to read input file: {0}")]
    Io(#[from] std::io::Error),
}

impl OcrError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
