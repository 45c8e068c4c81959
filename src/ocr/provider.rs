//! OCR Providers
//!
//! Defines the provider trait and the OCR.space implementation.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use super::types::{OcrError, OcrInput, OcrRequest, OcrResult};

/// OCR provider trait
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &'static str;

    /// Submit a single recognition request
    async fn recognize(&self, request: OcrRequest) -> Result<OcrResult, OcrError>;
}

/// OCR.space parse API provider
pub struct OcrSpaceProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl OcrSpaceProvider {
    pub fn new(endpoint: &str) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }

    /// Build the multipart form expected by `/parse/image`
    fn build_form(request: OcrRequest) -> Result<Form, OcrError> {
        let mut form = Form::new()
            .text("apikey", request.api_key)
            .text("isOverlayRequired", "false");

        if let Some(language) = request.language {
            form = form.text("language", language);
        }

        if request.searchable_pdf {
            form = form
                .text("isCreateSearchablePdf", "true")
                .text("isSearchablePdfHideTextLayer", "true");
        }

        let form = match request.input {
            OcrInput::Url(url) => form.text("url", url),
            OcrInput::Base64(data_uri) => form.text("base64Image", data_uri),
            OcrInput::File {
                file_name,
                mime_type,
                data,
            } => {
                let file_type = file_name
                    .rsplit_once('.')
                    .map(|(_, ext)| ext.to_ascii_uppercase());

                let part = Part::bytes(data)
                    .file_name(file_name)
                    .mime_str(&mime_type)
                    .map_err(|e| OcrError::InvalidInput(format!("Bad content type: {}", e)))?;

                let form = match file_type {
                    Some(file_type) => form.text("filetype", file_type),
                    None => form,
                };
                form.part("file", part)
            }
        };

        Ok(form)
    }
}

#[async_trait]
impl OcrProvider for OcrSpaceProvider {
    fn name(&self) -> &'static str {
        "ocr.space"
    }

    async fn recognize(&self, request: OcrRequest) -> Result<OcrResult, OcrError> {
        let form = Self::build_form(request)?;

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| OcrError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Api { status, body });
        }

        let result: OcrResult = response
            .json()
            .await
            .map_err(|e| OcrError::InvalidResponse(e.to_string()))?;

        if result.is_errored_on_processing {
            let messages = result.error_messages();
            let message = if messages.is_empty() {
                format!("exit code {:?}", result.exit_code)
            } else {
                messages.join("; ")
            };
            return Err(OcrError::Processing(message));
        }

        Ok(result)
    }
}

/// Mock provider for testing
#[cfg(test)]
pub struct MockProvider {
    pub response: Result<OcrResult, String>,
    pub requests: std::sync::Mutex<Vec<OcrRequest>>,
}

#[cfg(test)]
impl MockProvider {
    pub fn returning(response: OcrResult) -> Self {
        Self {
            response: Ok(response),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<OcrRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[cfg(test)]
#[async_trait]
impl OcrProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn recognize(&self, request: OcrRequest) -> Result<OcrResult, OcrError> {
        self.requests.lock().unwrap().push(request);
        match &self.response {
            Ok(result) => Ok(result.clone()),
            Err(message) => Err(OcrError::Api {
                status: 500,
                body: message.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_stub;
    use axum::{extract::Multipart, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Map, Value};

    /// Echo every form field back inside the provider's response shape
    async fn echo_form(mut multipart: Multipart) -> Json<Value> {
        let mut fields = Map::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let value = match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let len = field.bytes().await.unwrap().len();
                    json!({"fileName": file_name, "len": len})
                }
                None => Value::String(field.text().await.unwrap()),
            };
            fields.insert(name, value);
        }

        Json(json!({
            "ParsedResults": [{"ParsedText": "hello", "FileParseExitCode": 1}],
            "OCRExitCode": 1,
            "IsErroredOnProcessing": false,
            "SearchablePDFURL": "https://example.com/searchable.pdf",
            "Echo": fields
        }))
    }

    async fn echo_provider() -> OcrSpaceProvider {
        let base = serve_stub(Router::new().route("/parse/image", post(echo_form))).await;
        OcrSpaceProvider::new(&format!("{}/parse/image", base))
    }

    #[tokio::test]
    async fn test_url_request_fields() {
        let provider = echo_provider().await;

        let result = provider
            .recognize(OcrRequest {
                input: OcrInput::Url("https://example.com/receipt.png".to_string()),
                api_key: "helloworld".to_string(),
                language: None,
                searchable_pdf: false,
            })
            .await
            .unwrap();

        let echo = &result.extra["Echo"];
        assert_eq!(echo["apikey"], "helloworld");
        assert_eq!(echo["url"], "https://example.com/receipt.png");
        assert!(echo.get("isCreateSearchablePdf").is_none());
        assert!(echo.get("language").is_none());
        assert_eq!(result.text(), "hello");
    }

    #[tokio::test]
    async fn test_file_request_fields() {
        let provider = echo_provider().await;

        let result = provider
            .recognize(OcrRequest {
                input: OcrInput::File {
                    file_name: "1700000000000-0.pdf".to_string(),
                    mime_type: "application/pdf".to_string(),
                    data: b"%PDF-1.4".to_vec(),
                },
                api_key: "secret".to_string(),
                language: None,
                searchable_pdf: true,
            })
            .await
            .unwrap();

        let echo = &result.extra["Echo"];
        assert_eq!(echo["apikey"], "secret");
        assert_eq!(echo["filetype"], "PDF");
        assert_eq!(echo["isCreateSearchablePdf"], "true");
        assert_eq!(echo["isSearchablePdfHideTextLayer"], "true");
        assert_eq!(echo["file"]["fileName"], "1700000000000-0.pdf");
        assert_eq!(echo["file"]["len"], 8);
        assert_eq!(
            result.searchable_pdf_url(),
            Some("https://example.com/searchable.pdf")
        );
    }

    #[tokio::test]
    async fn test_base64_request_fields() {
        let provider = echo_provider().await;

        let result = provider
            .recognize(OcrRequest {
                input: OcrInput::Base64("data:image/png;base64,iVBORw0K".to_string()),
                api_key: "secret".to_string(),
                language: Some("eng".to_string()),
                searchable_pdf: true,
            })
            .await
            .unwrap();

        let echo = &result.extra["Echo"];
        assert_eq!(echo["base64Image"], "data:image/png;base64,iVBORw0K");
        assert_eq!(echo["language"], "eng");
        assert_eq!(echo["isCreateSearchablePdf"], "true");
    }

    #[tokio::test]
    async fn test_errored_processing_is_an_error() {
        let base = serve_stub(Router::new().route(
            "/parse/image",
            post(|| async {
                Json(json!({
                    "OCRExitCode": 99,
                    "IsErroredOnProcessing": true,
                    "ErrorMessage": ["Unable to recognize the file type"]
                }))
            }),
        ))
        .await;
        let provider = OcrSpaceProvider::new(&format!("{}/parse/image", base));

        let err = provider
            .recognize(OcrRequest {
                input: OcrInput::Url("https://example.com/x".to_string()),
                api_key: "k".to_string(),
                language: None,
                searchable_pdf: false,
            })
            .await
            .unwrap_err();

        match err {
            OcrError::Processing(msg) => assert!(msg.contains("Unable to recognize")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let base = serve_stub(Router::new().route(
            "/parse/image",
            post(|| async { (StatusCode::FORBIDDEN, "The API key is invalid") }),
        ))
        .await;
        let provider = OcrSpaceProvider::new(&format!("{}/parse/image", base));

        let err = provider
            .recognize(OcrRequest {
                input: OcrInput::Url("https://example.com/x".to_string()),
                api_key: "bad".to_string(),
                language: None,
                searchable_pdf: false,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, OcrError::Api { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        // Nothing listens on the discard port
        let provider = OcrSpaceProvider::new("http://127.0.0.1:9/parse/image");

        let err = provider
            .recognize(OcrRequest {
                input: OcrInput::Url("https://example.com/x".to_string()),
                api_key: "k".to_string(),
                language: None,
                searchable_pdf: false,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, OcrError::Transport(_)));
    }
}
