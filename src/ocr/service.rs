//! OCR Client
//!
//! The three recognition modes exposed by the gateway, built on top of a
//! single [`OcrProvider`].

use std::path::Path;
use std::sync::Arc;

use base64::Engine;

use super::{
    provider::OcrProvider,
    types::{OcrError, OcrInput, OcrRequest, OcrResult},
};
use crate::config::OcrConfig;

/// Recognition front end shared by the HTTP handlers and the conversion workflow
#[derive(Clone)]
pub struct OcrClient {
    provider: Arc<dyn OcrProvider>,
    api_key: String,
    shared_api_key: String,
    language: String,
}

impl OcrClient {
    pub fn new(provider: Arc<dyn OcrProvider>, config: &OcrConfig) -> Self {
        Self {
            provider,
            api_key: config.api_key.clone(),
            shared_api_key: config.shared_api_key.clone(),
            language: config.language.clone(),
        }
    }

    /// Recognize a remote file using the shared, rate-limited key
    pub async fn recognize_from_url(&self, url: &str) -> Result<OcrResult, OcrError> {
        let request = OcrRequest {
            input: OcrInput::Url(url.to_string()),
            api_key: self.shared_api_key.clone(),
            language: None,
            searchable_pdf: false,
        };
        self.submit("url", request).await
    }

    /// Recognize a local PDF and request a searchable copy with a hidden text layer
    pub async fn recognize_from_local_file(&self, path: &Path) -> Result<OcrResult, OcrError> {
        let data = self.read_input("file", path).await?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.pdf".to_string());
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();

        let request = OcrRequest {
            input: OcrInput::File {
                file_name,
                mime_type,
                data,
            },
            api_key: self.api_key.clone(),
            language: None,
            searchable_pdf: true,
        };
        self.submit("file", request).await
    }

    /// Recognize a local image sent inline as a base64 data URI
    pub async fn recognize_from_local_image(
        &self,
        path: &Path,
        extension: &str,
    ) -> Result<OcrResult, OcrError> {
        if extension.is_empty() {
            return Err(OcrError::InvalidInput(
                "image upload has no file extension".to_string(),
            ));
        }

        let data = self.read_input("image", path).await?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&data);

        let request = OcrRequest {
            input: OcrInput::Base64(format!(
                "data:{};base64,{}",
                image_mime_type(extension),
                encoded
            )),
            api_key: self.api_key.clone(),
            language: Some(self.language.clone()),
            searchable_pdf: true,
        };
        self.submit("image", request).await
    }

    async fn read_input(&self, mode: &'static str, path: &Path) -> Result<Vec<u8>, OcrError> {
        tokio::fs::read(path).await.map_err(|e| {
            tracing::error!(mode, path = %path.display(), error = %e, "Failed to read OCR input");
            OcrError::Io(e)
        })
    }

    /// Forward to the provider; failures are logged and returned as-is, never retried
    async fn submit(&self, mode: &'static str, request: OcrRequest) -> Result<OcrResult, OcrError> {
        tracing::debug!(mode, provider = self.provider.name(), "Submitting OCR request");

        match self.provider.recognize(request).await {
            Ok(result) => {
                tracing::info!(
                    mode,
                    exit_code = ?result.exit_code,
                    pages = result.parsed_results.len(),
                    "OCR request completed"
                );
                Ok(result)
            }
            Err(e) => {
                tracing::error!(mode, provider = self.provider.name(), error = %e, "OCR request failed");
                Err(e)
            }
        }
    }
}

/// Content type for an image extension, e.g. `jpg` -> `image/jpeg`
fn image_mime_type(extension: &str) -> String {
    mime_guess::from_ext(extension)
        .iter()
        .find(|m| m.type_() == mime_guess::mime::IMAGE)
        .map(|m| m.to_string())
        .unwrap_or_else(|| format!("image/{}", extension.to_ascii_lowercase()))
}
