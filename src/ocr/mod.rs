//! OCR Module
//!
//! Client for the OCR.space recognition API.
//!
//! Three modes are supported:
//! - remote URL, using the shared default key
//! - local PDF, returning a searchable PDF with a hidden text layer
//! - local image, sent inline as base64 with a fixed language
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ocr_gateway::ocr::{OcrClient, OcrSpaceProvider};
//!
//! let provider = Arc::new(OcrSpaceProvider::new(&config.ocr.endpoint));
//! let client = OcrClient::new(provider, &config.ocr);
//!
//! let result = client.recognize_from_local_file(&upload.path).await?;
//! let searchable = result.searchable_pdf_url();
//! ```

mod provider;
mod service;
mod types;

pub use provider::{OcrProvider, OcrSpaceProvider};
pub use service::OcrClient;
pub use types::{OcrError, OcrInput, OcrRequest, OcrResult, ParsedResult};

#[cfg(test)]
pub(crate) use provider::MockProvider;
