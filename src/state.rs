//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::convert::ConversionOrchestrator;
use crate::extract::{ScriptExtractor, TableExtractor};
use crate::fetch::PdfFetcher;
use crate::ingest::FileIngest;
use crate::ocr::{OcrClient, OcrProvider, OcrSpaceProvider};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    ingest: FileIngest,
    ocr: OcrClient,
    orchestrator: ConversionOrchestrator,
}

impl AppState {
    /// Create the production state: OCR.space provider and script extractor
    pub fn new(config: Config) -> Self {
        let http = reqwest::Client::new();
        let provider = Arc::new(OcrSpaceProvider::with_client(http.clone(), &config.ocr.endpoint));
        let extractor = Arc::new(ScriptExtractor::new(config.extractor.clone()));

        Self::with_components(config, provider, PdfFetcher::new(http), extractor)
    }

    /// Create state from explicit collaborators
    pub fn with_components(
        config: Config,
        provider: Arc<dyn OcrProvider>,
        fetcher: PdfFetcher,
        extractor: Arc<dyn TableExtractor>,
    ) -> Self {
        let ingest = FileIngest::new(config.storage.upload_dir.clone());
        let ocr = OcrClient::new(provider, &config.ocr);
        let orchestrator = ConversionOrchestrator::new(
            ocr.clone(),
            fetcher,
            extractor,
            config.storage.output_dir.clone(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                ingest,
                ocr,
                orchestrator,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the upload ingest
    pub fn ingest(&self) -> &FileIngest {
        &self.inner.ingest
    }

    /// Get the OCR client
    pub fn ocr(&self) -> &OcrClient {
        &self.inner.ocr
    }

    /// Get the conversion workflow
    pub fn orchestrator(&self) -> &ConversionOrchestrator {
        &self.inner.orchestrator
    }

    /// Build a public download link for an artifact
    pub fn download_url(&self, download_name: &str) -> String {
        format!(
            "{}/download/{}",
            self.inner.config.server.public_url.trim_end_matches('/'),
            download_name
        )
    }
}
