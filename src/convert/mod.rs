//! PDF to CSV conversion workflow
//!
//! Each request walks an explicit state machine:
//!
//! ```text
//! Ingested --direct--------------------------------> Readable --extract--> Extracted
//!    |                                                  ^
//!    +--ocr--> OCR(local file) --> Recognized --fetch---+
//! ```
//!
//! On the OCR path the searchable PDF is downloaded over the uploaded file,
//! so the extractor always reads from the upload path. Nothing is rolled back
//! when a stage fails.

use std::path::PathBuf;
use std::sync::Arc;

use crate::extract::{ExtractionError, TableExtractor};
use crate::fetch::{DownloadError, PdfFetcher};
use crate::ingest::UploadedFile;
use crate::ocr::{OcrClient, OcrError};

/// How to make the uploaded PDF readable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionMode {
    /// The PDF already has a text layer
    Direct,
    /// Run OCR and convert the searchable PDF it produces
    Ocr,
}

impl ConversionMode {
    /// Parse the `ocrEnabled` flag.
    ///
    /// `"true"` marks the PDF as already readable; only the exact literals
    /// are accepted.
    pub fn from_flag(flag: Option<&str>) -> Option<Self> {
        match flag {
            Some("true") => Some(Self::Direct),
            Some("false") => Some(Self::Ocr),
            _ => None,
        }
    }
}

/// A finished conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionArtifact {
    pub csv_path: PathBuf,
    /// File name served by `/download/:filename`
    pub download_name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

#[derive(Debug)]
enum Stage {
    Ingested(UploadedFile),
    Recognized {
        upload: UploadedFile,
        searchable_url: String,
    },
    Readable(UploadedFile),
    Extracted(ConversionArtifact),
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::Ingested(_) => "ingested",
            Stage::Recognized { .. } => "recognized",
            Stage::Readable(_) => "readable",
            Stage::Extracted(_) => "extracted",
        }
    }
}

/// Drives uploads through OCR, download and table extraction
#[derive(Clone)]
pub struct ConversionOrchestrator {
    ocr: OcrClient,
    fetcher: PdfFetcher,
    extractor: Arc<dyn TableExtractor>,
    output_dir: PathBuf,
}

impl ConversionOrchestrator {
    pub fn new(
        ocr: OcrClient,
        fetcher: PdfFetcher,
        extractor: Arc<dyn TableExtractor>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ocr,
            fetcher,
            extractor,
            output_dir: output_dir.into(),
        }
    }

    /// Convert an ingested PDF into a CSV artifact
    pub async fn run(
        &self,
        upload: UploadedFile,
        mode: ConversionMode,
    ) -> Result<ConversionArtifact, ConversionError> {
        let base_name = upload.base_name.clone();
        let mut stage = Stage::Ingested(upload);

        loop {
            tracing::debug!(base_name = %base_name, stage = stage.name(), ?mode, "Conversion stage");

            stage = match stage {
                Stage::Ingested(upload) => match mode {
                    ConversionMode::Direct => Stage::Readable(upload),
                    ConversionMode::Ocr => self.recognize(upload).await?,
                },
                Stage::Recognized {
                    upload,
                    searchable_url,
                } => {
                    // overwrites the original upload in place
                    self.fetcher
                        .download_to(&searchable_url, &upload.path)
                        .await?;
                    Stage::Readable(upload)
                }
                Stage::Readable(upload) => Stage::Extracted(self.extract(&upload).await?),
                Stage::Extracted(artifact) => {
                    tracing::info!(
                        base_name = %base_name,
                        csv = %artifact.csv_path.display(),
                        ?mode,
                        "PDF converted to CSV"
                    );
                    return Ok(artifact);
                }
            };
        }
    }

    async fn recognize(&self, upload: UploadedFile) -> Result<Stage, ConversionError> {
        let result = self.ocr.recognize_from_local_file(&upload.path).await?;

        let searchable_url = result
            .searchable_pdf_url()
            .ok_or(OcrError::NoSearchablePdf)?
            .to_string();

        Ok(Stage::Recognized {
            upload,
            searchable_url,
        })
    }

    async fn extract(&self, upload: &UploadedFile) -> Result<ConversionArtifact, ConversionError> {
        let download_name = format!("{}.csv", upload.base_name);
        let csv_path = self.output_dir.join(&download_name);

        self.extractor.extract_table(&upload.path, &csv_path).await?;

        Ok(ConversionArtifact {
            csv_path,
            download_name,
        })
    }
}
