//! Upload Ingest
//!
//! Persists uploaded files into the upload directory under unique,
//! timestamp-derived names that keep the original extension.

mod naming;

pub use naming::{extension_of, NameGenerator};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use futures::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;

/// A file persisted by [`FileIngest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Location on disk
    pub path: PathBuf,
    /// Unique name shared by every artifact of the request
    pub base_name: String,
    /// Original extension without the dot, empty if none
    pub extension: String,
}

impl UploadedFile {
    /// Stored file name, `<base_name>.<extension>`
    pub fn file_name(&self) -> String {
        stored_name(&self.base_name, &self.extension)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Upload exceeds the configured size limit")]
    TooLarge,

    #[error("Failed to read upload stream: {0}")]
    Stream(String),

    #[error("Failed to write upload: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MultipartError> for IngestError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            IngestError::TooLarge
        } else {
            IngestError::Stream(e.body_text())
        }
    }
}

/// Writes uploads to the upload directory
#[derive(Clone)]
pub struct FileIngest {
    upload_dir: PathBuf,
    names: Arc<NameGenerator>,
}

impl FileIngest {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            names: Arc::new(NameGenerator::new()),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Stream an upload to disk.
    ///
    /// A partially written file is removed if the stream or the disk fails.
    pub async fn persist<S, B, E>(
        &self,
        original_name: &str,
        stream: S,
    ) -> Result<UploadedFile, IngestError>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Into<IngestError>,
    {
        let base_name = self.names.next_name();
        let extension = extension_of(original_name);
        let path = self.upload_dir.join(stored_name(&base_name, &extension));

        // create_new: a name collision is an error, never an overwrite
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        let written = match write_stream(&mut file, stream).await {
            Ok(written) => written,
            Err(e) => {
                drop(file);
                if let Err(rm) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(path = %path.display(), error = %rm, "Failed to remove partial upload");
                }
                return Err(e);
            }
        };

        tracing::info!(
            original_name = %original_name,
            path = %path.display(),
            size = written,
            "Upload stored"
        );

        Ok(UploadedFile {
            path,
            base_name,
            extension,
        })
    }
}

async fn write_stream<S, B, E>(file: &mut tokio::fs::File, stream: S) -> Result<u64, IngestError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<IngestError>,
{
    let mut stream = std::pin::pin!(stream);
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Into::<IngestError>::into)?;
        let bytes = chunk.as_ref();
        file.write_all(bytes).await?;
        written += bytes.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}

fn stored_name(base_name: &str, extension: &str) -> String {
    if extension.is_empty() {
        base_name.to_string()
    } else {
        format!("{}.{}", base_name, extension)
    }
}
