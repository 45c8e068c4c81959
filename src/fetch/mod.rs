//! Searchable PDF download
//!
//! Streams a remote file straight to disk. A failed transfer removes the
//! partially written file; nothing is retried.

use std::path::Path;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Transfer from {url} interrupted: {message}")]
    Body { url: String, message: String },

    #[error("Failed to write download: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP downloader for OCR artifacts
#[derive(Clone, Default)]
pub struct PdfFetcher {
    client: reqwest::Client,
}

impl PdfFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Download `url` into `dest`, replacing any existing file.
    ///
    /// `dest` is only touched once the server has answered with a success
    /// status. Returns the number of bytes written.
    pub async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "Download request failed");
            DownloadError::Request {
                url: url.to_string(),
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(url = %url, status = status.as_u16(), "Download rejected");
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut file = tokio::fs::File::create(dest).await?;

        match write_body(&mut file, url, response).await {
            Ok(written) => {
                tracing::info!(url = %url, dest = %dest.display(), size = written, "File downloaded");
                Ok(written)
            }
            Err(e) => {
                drop(file);
                if let Err(rm) = tokio::fs::remove_file(dest).await {
                    tracing::warn!(dest = %dest.display(), error = %rm, "Failed to remove partial download");
                }
                tracing::error!(url = %url, error = %e, "Download failed");
                Err(e)
            }
        }
    }
}

async fn write_body(
    file: &mut tokio::fs::File,
    url: &str,
    response: reqwest::Response,
) -> Result<u64, DownloadError> {
    let mut body = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| DownloadError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}
