//! Table Extraction
//!
//! Converts a text-readable PDF into CSV by delegating to an external
//! process. The production implementation runs a script; tests swap in
//! their own [`TableExtractor`].

mod script;

pub use script::ScriptExtractor;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Converts a PDF into a CSV file
#[async_trait]
pub trait TableExtractor: Send + Sync {
    /// Write the tables found in `pdf_path` to `csv_path`
    async fn extract_table(&self, pdf_path: &Path, csv_path: &Path) -> Result<(), ExtractionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Conversion process exited with {}", exit_label(.code))]
    NonZeroExit { code: Option<i32> },

    #[error("Conversion process produced no output at {0}")]
    MissingOutput(PathBuf),

    #[error("Conversion process failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extraction pool is shut down")]
    Closed,
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Test extractor that copies the PDF bytes it sees into the CSV path
#[cfg(test)]
pub struct CopyExtractor {
    pub seen: std::sync::Mutex<Vec<(PathBuf, Vec<u8>)>>,
}

#[cfg(test)]
impl CopyExtractor {
    pub fn new() -> Self {
        Self {
            seen: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[cfg(test)]
#[async_trait]
impl TableExtractor for CopyExtractor {
    async fn extract_table(&self, pdf_path: &Path, csv_path: &Path) -> Result<(), ExtractionError> {
        let data = tokio::fs::read(pdf_path).await?;
        tokio::fs::write(csv_path, &data).await?;
        self.seen
            .lock()
            .unwrap()
            .push((pdf_path.to_path_buf(), data));
        Ok(())
    }
}
