//! Script-backed table extractor
//!
//! Runs `<program> [<script>] <pdf> --output_file <csv>`. Both output pipes
//! are drained into the log while the process runs; a child that fills an
//! undrained pipe would block forever.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::Semaphore;

use super::{ExtractionError, TableExtractor};
use crate::config::ExtractorConfig;

/// Which pipe a line came from
#[derive(Debug, Clone, Copy)]
enum Channel {
    Stdout,
    Stderr,
}

/// Table extractor backed by an external script
pub struct ScriptExtractor {
    config: ExtractorConfig,
    /// Caps how many conversion processes run at once
    permits: Arc<Semaphore>,
}

impl ScriptExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self { config, permits }
    }

    /// Permits currently free
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    fn command(&self, pdf_path: &Path, csv_path: &Path) -> Command {
        let mut cmd = Command::new(&self.config.program);
        if let Some(script) = &self.config.script {
            cmd.arg(script);
        }
        cmd.arg(pdf_path)
            .arg("--output_file")
            .arg(csv_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

#[async_trait]
impl TableExtractor for ScriptExtractor {
    async fn extract_table(&self, pdf_path: &Path, csv_path: &Path) -> Result<(), ExtractionError> {
        if self.permits.available_permits() == 0 {
            tracing::debug!(pdf = %pdf_path.display(), "Waiting for a free extraction slot");
        }
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ExtractionError::Closed)?;

        tracing::info!(
            program = %self.config.program,
            pdf = %pdf_path.display(),
            csv = %csv_path.display(),
            "Starting table extraction"
        );

        let mut child = self
            .command(pdf_path, csv_path)
            .spawn()
            .map_err(|e| ExtractionError::Spawn {
                program: self.config.program.clone(),
                source: e,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (_, _, status) = tokio::join!(
            drain(stdout, Channel::Stdout),
            drain(stderr, Channel::Stderr),
            child.wait()
        );
        let status = status?;

        tracing::info!(code = ?status.code(), "Conversion process exited");

        if !status.success() {
            return Err(ExtractionError::NonZeroExit {
                code: status.code(),
            });
        }

        if tokio::fs::metadata(csv_path).await.is_err() {
            return Err(ExtractionError::MissingOutput(csv_path.to_path_buf()));
        }

        Ok(())
    }
}

/// Log every line written to a pipe until it closes
async fn drain<R>(reader: Option<R>, channel: Channel)
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return;
    };

    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                let text = text.trim_end();
                match channel {
                    Channel::Stdout => tracing::info!(stream = "stdout", "{}", text),
                    Channel::Stderr => tracing::warn!(stream = "stderr", "{}", text),
                }
            }
            Err(e) => {
                tracing::warn!(?channel, error = %e, "Failed to read conversion output");
                break;
            }
        }
    }
}
