//! Shared fixtures for unit and route tests

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Bytes;
use axum::Router;
use axum_test::{TestRequest, TestServer};
use serde_json::json;
use tempfile::TempDir;

use crate::config::Config;
use crate::extract::{CopyExtractor, ScriptExtractor, TableExtractor};
use crate::fetch::PdfFetcher;
use crate::ocr::{MockProvider, OcrResult};
use crate::state::AppState;

const BOUNDARY: &str = "ocr-gateway-test-boundary";

/// Serve a router on an ephemeral local port and return its base URL
pub async fn serve_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Write a shell script to `dir` and return its path
#[cfg(unix)]
pub fn write_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("convert.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    path
}

/// A successful provider response pointing at a searchable PDF
pub fn searchable_result(url: &str) -> OcrResult {
    serde_json::from_value(json!({
        "ParsedResults": [{"ParsedText": "scanned text", "FileParseExitCode": 1}],
        "OCRExitCode": 1,
        "IsErroredOnProcessing": false,
        "SearchablePDFURL": url
    }))
    .unwrap()
}

/// Build a single-file multipart POST
pub fn upload_request(
    server: &TestServer,
    path: &str,
    field: &str,
    file_name: &str,
    data: &[u8],
) -> TestRequest {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    server
        .post(path)
        .bytes(Bytes::from(body))
        .content_type(&format!("multipart/form-data; boundary={}", BOUNDARY))
}

/// A full application over a temporary directory tree
pub struct TestApp {
    pub server: TestServer,
    pub provider: Arc<MockProvider>,
    pub extractor: Arc<CopyExtractor>,
    temp_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_ocr_result(OcrResult::default())
    }

    pub fn with_ocr_result(result: OcrResult) -> Self {
        Self::build(Arc::new(MockProvider::returning(result)), None, |_| {})
    }

    pub fn with_failing_ocr(message: &str) -> Self {
        Self::build(Arc::new(MockProvider::failing(message)), None, |_| {})
    }

    pub fn with_upload_limit(max_upload_bytes: usize) -> Self {
        let provider = Arc::new(MockProvider::returning(OcrResult::default()));
        Self::build(provider, None, |config| {
            config.server.max_upload_bytes = max_upload_bytes;
        })
    }

    /// Run conversions through a real `sh` script
    #[cfg(unix)]
    pub fn with_script(body: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let script = write_script(temp_dir.path(), body);
        let provider = Arc::new(MockProvider::returning(OcrResult::default()));
        Self::build_in(temp_dir, provider, Some(script), |_| {})
    }

    fn build(
        provider: Arc<MockProvider>,
        script: Option<PathBuf>,
        configure: impl FnOnce(&mut Config),
    ) -> Self {
        Self::build_in(TempDir::new().unwrap(), provider, script, configure)
    }

    fn build_in(
        temp_dir: TempDir,
        provider: Arc<MockProvider>,
        script: Option<PathBuf>,
        configure: impl FnOnce(&mut Config),
    ) -> Self {
        let root = temp_dir.path();
        let mut config = Config::default();
        config.server.public_url = "http://localhost:3000".to_string();
        config.storage.upload_dir = root.join("uploads");
        config.storage.output_dir = root.join("outputs");
        config.storage.static_dir = root.join("public");
        configure(&mut config);

        std::fs::create_dir_all(&config.storage.upload_dir).unwrap();
        std::fs::create_dir_all(&config.storage.output_dir).unwrap();
        std::fs::create_dir_all(&config.storage.static_dir).unwrap();
        std::fs::write(
            config.storage.static_dir.join("index.html"),
            "<h1>OCR Gateway</h1>",
        )
        .unwrap();

        let copy_extractor = Arc::new(CopyExtractor::new());
        let extractor: Arc<dyn TableExtractor> = match script {
            Some(script) => {
                config.extractor.program = "sh".to_string();
                config.extractor.script = Some(script);
                Arc::new(ScriptExtractor::new(config.extractor.clone()))
            }
            None => copy_extractor.clone(),
        };

        let state = AppState::with_components(
            config,
            provider.clone(),
            PdfFetcher::default(),
            extractor,
        );
        let server = TestServer::new(crate::app(state)).unwrap();

        Self {
            server,
            provider,
            extractor: copy_extractor,
            temp_dir,
        }
    }

    pub fn root(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.root().join("uploads")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root().join("outputs")
    }
}
