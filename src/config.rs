//! Configuration management for the OCR Gateway

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Public OCR.space key, limited to 10 requests per 10 minutes.
pub const DEFAULT_SHARED_API_KEY: &str = "helloworld";

/// OCR.space parse endpoint
pub const DEFAULT_OCR_API_URL: &str = "https://api.ocr.space/parse/image";

/// Upload body cap: 100MB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
    pub storage: StorageConfig,
    pub extractor: ExtractorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL used when building download links
    pub public_url: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub endpoint: String,
    /// Caller-held key for local file and image uploads
    pub api_key: String,
    /// Rate-limited shared key for remote URL recognition
    pub shared_api_key: String,
    /// Recognition language for image uploads
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    pub program: String,
    /// Script passed as the first argument, if any
    pub script: Option<PathBuf>,
    pub max_concurrent: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                public_url: "http://localhost:3000".to_string(),
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            ocr: OcrConfig {
                endpoint: DEFAULT_OCR_API_URL.to_string(),
                api_key: DEFAULT_SHARED_API_KEY.to_string(),
                shared_api_key: DEFAULT_SHARED_API_KEY.to_string(),
                language: "eng".to_string(),
            },
            storage: StorageConfig {
                upload_dir: PathBuf::from("uploads"),
                output_dir: PathBuf::from("outputs"),
                static_dir: PathBuf::from("public"),
            },
            extractor: ExtractorConfig {
                program: "python3".to_string(),
                script: Some(PathBuf::from("script.py")),
                max_concurrent: default_concurrency(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key))
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// A missing `API_KEY` falls back to the shared key; every other
    /// variable is still honored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|_| default.to_string());

        let port: u16 = var_or("SERVER_PORT", "3000").parse().unwrap_or(3000);

        let script = match lookup("EXTRACTOR_SCRIPT") {
            Ok(value) if value.trim().is_empty() => None,
            Ok(value) => Some(PathBuf::from(value)),
            Err(_) => Some(PathBuf::from("script.py")),
        };

        let shared_api_key = var_or("OCR_SHARED_API_KEY", DEFAULT_SHARED_API_KEY);
        let api_key = lookup("API_KEY").unwrap_or_else(|e| {
            tracing::warn!("API_KEY not usable ({}), falling back to the shared OCR key", e);
            shared_api_key.clone()
        });

        Config {
            server: ServerConfig {
                host: var_or("SERVER_HOST", "0.0.0.0"),
                port,
                public_url: lookup("PUBLIC_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(|_| format!("http://localhost:{}", port)),
                max_upload_bytes: lookup("MAX_UPLOAD_BYTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            },
            ocr: OcrConfig {
                endpoint: var_or("OCR_API_URL", DEFAULT_OCR_API_URL),
                api_key,
                shared_api_key,
                language: var_or("OCR_LANGUAGE", "eng"),
            },
            storage: StorageConfig {
                upload_dir: PathBuf::from(var_or("UPLOAD_DIR", "uploads")),
                output_dir: PathBuf::from(var_or("OUTPUT_DIR", "outputs")),
                static_dir: PathBuf::from(var_or("STATIC_DIR", "public")),
            },
            extractor: ExtractorConfig {
                program: var_or("EXTRACTOR_PROGRAM", "python3"),
                script,
                max_concurrent: lookup("EXTRACTOR_MAX_CONCURRENT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|n: &usize| *n > 0)
                    .unwrap_or_else(default_concurrency),
            },
        }
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
