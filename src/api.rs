//! HTTP client for the pipeline analysis backend.
//!
//! The backend exposes a single `POST /upload/` endpoint taking a multipart
//! form with either a `file` part or a `url` text part.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;

pub const UPLOAD_PATH: &str = "/upload/";

/// Errors that can occur when talking to the analysis backend
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Either file or url must be provided.")]
    MissingInput,

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Timeout waiting for response")]
    Timeout,

    #[error("Backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Backend response was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A pipeline file picked by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    /// Filename sent in the multipart part
    pub name: String,
}

impl SelectedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "pipeline.yaml".to_string());
        Self { path, name }
    }
}

/// What gets submitted. At most one of the two is expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzeInput {
    pub file: Option<SelectedFile>,
    pub url: Option<String>,
}

/// The part that will actually be sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource<'a> {
    File(&'a SelectedFile),
    Url(&'a str),
}

impl AnalyzeInput {
    pub fn from_file(file: SelectedFile) -> Self {
        Self {
            file: Some(file),
            url: None,
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            file: None,
            url: Some(url.into()),
        }
    }

    /// File takes precedence over URL. An empty URL counts as absent.
    pub fn source(&self) -> Result<InputSource<'_>, ApiError> {
        if let Some(file) = &self.file {
            return Ok(InputSource::File(file));
        }
        match self.url.as_deref() {
            Some(url) if !url.is_empty() => Ok(InputSource::Url(url)),
            _ => Err(ApiError::MissingInput),
        }
    }
}

/// Anything that can analyze a pipeline. The TUI holds one of these so tests
/// can swap in a fake transport.
#[async_trait]
pub trait PipelineAnalyzer: Send + Sync {
    /// Submit the input and return the backend's JSON body
    async fn analyze(&self, input: &AnalyzeInput) -> Result<Value, ApiError>;

    /// Where requests go, for display and logging
    fn endpoint(&self) -> String;
}

#[derive(Clone)]
pub struct AnalyzerClient {
    client: Client,
    base_url: String,
}

impl AnalyzerClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::with_timeout(&config.base_url, config.request_timeout())
    }

    pub fn upload_url(&self) -> String {
        format!("{}{}", self.base_url, UPLOAD_PATH)
    }

    async fn build_form(source: InputSource<'_>) -> Result<Form, ApiError> {
        let form = match source {
            InputSource::File(file) => {
                let bytes = read_file(&file.path).await?;
                Form::new().part("file", Part::bytes(bytes).file_name(file.name.clone()))
            }
            InputSource::Url(url) => Form::new().text("url", url.to_string()),
        };
        Ok(form)
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>, ApiError> {
    tokio::fs::read(path).await.map_err(|source| ApiError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[async_trait]
impl PipelineAnalyzer for AnalyzerClient {
    async fn analyze(&self, input: &AnalyzeInput) -> Result<Value, ApiError> {
        let source = input.source()?;
        let form = Self::build_form(source).await?;
        let url = self.upload_url();

        match source {
            InputSource::File(file) => {
                info!(endpoint = %url, file = %file.name, "submitting pipeline file")
            }
            InputSource::Url(remote) => {
                info!(endpoint = %url, remote, "submitting pipeline url")
            }
        }

        // reqwest sets the multipart/form-data content type along with its boundary
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }

        debug!(bytes = body.len(), %status, "received analysis response");
        Ok(serde_json::from_str(&body)?)
    }

    fn endpoint(&self) -> String {
        self.upload_url()
    }
}

fn map_transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_requires_some_input() {
        assert!(matches!(
            AnalyzeInput::default().source(),
            Err(ApiError::MissingInput)
        ));
    }

    #[test]
    fn test_empty_url_counts_as_missing() {
        assert!(matches!(
            AnalyzeInput::from_url("").source(),
            Err(ApiError::MissingInput)
        ));
    }

    #[test]
    fn test_file_wins_over_url() {
        let file = SelectedFile::from_path("ci/pipeline.yaml");
        let input = AnalyzeInput {
            file: Some(file.clone()),
            url: Some("https://example.com/ci.yaml".to_string()),
        };
        assert_eq!(input.source().unwrap(), InputSource::File(&file));
    }

    #[test]
    fn test_selected_file_keeps_filename() {
        let file = SelectedFile::from_path("/tmp/work/.github/build.yml");
        assert_eq!(file.name, "build.yml");
    }

    #[test]
    fn test_upload_url_joins_cleanly() {
        let client = AnalyzerClient::new("http://localhost:8000/");
        assert_eq!(client.upload_url(), "http://localhost:8000/upload/");
        assert_eq!(client.endpoint(), client.upload_url());
    }

    #[tokio::test]
    async fn test_analyze_fails_fast_without_input() {
        // Port 9 is discard; no request should be attempted anyway
        let client = AnalyzerClient::new("http://127.0.0.1:9");
        let result = client.analyze(&AnalyzeInput::default()).await;
        assert!(matches!(result, Err(ApiError::MissingInput)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let client = AnalyzerClient::new("http://127.0.0.1:9");
        let input = AnalyzeInput::from_file(SelectedFile::from_path(dir.path().join("gone.yaml")));
        let result = client.analyze(&input).await;
        assert!(matches!(result, Err(ApiError::Io { .. })));
    }
}
