//! Input resolution: turn a user-supplied path, URL or byte buffer into a
//! local document handle.
//!
//! pdfium needs a file-system path. URL inputs are downloaded into a
//! `TempDir` and in-memory uploads are written to a `NamedTempFile`; both are
//! removed when the [`ResolvedInput`] is dropped, so every run cleans up
//! after itself. Local paths are passed through untouched: whether they can
//! be opened is the extractor's call, and it degrades instead of failing.

use crate::error::WorkflowError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info};

/// The resolved input: a local path or a temp file owned for the run.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; the document lives in a temp directory.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
    /// Input was an in-memory upload written to a temp file.
    Uploaded(NamedTempFile),
}

impl ResolvedInput {
    /// Get the path to the document regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
            ResolvedInput::Uploaded(tmp) => tmp.path(),
        }
    }

    /// Persist an uploaded buffer to a temp file with the given suffix.
    pub fn from_bytes(bytes: &[u8], suffix: &str) -> Result<Self, WorkflowError> {
        let mut tmp = tempfile::Builder::new()
            .prefix("agentflow-upload-")
            .suffix(suffix)
            .tempfile()
            .map_err(|e| WorkflowError::Internal(format!("tempfile: {e}")))?;
        tmp.write_all(bytes)
            .map_err(|e| WorkflowError::Internal(format!("tempfile write: {e}")))?;
        debug!("Upload written to {}", tmp.path().display());
        Ok(ResolvedInput::Uploaded(tmp))
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local document path.
///
/// URLs are downloaded; anything else is treated as a local path.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, WorkflowError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        Ok(ResolvedInput::Local(PathBuf::from(input)))
    }
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, WorkflowError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| WorkflowError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            WorkflowError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            WorkflowError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(WorkflowError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = filename_from_url(url);
    let temp_dir = TempDir::new().map_err(|e| WorkflowError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| WorkflowError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| WorkflowError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment of the URL when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}
