//! Input resolution: turn a user-supplied path or URL into a local PDF file.
//!
//! pdfium only opens files, so a URL is downloaded into a `TempDir` that lives
//! as long as the [`ResolvedInput`]. Both paths check the `%PDF` magic bytes
//! before anything is handed to pdfium.

use crate::error::TranslatorError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

/// A local PDF ready for extraction.
pub enum ResolvedInput {
    Local(PathBuf),
    /// Downloaded copy; the temp directory is removed on drop.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }

    /// Where output should default to: next to a local file, or in the
    /// working directory under the downloaded file name.
    pub fn output_anchor(&self) -> PathBuf {
        match self {
            ResolvedInput::Local(p) => p.clone(),
            ResolvedInput::Downloaded { path, .. } => path
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("downloaded.pdf")),
        }
    }
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` to a readable local PDF, downloading URLs first.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, TranslatorError> {
    if input.trim().is_empty() {
        return Err(TranslatorError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(Path::new(input))
    }
}

fn resolve_local(path: &Path) -> Result<ResolvedInput, TranslatorError> {
    let path = path.to_path_buf();
    if !path.is_file() {
        return Err(TranslatorError::FileNotFound { path });
    }

    let mut file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(TranslatorError::PermissionDenied { path });
        }
        Err(_) => return Err(TranslatorError::FileNotFound { path }),
    };

    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_ok() {
        check_magic(&path, magic)?;
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

fn check_magic(path: &Path, magic: [u8; 4]) -> Result<(), TranslatorError> {
    if &magic != b"%PDF" {
        return Err(TranslatorError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, TranslatorError> {
    info!("Downloading PDF from: {}", url);
    let failed = |reason: String| TranslatorError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            failed(format!("timed out after {}s", timeout_secs))
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let filename = filename_from_url(url);
    let temp_dir = TempDir::new().map_err(|e| TranslatorError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    if bytes.len() >= 4 {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        check_magic(&file_path, magic)?;
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| TranslatorError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());
    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment of `url` when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.'))
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}
