//! Input loading: turn a user-supplied path or URL into a [`StagedFile`].
//!
//! The declared type of a staged file is what the stager's MIME filter sees.
//! For downloads that is the server's `Content-Type`; for local files it is
//! sniffed from the leading bytes with `infer`, with the file extension as a
//! fallback for the two types the filters care about.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::ConvertError;
use crate::stager::StagedFile;

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load a local file or download a URL into memory.
pub async fn load_input(input: &str, timeout_secs: u64) -> Result<StagedFile, ConvertError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else if input.trim().is_empty() {
        Err(ConvertError::InvalidInput {
            input: input.to_string(),
        })
    } else {
        load_local(Path::new(input)).await
    }
}

async fn load_local(path: &Path) -> Result<StagedFile, ConvertError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ConvertError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ConvertError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime = sniff_mime(&bytes, &name);
    debug!("Loaded {} ({} bytes, {:?})", path.display(), bytes.len(), mime);

    Ok(StagedFile::new(name, mime, bytes))
}

/// Declared type of local content.
pub fn sniff_mime(bytes: &[u8], name: &str) -> Option<&'static str> {
    if let Some(kind) = infer::get(bytes) {
        return Some(kind.mime_type());
    }
    let ext = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())?;
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<StagedFile, ConvertError> {
    info!("Downloading {}", url);

    let failed = |reason: String| ConvertError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let classify = |e: reqwest::Error| {
        if e.is_timeout() {
            ConvertError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    };

    let response = client.get(url).send().await.map_err(classify)?;
    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let mime = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(content_type_essence);
    let name = filename_from_url(url);
    let bytes = response.bytes().await.map_err(classify)?;

    info!("Downloaded '{}' ({} bytes, {:?})", name, bytes.len(), mime);
    Ok(StagedFile::new(name, mime.as_deref(), bytes))
}

/// `image/jpeg; charset=binary` → `image/jpeg`.
fn content_type_essence(header: &str) -> String {
    header
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Last non-empty path segment of the URL, or `download`.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty())
        .unwrap_or_else(|| "download".to_string())
}

/// Load several inputs, in order.
pub async fn load_inputs(
    inputs: &[String],
    timeout_secs: u64,
) -> Result<Vec<StagedFile>, ConvertError> {
    let mut files = Vec::with_capacity(inputs.len());
    for input in inputs {
        files.push(load_input(input, timeout_secs).await?);
    }
    Ok(files)
}
