//! Error types for the docshift library.
//!
//! A single enum, [`ConvertError`], covers every failure, grouped by the stage
//! that detects it:
//!
//! * **Validation**: wrong input type, too few inputs, empty page range.
//!   These are found before any capability provider is called, so nothing has
//!   been read or written when they are returned. See
//!   [`ConvertError::is_validation`].
//!
//! * **Pipeline**: decode, render, page copy, text extraction, archive and
//!   serialisation failures raised while a conversion is running. Hosts
//!   usually collapse these into the operation's generic failure notice
//!   ([`crate::OperationKind::failure_notice`]) and log the detail.
//!
//! * **Input / output**: resolving a path or URL into a staged file, and
//!   writing artifacts to disk.

use std::path::PathBuf;
use thiserror::Error;

use crate::stager::OperationKind;

/// All errors returned by the docshift library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// A file does not pass the operation's type filter.
    #[error("'{name}' is not a valid input: expected {expected}")]
    WrongInputType { name: String, expected: &'static str },

    /// Fewer files are staged than the operation needs.
    #[error("{kind} needs at least {required} files, {staged} staged")]
    NotEnoughInputs {
        kind: OperationKind,
        required: usize,
        staged: usize,
    },

    /// The trigger was pulled with nothing staged.
    #[error("No file selected for {kind}")]
    NothingStaged { kind: OperationKind },

    /// A split range resolved to no pages. `total_pages` is unknown when the
    /// range holds no page tokens at all.
    #[error("Page range '{range}' selects no pages{}", document_size(.total_pages))]
    EmptyRange {
        range: String,
        total_pages: Option<usize>,
    },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The input string is neither a file path nor a valid URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// Input bytes could not be decoded (corrupt or unsupported file).
    #[error("Could not decode '{name}': {detail}")]
    Decode { name: String, detail: String },

    /// A page failed to render to a raster image.
    #[error("Rendering failed for page {page}: {detail}")]
    Render { page: usize, detail: String },

    /// Copying pages between documents failed.
    #[error("Page copy failed: {detail}")]
    PageCopy { detail: String },

    /// Text could not be extracted from a page or document.
    #[error("Text extraction failed: {detail}")]
    TextExtraction { detail: String },

    /// An archive entry could not be listed or read.
    #[error("Archive error: {detail}")]
    Archive { detail: String },

    /// An output document could not be serialised to bytes.
    #[error("Failed to write {format} output: {detail}")]
    Serialize { format: &'static str, detail: String },

    /// The PDF engine could not be bound.
    #[error(
        "PDF engine unavailable: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy."
    )]
    EngineUnavailable(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write an output artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output file exists and overwriting is disabled.
    #[error("Output file '{path}' already exists (use --overwrite)")]
    OutputExists { path: PathBuf },

    /// A data URL handed to the emitter is malformed.
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn document_size(total_pages: &Option<usize>) -> String {
    match total_pages {
        Some(n) => format!(" (document has {n} pages)"),
        None => String::new(),
    }
}

impl ConvertError {
    /// True for errors detected before a pipeline run starts.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ConvertError::WrongInputType { .. }
                | ConvertError::NotEnoughInputs { .. }
                | ConvertError::NothingStaged { .. }
                | ConvertError::EmptyRange { .. }
        )
    }

    pub(crate) fn decode(name: &str, detail: impl ToString) -> Self {
        ConvertError::Decode {
            name: name.to_string(),
            detail: detail.to_string(),
        }
    }
}
