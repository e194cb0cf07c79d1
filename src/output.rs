//! Conversion results.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::Serialize;
use std::fmt;

use crate::stager::OperationKind;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// One produced output: file name, content type and bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Bytes,
}

impl Artifact {
    pub fn new(filename: impl Into<String>, mime_type: &'static str, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            mime_type,
            bytes: bytes.into(),
        }
    }

    pub fn pdf(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self::new(filename, MIME_PDF, bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `data:<mime>;base64,<payload>`.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Artifacts of a finished run, in emission order.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub kind: OperationKind,
    pub artifacts: Vec<Artifact>,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    pub fn filenames(&self) -> Vec<&str> {
        self.artifacts.iter().map(|a| a.filename.as_str()).collect()
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    /// Staged files consumed.
    pub input_files: usize,
    /// Units stepped over: images, pages, source documents or slides.
    pub units_processed: usize,
    pub artifacts: usize,
    pub output_bytes: u64,
    pub duration_ms: u64,
}
