//! Output emission: hand finished artifacts to their destination.
//!
//! The CLI writes into a directory with [`DirectoryEmitter`]; embedders that
//! want the bytes use [`MemoryEmitter`]. Artifacts of a run are emitted one at
//! a time, in order; nothing is bundled into an archive.

use std::io::Write;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::ConvertError;
use crate::output::{Artifact, MIME_DOCX, MIME_JPEG, MIME_PDF};

/// Destination for produced artifacts.
pub trait OutputEmitter: Send {
    fn emit(&mut self, artifact: &Artifact) -> Result<(), ConvertError>;

    /// Emit a pre-encoded `data:<mime>;base64,<payload>` URL under `filename`.
    fn emit_data_url(&mut self, data_url: &str, filename: &str) -> Result<(), ConvertError> {
        let artifact = decode_data_url(data_url, filename)?;
        self.emit(&artifact)
    }
}

/// Parse a base64 data URL into an artifact named `filename`.
pub fn decode_data_url(data_url: &str, filename: &str) -> Result<Artifact, ConvertError> {
    let invalid = |why: &str| ConvertError::InvalidDataUrl(why.to_string());

    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| invalid("missing 'data:' scheme"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| invalid("missing ',' before payload"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| invalid("only base64 payloads are supported"))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| ConvertError::InvalidDataUrl(e.to_string()))?;

    Ok(Artifact::new(filename, known_mime(mime), bytes))
}

fn known_mime(mime: &str) -> &'static str {
    [MIME_PDF, MIME_JPEG, MIME_DOCX, "image/png"]
        .into_iter()
        .find(|m| m.eq_ignore_ascii_case(mime))
        .unwrap_or("application/octet-stream")
}

// ── Directory ────────────────────────────────────────────────────────────

/// Writes each artifact as `<dir>/<filename>`.
///
/// Files are written to a temporary file in the same directory and renamed
/// into place, so a failed run never leaves a partial artifact behind.
#[derive(Debug)]
pub struct DirectoryEmitter {
    dir: PathBuf,
    overwrite: bool,
    written: Vec<PathBuf>,
}

impl DirectoryEmitter {
    /// Emit into `dir`, creating it if needed. Existing files are replaced.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ConvertError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| ConvertError::OutputWriteFailed {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            overwrite: true,
            written: Vec::new(),
        })
    }

    /// Refuse to replace existing files.
    pub fn no_clobber(mut self) -> Self {
        self.overwrite = false;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far, in emission order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn target(&self, filename: &str) -> Result<PathBuf, ConvertError> {
        // Only the final component is honoured; artifacts never escape `dir`.
        let name = Path::new(filename)
            .file_name()
            .ok_or_else(|| ConvertError::Internal(format!("unusable artifact name '{filename}'")))?;
        Ok(self.dir.join(name))
    }
}

impl OutputEmitter for DirectoryEmitter {
    fn emit(&mut self, artifact: &Artifact) -> Result<(), ConvertError> {
        let path = self.target(&artifact.filename)?;
        if !self.overwrite && path.exists() {
            return Err(ConvertError::OutputExists { path });
        }
        let write_err = |source: std::io::Error| ConvertError::OutputWriteFailed {
            path: path.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        tmp.write_all(&artifact.bytes).map_err(write_err)?;
        let persisted = if self.overwrite {
            tmp.persist(&path)
        } else {
            tmp.persist_noclobber(&path)
        };
        persisted.map_err(|e| write_err(e.error))?;

        info!("Wrote {} ({} bytes)", path.display(), artifact.len());
        self.written.push(path);
        Ok(())
    }
}

// ── Memory ───────────────────────────────────────────────────────────────

/// Keeps emitted artifacts in memory.
#[derive(Debug, Default)]
pub struct MemoryEmitter {
    artifacts: Vec<Artifact>,
}

impl MemoryEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn into_artifacts(self) -> Vec<Artifact> {
        self.artifacts
    }
}

impl OutputEmitter for MemoryEmitter {
    fn emit(&mut self, artifact: &Artifact) -> Result<(), ConvertError> {
        debug!("Collected '{}' ({} bytes)", artifact.filename, artifact.len());
        self.artifacts.push(artifact.clone());
        Ok(())
    }
}
