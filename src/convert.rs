//! Eager conversion entry points.
//!
//! [`convert`] runs a whole operation and returns every artifact at once,
//! together with [`ConversionStats`]. Use [`crate::stream::convert_stream`]
//! instead to receive artifacts as they are produced, or
//! [`crate::session::ConversionSession`] for the stage-then-trigger flow.

use std::path::Path;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::capability::Capabilities;
use crate::config::ConversionConfig;
use crate::emit::{DirectoryEmitter, OutputEmitter};
use crate::error::ConvertError;
use crate::output::{Artifact, ConversionOutput, ConversionStats};
use crate::pipeline::{self, input};
use crate::progress;
use crate::stager::{FileStager, OperationKind, StagedFile};

/// Pass `files` through a fresh stager for `kind`, in order.
///
/// The first rejected file aborts with [`ConvertError::WrongInputType`].
/// Single-file operations keep only the last file, exactly as repeated
/// selection does in a session.
pub fn stage_all(kind: OperationKind, files: Vec<StagedFile>) -> Result<Vec<StagedFile>, ConvertError> {
    let mut stager = FileStager::new(kind);
    for file in files {
        stager.accept(file)?;
    }
    Ok(stager.files().to_vec())
}

/// Run `kind` over `files` and collect the artifacts.
///
/// The pipeline runs on a blocking worker thread. Validation happens before
/// any capability call, so a validation error means nothing was read.
///
/// # Errors
/// Validation errors ([`ConvertError::is_validation`]) or the first pipeline
/// error. Either way the progress callback receives the kind's failure
/// notice.
pub async fn convert(
    kind: OperationKind,
    files: Vec<StagedFile>,
    config: &ConversionConfig,
    caps: &Capabilities,
) -> Result<ConversionOutput, ConvertError> {
    let start = Instant::now();
    let input_files = files.len();
    let cfg = config.clone();
    let caps = caps.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut artifacts = Vec::new();
        let units = pipeline::run_blocking(kind, &files, &cfg, &caps, &mut |artifact| {
            artifacts.push(artifact);
            Ok(())
        })?;
        Ok::<_, ConvertError>((units, artifacts))
    })
    .await
    .map_err(|e| ConvertError::Internal(format!("conversion task panicked: {e}")))
    .and_then(|r| r);

    let (units, artifacts) = match result {
        Ok(done) => done,
        Err(e) => {
            report_failure(kind, config, &e);
            return Err(e);
        }
    };

    let stats = stats_for(input_files, units, &artifacts, start);
    info!(
        "{} complete: {} artifact(s), {} bytes, {}ms",
        kind, stats.artifacts, stats.output_bytes, stats.duration_ms
    );
    progress::or_noop(config.progress_callback.as_ref()).on_conversion_complete(kind, artifacts.len());

    Ok(ConversionOutput {
        kind,
        artifacts,
        stats,
    })
}

/// Log a failed run and hand the generic notice to the callback.
pub(crate) fn report_failure(kind: OperationKind, config: &ConversionConfig, err: &ConvertError) {
    if err.is_validation() {
        warn!("{} rejected: {}", kind, err);
    } else {
        error!("{} failed: {}", kind, err);
    }
    progress::or_noop(config.progress_callback.as_ref())
        .on_conversion_failed(kind, kind.failure_notice());
}

pub(crate) fn stats_for(
    input_files: usize,
    units: usize,
    artifacts: &[Artifact],
    start: Instant,
) -> ConversionStats {
    ConversionStats {
        input_files,
        units_processed: units,
        artifacts: artifacts.len(),
        output_bytes: artifacts.iter().map(|a| a.len() as u64).sum(),
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

/// Synchronous wrapper around [`convert`]. Creates a tokio runtime internally.
///
/// Must not be called from inside an async context.
pub fn convert_sync(
    kind: OperationKind,
    files: Vec<StagedFile>,
    config: &ConversionConfig,
    caps: &Capabilities,
) -> Result<ConversionOutput, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(kind, files, config, caps))
}

/// Convert and write every artifact into `output_dir`.
///
/// Artifacts are written only after the whole run has succeeded, so a failed
/// conversion leaves the directory untouched.
pub async fn convert_to_dir(
    kind: OperationKind,
    files: Vec<StagedFile>,
    output_dir: impl AsRef<Path>,
    config: &ConversionConfig,
    caps: &Capabilities,
) -> Result<ConversionOutput, ConvertError> {
    let output = convert(kind, files, config, caps).await?;
    let mut emitter = DirectoryEmitter::new(output_dir.as_ref())?;
    for artifact in &output.artifacts {
        emitter.emit(artifact)?;
    }
    Ok(output)
}

/// Page count of a PDF given as a path or URL. URLs are fetched with
/// `config.download_timeout_secs`.
pub async fn inspect(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
    caps: &Capabilities,
) -> Result<usize, ConvertError> {
    let file = input::load_input(input_str.as_ref(), config.download_timeout_secs).await?;
    inspect_bytes(file.bytes.to_vec(), caps).await
}

/// Page count of in-memory PDF bytes.
pub async fn inspect_bytes(pdf: Vec<u8>, caps: &Capabilities) -> Result<usize, ConvertError> {
    let reader = caps.pdf_reader.clone();
    tokio::task::spawn_blocking(move || reader.page_count(&pdf))
        .await
        .map_err(|e| ConvertError::Internal(format!("inspect task panicked: {e}")))?
}
