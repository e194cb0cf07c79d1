//! Conversion pipelines, one per [`OperationKind`].
//!
//! Every pipeline has the same shape: take the staged files in order, drive
//! the capability providers one unit at a time, and hand each finished
//! artifact to a sink as soon as it exists. Pipelines are synchronous and
//! run on a blocking thread; [`crate::convert`] and [`crate::stream`] put
//! them there.
//!
//! ```text
//! staged files ──▶ decode ──▶ per-unit transform ──▶ assemble ──▶ sink
//!                  (capabilities)                                (emitter)
//! ```

pub mod encode;
pub mod input;

mod image_to_pdf;
mod merge;
mod pdf_to_image;
mod pdf_to_word;
mod slides_to_pdf;
mod split;
mod word_to_pdf;

pub use slides_to_pdf::{slide_entries, slide_paragraphs};

use tracing::{debug, info};

use crate::capability::Capabilities;
use crate::config::{ConversionConfig, SplitMode};
use crate::error::ConvertError;
use crate::output::Artifact;
use crate::progress::{self, ProgressCallback};
use crate::range::has_page_tokens;
use crate::stager::{OperationKind, StagedFile};

/// Receives artifacts in emission order.
pub type ArtifactSink<'a> = dyn FnMut(Artifact) -> Result<(), ConvertError> + 'a;

/// What a pipeline needs besides its inputs.
pub(crate) struct RunContext<'a> {
    pub caps: &'a Capabilities,
    pub config: &'a ConversionConfig,
    pub progress: ProgressCallback,
}

impl RunContext<'_> {
    pub fn unit_done(&self, unit: usize, total: usize) {
        debug!("Unit {unit}/{total} done");
        self.progress.on_unit_complete(unit, total);
    }
}

/// Checks that need no capability call. A run that passes these may still
/// fail inside the pipeline, but one that fails them never starts.
pub fn preflight(
    kind: OperationKind,
    files: &[StagedFile],
    config: &ConversionConfig,
) -> Result<(), ConvertError> {
    if files.is_empty() {
        return Err(ConvertError::NothingStaged { kind });
    }
    if files.len() < kind.min_inputs() {
        return Err(ConvertError::NotEnoughInputs {
            kind,
            required: kind.min_inputs(),
            staged: files.len(),
        });
    }
    let filter = kind.input_filter();
    if let Some(bad) = files.iter().find(|f| !filter.accepts(f)) {
        return Err(ConvertError::WrongInputType {
            name: bad.name.clone(),
            expected: kind.expected_input(),
        });
    }
    if kind == OperationKind::SplitDoc {
        if let SplitMode::Range(range) = &config.split_mode {
            if !has_page_tokens(range) {
                return Err(ConvertError::EmptyRange {
                    range: range.clone(),
                    total_pages: None,
                });
            }
        }
    }
    Ok(())
}

/// Run the pipeline for `kind`, blocking, and return the number of units
/// processed. Artifacts go to `sink` as they are produced.
pub fn run_blocking(
    kind: OperationKind,
    files: &[StagedFile],
    config: &ConversionConfig,
    caps: &Capabilities,
    sink: &mut ArtifactSink<'_>,
) -> Result<usize, ConvertError> {
    preflight(kind, files, config)?;

    let ctx = RunContext {
        caps,
        config,
        progress: progress::or_noop(config.progress_callback.as_ref()),
    };
    info!("Running {} on {} file(s)", kind, files.len());
    ctx.progress.on_conversion_start(kind, files.len());

    let mut emit = |artifact: Artifact| {
        ctx.progress
            .on_artifact_emitted(&artifact.filename, artifact.len());
        sink(artifact)
    };

    match kind {
        OperationKind::ImageToDoc => image_to_pdf::run(&ctx, files, &mut emit),
        OperationKind::DocToImage => pdf_to_image::run(&ctx, &files[0], &mut emit),
        OperationKind::DocToWord => pdf_to_word::run(&ctx, &files[0], &mut emit),
        OperationKind::WordToDoc => word_to_pdf::run(&ctx, &files[0], &mut emit),
        OperationKind::MergeDoc => merge::run(&ctx, files, &mut emit),
        OperationKind::SplitDoc => split::run(&ctx, &files[0], &mut emit),
        OperationKind::SlidesToDoc => slides_to_pdf::run(&ctx, &files[0], &mut emit),
    }
}
