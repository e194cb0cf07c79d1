//! Word → PDF of the document's raw text, reflowed to the content width.

use tracing::debug;

use super::{ArtifactSink, RunContext};
use crate::error::ConvertError;
use crate::layout::layout_text_document;
use crate::output::Artifact;
use crate::stager::StagedFile;

pub const OUTPUT_NAME: &str = "converted_document.pdf";

pub(super) fn run(
    ctx: &RunContext<'_>,
    file: &StagedFile,
    sink: &mut ArtifactSink<'_>,
) -> Result<usize, ConvertError> {
    let text = ctx.caps.word_text.extract_raw_text(&file.bytes)?;
    let pages = layout_text_document(&text, &ctx.config.layout);
    debug!("'{}': {} chars over {} page(s)", file.name, text.len(), pages.len());
    ctx.unit_done(1, 1);

    let pdf = ctx.caps.pdf_author.build(&pages)?;
    sink(Artifact::pdf(OUTPUT_NAME, pdf))?;
    Ok(1)
}
