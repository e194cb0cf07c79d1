//! Several PDFs → one, every page of each source in staging order.

use super::{ArtifactSink, RunContext};
use crate::capability::PageSource;
use crate::error::ConvertError;
use crate::output::Artifact;
use crate::stager::StagedFile;

pub const OUTPUT_NAME: &str = "merged_document.pdf";

pub(super) fn run(
    ctx: &RunContext<'_>,
    files: &[StagedFile],
    sink: &mut ArtifactSink<'_>,
) -> Result<usize, ConvertError> {
    let sources: Vec<PageSource<'_>> = files.iter().map(|f| PageSource::all(&f.bytes)).collect();
    let merged = ctx.caps.page_copier.copy_pages(&sources, &mut |n, total| {
        ctx.unit_done(n + 1, total);
        Ok(())
    })?;

    sink(Artifact::pdf(OUTPUT_NAME, merged))?;
    Ok(files.len())
}
