//! PDF → single-page PDFs (`page_<N>.pdf`), or one PDF of the pages a range
//! selects (`extracted_pages.pdf`).

use tracing::info;

use super::{ArtifactSink, RunContext};
use crate::capability::PageSource;
use crate::config::SplitMode;
use crate::error::ConvertError;
use crate::output::Artifact;
use crate::range::parse_range;
use crate::stager::StagedFile;

pub const RANGE_OUTPUT_NAME: &str = "extracted_pages.pdf";

pub(super) fn run(
    ctx: &RunContext<'_>,
    file: &StagedFile,
    sink: &mut ArtifactSink<'_>,
) -> Result<usize, ConvertError> {
    let total = ctx.caps.pdf_reader.page_count(&file.bytes)?;

    match &ctx.config.split_mode {
        SplitMode::All => {
            for idx in 0..total {
                let page = [idx];
                let pdf = ctx.caps.page_copier.copy_pages(
                    &[PageSource::selected(&file.bytes, &page)],
                    &mut |_, _| Ok(()),
                )?;
                sink(Artifact::pdf(format!("page_{}.pdf", idx + 1), pdf))?;
                ctx.unit_done(idx + 1, total);
            }
            Ok(total)
        }
        SplitMode::Range(range) => {
            let selection = parse_range(range, total);
            if selection.is_empty() {
                return Err(ConvertError::EmptyRange {
                    range: range.clone(),
                    total_pages: Some(total),
                });
            }
            info!(
                "Extracting pages {:?} of {}",
                selection.page_numbers(),
                total
            );
            let pdf = ctx
                .caps
                .page_copier
                .copy_pages(
                    &[PageSource::selected(&file.bytes, selection.indices())],
                    &mut |_, _| Ok(()),
                )?;
            ctx.unit_done(selection.len(), selection.len());
            sink(Artifact::pdf(RANGE_OUTPUT_NAME, pdf))?;
            Ok(selection.len())
        }
    }
}
