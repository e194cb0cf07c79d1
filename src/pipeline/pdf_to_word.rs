//! PDF → Word: each page's text runs joined by single spaces become one
//! paragraph, with a page break between consecutive pages.

use super::{ArtifactSink, RunContext};
use crate::capability::WordBlock;
use crate::error::ConvertError;
use crate::output::{Artifact, MIME_DOCX};
use crate::stager::StagedFile;

pub const OUTPUT_NAME: &str = "converted_document.docx";

pub(super) fn run(
    ctx: &RunContext<'_>,
    file: &StagedFile,
    sink: &mut ArtifactSink<'_>,
) -> Result<usize, ConvertError> {
    let mut blocks = Vec::new();
    let mut pages = 0;

    ctx.caps.pdf_reader.text_runs(&file.bytes, &mut |idx, total, runs| {
        blocks.push(WordBlock::Paragraph(runs.join(" ")));
        if idx + 1 < total {
            blocks.push(WordBlock::PageBreak);
        }
        pages += 1;
        ctx.unit_done(idx + 1, total);
        Ok(())
    })?;

    let docx = ctx.caps.word_author.build(&blocks)?;
    sink(Artifact::new(OUTPUT_NAME, MIME_DOCX, docx))?;
    Ok(pages)
}
