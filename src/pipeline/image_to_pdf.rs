//! JPEG images → one PDF, one full-width page per image in staging order.

use super::encode::decode_image;
use super::{ArtifactSink, RunContext};
use crate::error::ConvertError;
use crate::layout::layout_image_page;
use crate::output::Artifact;
use crate::stager::StagedFile;

pub const OUTPUT_NAME: &str = "converted_images.pdf";

pub(super) fn run(
    ctx: &RunContext<'_>,
    files: &[StagedFile],
    sink: &mut ArtifactSink<'_>,
) -> Result<usize, ConvertError> {
    let page_width_mm = ctx.config.layout.page_width_mm;
    let mut pages = Vec::with_capacity(files.len());
    for (i, file) in files.iter().enumerate() {
        pages.push(layout_image_page(decode_image(file)?, page_width_mm));
        ctx.unit_done(i + 1, files.len());
    }

    let pdf = ctx.caps.pdf_author.build(&pages)?;
    sink(Artifact::pdf(OUTPUT_NAME, pdf))?;
    Ok(files.len())
}
