//! PDF → one JPEG per page, `page_<N>.jpg`, in document order.

use super::encode::encode_jpeg;
use super::{ArtifactSink, RunContext};
use crate::error::ConvertError;
use crate::output::{Artifact, MIME_JPEG};
use crate::stager::StagedFile;

pub(super) fn run(
    ctx: &RunContext<'_>,
    file: &StagedFile,
    sink: &mut ArtifactSink<'_>,
) -> Result<usize, ConvertError> {
    let quality = ctx.config.jpeg_quality;
    let mut rendered = 0;

    ctx.caps
        .pdf_reader
        .render_pages(&file.bytes, ctx.config.render_scale, &mut |idx, total, image| {
            let page = idx + 1;
            let jpeg = encode_jpeg(&image, quality).map_err(|e| ConvertError::Render {
                page,
                detail: format!("JPEG encoding failed: {e}"),
            })?;
            sink(Artifact::new(format!("page_{page}.jpg"), MIME_JPEG, jpeg))?;
            rendered += 1;
            ctx.unit_done(page, total);
            Ok(())
        })?;

    Ok(rendered)
}
