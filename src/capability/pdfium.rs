//! PDF reading, authoring and page copying via pdfium-render.
//!
//! The pdfium library is bound per call. The loader memoises the library
//! path, so only the very first bind can trigger a download. All methods are
//! blocking and must run on a blocking thread, never on the async executor.

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::debug;

use super::{CopySink, PageSource, PdfAuthor, PdfPageCopier, PdfReader, RenderSink, TextSink};
use crate::error::ConvertError;
use crate::layout::{FontFace, PageElement, PageLayout};

/// The native PDF engine.
#[derive(Debug, Clone, Default)]
pub struct PdfiumEngine {
    _private: (),
}

impl PdfiumEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn bind(&self) -> Result<Pdfium, ConvertError> {
        pdfium_loader::bind_pdfium(None).map_err(|e| ConvertError::EngineUnavailable(e.to_string()))
    }
}

fn open<'a>(pdfium: &'a Pdfium, bytes: &'a [u8], what: &str) -> Result<PdfDocument<'a>, ConvertError> {
    pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| ConvertError::decode(what, format!("{e:?}")))
}

impl PdfReader for PdfiumEngine {
    fn page_count(&self, pdf: &[u8]) -> Result<usize, ConvertError> {
        let pdfium = self.bind()?;
        let document = open(&pdfium, pdf, "PDF")?;
        Ok(document.pages().len() as usize)
    }

    fn render_pages(
        &self,
        pdf: &[u8],
        scale: f32,
        sink: &mut RenderSink<'_>,
    ) -> Result<(), ConvertError> {
        let pdfium = self.bind()?;
        let document = open(&pdfium, pdf, "PDF")?;
        let pages = document.pages();
        let total = pages.len() as usize;
        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);

        for idx in 0..total {
            let render_err = |e: PdfiumError| ConvertError::Render {
                page: idx + 1,
                detail: format!("{e:?}"),
            };
            let page = pages.get(idx as u16).map_err(render_err)?;
            let image: DynamicImage = page
                .render_with_config(&render_config)
                .map_err(render_err)?
                .as_image();
            debug!(
                "Rendered page {}/{} → {}x{} px",
                idx + 1,
                total,
                image.width(),
                image.height()
            );
            sink(idx, total, image)?;
        }
        Ok(())
    }

    fn text_runs(&self, pdf: &[u8], sink: &mut TextSink<'_>) -> Result<(), ConvertError> {
        let pdfium = self.bind()?;
        let document = open(&pdfium, pdf, "PDF")?;
        let pages = document.pages();
        let total = pages.len() as usize;

        for idx in 0..total {
            let text_err = |e: PdfiumError| ConvertError::TextExtraction {
                detail: format!("page {}: {e:?}", idx + 1),
            };
            let page = pages.get(idx as u16).map_err(text_err)?;
            let text = page.text().map_err(text_err)?;
            let runs: Vec<String> = text.segments().iter().map(|s| s.text()).collect();
            sink(idx, total, runs)?;
        }
        Ok(())
    }
}

impl PdfAuthor for PdfiumEngine {
    fn build(&self, layouts: &[PageLayout]) -> Result<Vec<u8>, ConvertError> {
        let pdfium = self.bind()?;
        let author_err = |e: PdfiumError| ConvertError::Serialize {
            format: "PDF",
            detail: format!("{e:?}"),
        };

        let mut document = pdfium.create_new_pdf().map_err(author_err)?;
        let regular = document.fonts_mut().helvetica();
        let bold = document.fonts_mut().helvetica_bold();

        for layout in layouts {
            let size = PdfPagePaperSize::Custom(
                PdfPoints::new(layout.width_pt),
                PdfPoints::new(layout.height_pt),
            );
            let mut page = document
                .pages_mut()
                .create_page_at_end(size)
                .map_err(author_err)?;

            for element in &layout.elements {
                match element {
                    PageElement::Image {
                        image,
                        x_pt,
                        y_pt,
                        width_pt,
                        height_pt,
                    } => {
                        // pdfium places objects by their bottom-left corner.
                        let bottom = layout.height_pt - y_pt - height_pt;
                        page.objects_mut()
                            .create_image_object(
                                PdfPoints::new(*x_pt),
                                PdfPoints::new(bottom),
                                image,
                                Some(PdfPoints::new(*width_pt)),
                                Some(PdfPoints::new(*height_pt)),
                            )
                            .map_err(author_err)?;
                    }
                    PageElement::Text {
                        text,
                        x_pt,
                        baseline_pt,
                        size_pt,
                        face,
                    } => {
                        if text.is_empty() {
                            continue;
                        }
                        let font = match face {
                            FontFace::Helvetica => regular,
                            FontFace::HelveticaBold => bold,
                        };
                        page.objects_mut()
                            .create_text_object(
                                PdfPoints::new(*x_pt),
                                PdfPoints::new(layout.height_pt - baseline_pt),
                                text,
                                font,
                                PdfPoints::new(*size_pt),
                            )
                            .map_err(author_err)?;
                    }
                }
            }
        }

        document.save_to_bytes().map_err(author_err)
    }
}

impl PdfPageCopier for PdfiumEngine {
    fn copy_pages(
        &self,
        sources: &[PageSource<'_>],
        copied: &mut CopySink<'_>,
    ) -> Result<Vec<u8>, ConvertError> {
        let pdfium = self.bind()?;
        let copy_err = |e: PdfiumError| ConvertError::PageCopy {
            detail: format!("{e:?}"),
        };

        let mut output = pdfium.create_new_pdf().map_err(copy_err)?;
        for (n, source) in sources.iter().enumerate() {
            let input = open(&pdfium, source.pdf, &format!("source PDF #{}", n + 1))?;
            match source.pages {
                None => output.pages_mut().append(&input).map_err(copy_err)?,
                Some(indices) => {
                    let available = input.pages().len() as usize;
                    for &idx in indices {
                        if idx >= available {
                            return Err(ConvertError::PageCopy {
                                detail: format!(
                                    "page {} requested from a {available}-page document",
                                    idx + 1
                                ),
                            });
                        }
                        let at = output.pages().len();
                        output
                            .pages_mut()
                            .copy_page_from_document(&input, idx as u16, at)
                            .map_err(copy_err)?;
                    }
                }
            }
            debug!(
                "Copied source {} of {}; output has {} pages",
                n + 1,
                sources.len(),
                output.pages().len()
            );
            copied(n, sources.len())?;
        }

        output.save_to_bytes().map_err(copy_err)
    }
}
