//! Narrow interfaces over the document libraries.
//!
//! Pipelines never name a concrete PDF, Word or archive library. They talk to
//! the traits below through a [`Capabilities`] bundle, so every pipeline can
//! be driven by fakes in tests.
//!
//! | Trait | Native implementation |
//! |-------|-----------------------|
//! | [`PdfReader`], [`PdfAuthor`], [`PdfPageCopier`] | [`PdfiumEngine`] (pdfium-render) |
//! | [`WordAuthor`] | [`DocxWriter`] (docx-rs) |
//! | [`WordTextExtractor`] | [`DocxTextExtractor`] (zip + quick-xml) |
//! | [`ArchiveReader`] | [`ZipArchiveReader`] (zip) |
//!
//! Readers hand pages to a sink closure one at a time, in document order, so a
//! document is opened once and pages never pile up in memory.

pub mod archive;
pub mod docx;
pub mod pdfium;

use std::sync::Arc;

use image::DynamicImage;

use crate::error::ConvertError;
use crate::layout::PageLayout;

pub use archive::ZipArchiveReader;
pub use docx::{DocxTextExtractor, DocxWriter};
pub use pdfium::PdfiumEngine;

/// Receives `(page_index, total_pages, image)` for each rendered page.
pub type RenderSink<'a> = dyn FnMut(usize, usize, DynamicImage) -> Result<(), ConvertError> + 'a;

/// Receives `(page_index, total_pages, runs)` with the text runs of each page.
pub type TextSink<'a> = dyn FnMut(usize, usize, Vec<String>) -> Result<(), ConvertError> + 'a;

/// Receives `(source_index, total_sources)` once each source has been copied.
pub type CopySink<'a> = dyn FnMut(usize, usize) -> Result<(), ConvertError> + 'a;

/// Open, enumerate, rasterise and read text from PDFs.
pub trait PdfReader: Send + Sync {
    fn page_count(&self, pdf: &[u8]) -> Result<usize, ConvertError>;

    /// Render every page at `scale` × its natural size.
    fn render_pages(&self, pdf: &[u8], scale: f32, sink: &mut RenderSink<'_>)
        -> Result<(), ConvertError>;

    /// Text runs of every page, in content order.
    fn text_runs(&self, pdf: &[u8], sink: &mut TextSink<'_>) -> Result<(), ConvertError>;
}

/// Create a PDF from laid-out pages.
pub trait PdfAuthor: Send + Sync {
    fn build(&self, pages: &[PageLayout]) -> Result<Vec<u8>, ConvertError>;
}

/// Pages to take from one source document.
#[derive(Debug, Clone, Copy)]
pub struct PageSource<'a> {
    pub pdf: &'a [u8],
    /// Zero-based indices in output order; `None` copies every page.
    pub pages: Option<&'a [usize]>,
}

impl<'a> PageSource<'a> {
    pub fn all(pdf: &'a [u8]) -> Self {
        Self { pdf, pages: None }
    }

    pub fn selected(pdf: &'a [u8], pages: &'a [usize]) -> Self {
        Self {
            pdf,
            pages: Some(pages),
        }
    }
}

/// Assemble a new PDF from pages of existing ones.
pub trait PdfPageCopier: Send + Sync {
    /// Copy the pages of each source, sources in order, into one document.
    /// `copied` runs after each source, in source order.
    fn copy_pages(
        &self,
        sources: &[PageSource<'_>],
        copied: &mut CopySink<'_>,
    ) -> Result<Vec<u8>, ConvertError>;
}

/// A block of a generated Word document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordBlock {
    Paragraph(String),
    PageBreak,
}

pub trait WordAuthor: Send + Sync {
    fn build(&self, blocks: &[WordBlock]) -> Result<Vec<u8>, ConvertError>;
}

pub trait WordTextExtractor: Send + Sync {
    /// Plain text of the document body. Paragraphs end with a blank line.
    fn extract_raw_text(&self, docx: &[u8]) -> Result<String, ConvertError>;
}

/// Read entries of a ZIP-based container.
pub trait ArchiveReader: Send + Sync {
    fn entry_names(&self, archive: &[u8]) -> Result<Vec<String>, ConvertError>;

    fn read_text(&self, archive: &[u8], name: &str) -> Result<String, ConvertError>;
}

/// Every capability a pipeline may need.
#[derive(Clone)]
pub struct Capabilities {
    pub pdf_reader: Arc<dyn PdfReader>,
    pub pdf_author: Arc<dyn PdfAuthor>,
    pub page_copier: Arc<dyn PdfPageCopier>,
    pub word_author: Arc<dyn WordAuthor>,
    pub word_text: Arc<dyn WordTextExtractor>,
    pub archive: Arc<dyn ArchiveReader>,
}

impl Capabilities {
    /// PDFium for PDFs, docx-rs for Word output, zip + quick-xml for reading
    /// Office containers.
    pub fn native() -> Self {
        let engine = Arc::new(PdfiumEngine::new());
        Self {
            pdf_reader: engine.clone(),
            pdf_author: engine.clone(),
            page_copier: engine,
            word_author: Arc::new(DocxWriter),
            word_text: Arc::new(DocxTextExtractor::new(Arc::new(ZipArchiveReader))),
            archive: Arc::new(ZipArchiveReader),
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::native()
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities").finish_non_exhaustive()
    }
}
