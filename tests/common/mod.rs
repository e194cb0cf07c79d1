//! Fake capability providers shared by the integration tests.
//!
//! A fake PDF is the text `FAKEPDF:` followed by page labels separated by
//! `|`, e.g. `FAKEPDF:a1|a2`. Authoring writes the text lines of each laid-out
//! page, joined by `/`, as that page's label; an image element is written as
//! `<img WxH>`. Copying pages copies labels.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use docshift::layout::{PageElement, PageLayout};
use docshift::{
    Capabilities, ConvertError, PageSource, PdfAuthor, PdfPageCopier, PdfReader, StagedFile,
    WordAuthor, WordBlock,
};
use docshift::capability::{CopySink, RenderSink, TextSink, ZipArchiveReader};
use docshift::capability::{DocxTextExtractor, DocxWriter};
use image::DynamicImage;

pub const PREFIX: &str = "FAKEPDF:";

/// Route library logs to the test harness; `RUST_LOG` picks the level.
pub fn init_logs() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn fake_pdf(labels: &[&str]) -> Vec<u8> {
    format!("{PREFIX}{}", labels.join("|")).into_bytes()
}

pub fn pdf_file(name: &str, labels: &[&str]) -> StagedFile {
    StagedFile::new(name, Some("application/pdf"), fake_pdf(labels))
}

/// Page labels of a fake PDF.
pub fn pages_of(bytes: &[u8]) -> Vec<String> {
    parse(bytes).expect("not a fake PDF")
}

fn parse(bytes: &[u8]) -> Result<Vec<String>, ConvertError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ConvertError::Decode {
        name: "pdf".into(),
        detail: e.to_string(),
    })?;
    let body = text.strip_prefix(PREFIX).ok_or_else(|| ConvertError::Decode {
        name: "pdf".into(),
        detail: "not a PDF".into(),
    })?;
    if body.is_empty() {
        return Ok(Vec::new());
    }
    Ok(body.split('|').map(str::to_string).collect())
}

fn label(page: &PageLayout) -> String {
    page.elements
        .iter()
        .map(|e| match e {
            PageElement::Text { text, .. } => text.clone(),
            PageElement::Image { image, .. } => format!("<img {}x{}>", image.width(), image.height()),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Records every capability call so tests can assert what ran.
#[derive(Default)]
pub struct FakePdfEngine {
    pub calls: Mutex<Vec<String>>,
    pub fail_render_at: Option<usize>,
}

impl FakePdfEngine {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

impl PdfReader for FakePdfEngine {
    fn page_count(&self, pdf: &[u8]) -> Result<usize, ConvertError> {
        self.record("page_count");
        Ok(parse(pdf)?.len())
    }

    fn render_pages(
        &self,
        pdf: &[u8],
        scale: f32,
        sink: &mut RenderSink<'_>,
    ) -> Result<(), ConvertError> {
        self.record("render_pages");
        let pages = parse(pdf)?;
        let side = (10.0 * scale) as u32;
        for idx in 0..pages.len() {
            if self.fail_render_at == Some(idx) {
                return Err(ConvertError::Render {
                    page: idx + 1,
                    detail: "injected".into(),
                });
            }
            sink(idx, pages.len(), DynamicImage::new_rgb8(side, side))?;
        }
        Ok(())
    }

    fn text_runs(&self, pdf: &[u8], sink: &mut TextSink<'_>) -> Result<(), ConvertError> {
        self.record("text_runs");
        let pages = parse(pdf)?;
        for (idx, page) in pages.iter().enumerate() {
            let runs = page.split_whitespace().map(str::to_string).collect();
            sink(idx, pages.len(), runs)?;
        }
        Ok(())
    }
}

impl PdfAuthor for FakePdfEngine {
    fn build(&self, pages: &[PageLayout]) -> Result<Vec<u8>, ConvertError> {
        self.record(format!("build:{}", pages.len()));
        let labels: Vec<String> = pages.iter().map(label).collect();
        Ok(format!("{PREFIX}{}", labels.join("|")).into_bytes())
    }
}

impl PdfPageCopier for FakePdfEngine {
    fn copy_pages(
        &self,
        sources: &[PageSource<'_>],
        copied: &mut CopySink<'_>,
    ) -> Result<Vec<u8>, ConvertError> {
        self.record("copy_pages");
        let mut out = Vec::new();
        for (n, source) in sources.iter().enumerate() {
            let pages = parse(source.pdf)?;
            match source.pages {
                None => out.extend(pages),
                Some(selected) => {
                    for &idx in selected {
                        let page = pages.get(idx).ok_or_else(|| ConvertError::PageCopy {
                            detail: format!("page index {idx} out of range"),
                        })?;
                        out.push(page.clone());
                    }
                }
            }
            copied(n, sources.len())?;
        }
        Ok(format!("{PREFIX}{}", out.join("|")).into_bytes())
    }
}

/// Fake PDF engine plus the real docx and zip providers.
pub fn fake_caps() -> (Capabilities, Arc<FakePdfEngine>) {
    caps_with(FakePdfEngine::default())
}

pub fn caps_with(engine: FakePdfEngine) -> (Capabilities, Arc<FakePdfEngine>) {
    let engine = Arc::new(engine);
    let archive = Arc::new(ZipArchiveReader);
    let caps = Capabilities {
        pdf_reader: engine.clone(),
        pdf_author: engine.clone(),
        page_copier: engine.clone(),
        word_author: Arc::new(DocxWriter),
        word_text: Arc::new(DocxTextExtractor::new(archive.clone())),
        archive,
    };
    (caps, engine)
}

/// Keeps the blocks of every document it is asked to build.
#[derive(Default)]
pub struct RecordingWordAuthor {
    pub documents: Mutex<Vec<Vec<WordBlock>>>,
}

impl WordAuthor for RecordingWordAuthor {
    fn build(&self, blocks: &[WordBlock]) -> Result<Vec<u8>, ConvertError> {
        self.documents.lock().unwrap().push(blocks.to_vec());
        DocxWriter.build(blocks)
    }
}

/// A ZIP archive of UTF-8 entries.
pub fn zip_of(entries: &[(&str, &str)]) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        for (name, body) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }
    cursor.into_inner()
}

/// A single stored entry whose headers claim `declared` uncompressed bytes.
pub fn zip_declaring(name: &str, body: &str, declared: u32) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::CompressionMethod;

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file(name, options).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
        writer.finish().unwrap();
    }
    let mut bytes = cursor.into_inner();

    // Uncompressed size sits at +22 in the local header, +24 in the central one.
    for (signature, offset) in [(b"PK\x03\x04", 22), (b"PK\x01\x02", 24)] {
        let at = bytes
            .windows(4)
            .position(|w| w == signature)
            .expect("zip header missing");
        bytes[at + offset..at + offset + 4].copy_from_slice(&declared.to_le_bytes());
    }
    bytes
}

pub fn slide_xml(paragraphs: &[&str]) -> String {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<a:p><a:r><a:t>{p}</a:t></a:r></a:p>"))
        .collect();
    format!(
        r#"<p:sld xmlns:a="a" xmlns:p="p"><p:cSld><p:spTree><p:sp><p:txBody>{body}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
    )
}

pub fn jpeg_file(name: &str, width: u32, height: u32) -> StagedFile {
    let img = DynamicImage::new_rgb8(width, height);
    let jpeg = docshift::pipeline::encode::encode_jpeg(&img, 90).unwrap();
    StagedFile::new(name, Some("image/jpeg"), jpeg)
}
