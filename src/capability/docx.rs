//! Word documents: authoring with docx-rs, raw-text extraction with
//! quick-xml over the `word/document.xml` part.

use std::io::Cursor;
use std::sync::Arc;

use docx_rs::{BreakType, Docx, Paragraph, Run};
use quick_xml::events::Event;
use quick_xml::Reader;

use super::{ArchiveReader, WordAuthor, WordBlock, WordTextExtractor};
use crate::error::ConvertError;

const DOCUMENT_PART: &str = "word/document.xml";

/// [`WordAuthor`] backed by docx-rs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxWriter;

impl WordAuthor for DocxWriter {
    fn build(&self, blocks: &[WordBlock]) -> Result<Vec<u8>, ConvertError> {
        let docx = blocks.iter().fold(Docx::new(), |docx, block| {
            let run = match block {
                WordBlock::Paragraph(text) => Run::new().add_text(text.as_str()),
                WordBlock::PageBreak => Run::new().add_break(BreakType::Page),
            };
            docx.add_paragraph(Paragraph::new().add_run(run))
        });

        let mut out = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut out)
            .map_err(|e| ConvertError::Serialize {
                format: "DOCX",
                detail: e.to_string(),
            })?;
        Ok(out.into_inner())
    }
}

/// [`WordTextExtractor`] that walks the main document part.
///
/// `w:t` contributes its text, `w:tab` a tab, `w:br`/`w:cr` a newline, and
/// every `w:p` ends with a blank line.
#[derive(Clone)]
pub struct DocxTextExtractor {
    archive: Arc<dyn ArchiveReader>,
}

impl DocxTextExtractor {
    pub fn new(archive: Arc<dyn ArchiveReader>) -> Self {
        Self { archive }
    }
}

impl WordTextExtractor for DocxTextExtractor {
    fn extract_raw_text(&self, docx: &[u8]) -> Result<String, ConvertError> {
        let xml = self.archive.read_text(docx, DOCUMENT_PART)?;
        document_text(&xml)
    }
}

fn document_text(xml: &str) -> Result<String, ConvertError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut text = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => text.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                b"w:p" => text.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let unescaped = e.unescape().map_err(|err| ConvertError::TextExtraction {
                    detail: format!("{DOCUMENT_PART}: {err}"),
                })?;
                text.push_str(&unescaped);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ConvertError::TextExtraction {
                    detail: format!(
                        "{DOCUMENT_PART} at byte {}: {e}",
                        reader.buffer_position()
                    ),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}
