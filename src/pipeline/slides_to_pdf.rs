//! PowerPoint deck → PDF with one titled section per slide.
//!
//! Slides are the `ppt/slides/slideN.xml` parts of the package, taken in
//! numeric order of `N`. Lexical order would put `slide10.xml` before
//! `slide2.xml`.

use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use tracing::{debug, warn};

use super::{ArtifactSink, RunContext};
use crate::error::ConvertError;
use crate::layout::{layout_slides, SlideText};
use crate::output::Artifact;
use crate::stager::StagedFile;

pub const OUTPUT_NAME: &str = "converted_presentation.pdf";

static SLIDE_ENTRY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

/// Slide part names among `entries`, sorted by slide number.
pub fn slide_entries<S: AsRef<str>>(entries: &[S]) -> Vec<String> {
    let mut slides: Vec<(u64, &str)> = entries
        .iter()
        .filter_map(|name| {
            let name = name.as_ref();
            let number = SLIDE_ENTRY.captures(name)?.get(1)?.as_str().parse().ok()?;
            Some((number, name))
        })
        .collect();
    slides.sort_by_key(|(number, _)| *number);
    slides.into_iter().map(|(_, name)| name.to_string()).collect()
}

/// Paragraph texts of one slide part: the `a:t` runs of each `a:p`,
/// concatenated; `a:br` becomes a line break.
pub fn slide_paragraphs(xml: &str) -> Result<Vec<String>, ConvertError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut in_run_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"a:p" => current = Some(String::new()),
                b"a:t" => in_run_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"a:br" => {
                    if let Some(p) = current.as_mut() {
                        p.push('\n');
                    }
                }
                b"a:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Ok(Event::Text(e)) if in_run_text => {
                let text = e.unescape().map_err(|err| ConvertError::TextExtraction {
                    detail: format!("slide text: {err}"),
                })?;
                if let Some(p) = current.as_mut() {
                    p.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"a:t" => in_run_text = false,
                b"a:p" => paragraphs.extend(current.take()),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ConvertError::TextExtraction {
                    detail: format!("slide XML at byte {}: {e}", reader.buffer_position()),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

pub(super) fn run(
    ctx: &RunContext<'_>,
    file: &StagedFile,
    sink: &mut ArtifactSink<'_>,
) -> Result<usize, ConvertError> {
    let archive = &ctx.caps.archive;
    let entries = slide_entries(&archive.entry_names(&file.bytes)?);
    if entries.is_empty() {
        warn!("'{}' contains no slides", file.name);
    }

    let mut slides = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let xml = archive.read_text(&file.bytes, entry)?;
        let paragraphs = slide_paragraphs(&xml)?;
        debug!("{entry}: {} paragraph(s)", paragraphs.len());
        slides.push(SlideText { paragraphs });
        ctx.unit_done(i + 1, entries.len());
    }

    let pages = layout_slides(
        &slides,
        &ctx.config.layout,
        ctx.config.slide_title_font_pt,
        ctx.config.slide_body_font_pt,
    );
    let pdf = ctx.caps.pdf_author.build(&pages)?;
    sink(Artifact::pdf(OUTPUT_NAME, pdf))?;
    Ok(slides.len())
}
