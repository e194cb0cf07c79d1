//! Page layout for generated PDFs.
//!
//! The PDF author capability only places what it is told to place. Everything
//! positional is decided here, as plain data, so pagination can be tested
//! without a PDF engine: text is wrapped against Helvetica advance widths and
//! poured into A4 pages line by line.
//!
//! Coordinates are in points, measured from the top-left corner of the page.
//! Text positions are baselines.

use image::DynamicImage;

use crate::config::{TextLayout, PT_PER_MM};

/// Typeface used for a text element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFace {
    Helvetica,
    HelveticaBold,
}

/// One thing drawn on a page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageElement {
    Image {
        image: DynamicImage,
        x_pt: f32,
        y_pt: f32,
        width_pt: f32,
        height_pt: f32,
    },
    Text {
        text: String,
        x_pt: f32,
        baseline_pt: f32,
        size_pt: f32,
        face: FontFace,
    },
}

/// A page to author: its size and contents, in drawing order.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub width_pt: f32,
    pub height_pt: f32,
    pub elements: Vec<PageElement>,
}

impl PageLayout {
    pub fn blank(width_pt: f32, height_pt: f32) -> Self {
        Self {
            width_pt,
            height_pt,
            elements: Vec::new(),
        }
    }

    /// Text of every text element, top to bottom.
    pub fn text_lines(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(|e| match e {
                PageElement::Text { text, .. } => Some(text.as_str()),
                PageElement::Image { .. } => None,
            })
            .collect()
    }
}

// ── Text metrics ─────────────────────────────────────────────────────────

/// Helvetica advance widths for U+0020..=U+007E, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

const FALLBACK_WIDTH: u16 = 556;

fn char_width(c: char) -> u16 {
    match c as u32 {
        cp @ 0x20..=0x7E => HELVETICA_WIDTHS[(cp - 0x20) as usize],
        _ => FALLBACK_WIDTH,
    }
}

/// Rendered width of `text` in points at `size_pt`.
pub fn text_width_pt(text: &str, size_pt: f32) -> f32 {
    let units: u32 = text.chars().map(|c| char_width(c) as u32).sum();
    units as f32 * size_pt / 1000.0
}

/// Wrap `text` into lines no wider than `max_width_pt`.
///
/// Each `\n` ends a paragraph (CRLF and lone CR count as `\n`). Words are
/// separated by whitespace and packed greedily; a word that cannot fit on a
/// line by itself is broken between characters. An empty paragraph yields a
/// single empty line, so blank lines in the source survive.
///
/// ```
/// use docshift::layout::wrap_text;
///
/// let lines = wrap_text("one two three", 12.0, 60.0);
/// assert_eq!(lines, vec!["one two", "three"]);
/// ```
pub fn wrap_text(text: &str, size_pt: f32, max_width_pt: f32) -> Vec<String> {
    let normalised = text.replace("\r\n", "\n").replace('\r', "\n");
    let fits = |s: &str| text_width_pt(s, size_pt) <= max_width_pt;
    let mut lines = Vec::new();

    for paragraph in normalised.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if !current.is_empty() {
                let candidate = format!("{current} {word}");
                if fits(&candidate) {
                    current = candidate;
                    continue;
                }
                lines.push(std::mem::take(&mut current));
            }
            if fits(word) {
                current.push_str(word);
                continue;
            }
            for c in word.chars() {
                current.push(c);
                if !fits(&current) && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::replace(&mut current, c.to_string()));
                }
            }
        }
        lines.push(current);
    }

    lines
}

// ── Text pages ───────────────────────────────────────────────────────────

/// Pours lines into pages, starting a new page once the next baseline would
/// fall below the layout's bottom limit.
pub struct TextFlow<'a> {
    layout: &'a TextLayout,
    pages: Vec<PageLayout>,
    y_mm: f32,
}

impl<'a> TextFlow<'a> {
    /// A flow with no pages yet.
    pub fn new(layout: &'a TextLayout) -> Self {
        Self {
            layout,
            pages: Vec::new(),
            y_mm: layout.top_mm,
        }
    }

    pub fn start_page(&mut self) {
        self.pages.push(PageLayout::blank(
            self.layout.page_width_pt(),
            self.layout.page_height_pt(),
        ));
        self.y_mm = self.layout.top_mm;
    }

    pub fn push_line(&mut self, text: &str, size_pt: f32, face: FontFace) {
        if self.pages.is_empty() || self.y_mm > self.layout.bottom_limit_mm {
            self.start_page();
        }
        let element = PageElement::Text {
            text: text.to_string(),
            x_pt: self.layout.margin_left_mm * PT_PER_MM,
            baseline_pt: self.y_mm * PT_PER_MM,
            size_pt,
            face,
        };
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(element);
        }
        self.y_mm += self.layout.line_height_mm;
    }

    /// Wrap `text` to the content width and push every resulting line.
    pub fn push_wrapped(&mut self, text: &str, size_pt: f32, face: FontFace) {
        let width = self.layout.content_width_pt();
        for line in wrap_text(text, size_pt, width) {
            self.push_line(&line, size_pt, face);
        }
    }

    /// The finished pages; never empty.
    pub fn finish(mut self) -> Vec<PageLayout> {
        if self.pages.is_empty() {
            self.start_page();
        }
        self.pages
    }
}

/// Plain text reflowed onto body-font pages.
pub fn layout_text_document(text: &str, layout: &TextLayout) -> Vec<PageLayout> {
    let mut flow = TextFlow::new(layout);
    if !text.is_empty() {
        flow.push_wrapped(text, layout.font_size_pt, FontFace::Helvetica);
    }
    flow.finish()
}

/// Text of one slide, as paragraphs in reading order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideText {
    pub paragraphs: Vec<String>,
}

impl SlideText {
    pub fn has_text(&self) -> bool {
        self.paragraphs.iter().any(|p| !p.trim().is_empty())
    }
}

pub const NO_SLIDE_TEXT: &str = "No extractable text found in this presentation.";

/// One titled section per slide, each starting on a new page.
pub fn layout_slides(
    slides: &[SlideText],
    layout: &TextLayout,
    title_pt: f32,
    body_pt: f32,
) -> Vec<PageLayout> {
    let mut flow = TextFlow::new(layout);
    for (i, slide) in slides.iter().enumerate() {
        flow.start_page();
        flow.push_line(&format!("Slide {}", i + 1), title_pt, FontFace::HelveticaBold);
        for paragraph in slide.paragraphs.iter().filter(|p| !p.trim().is_empty()) {
            flow.push_wrapped(paragraph, body_pt, FontFace::Helvetica);
        }
    }
    if !slides.is_empty() && !slides.iter().any(SlideText::has_text) {
        flow.push_line(NO_SLIDE_TEXT, body_pt, FontFace::Helvetica);
    }
    flow.finish()
}

/// A full-width page sized to the image's aspect ratio.
pub fn layout_image_page(image: DynamicImage, page_width_mm: f32) -> PageLayout {
    let width_pt = page_width_mm * PT_PER_MM;
    let (w, h) = (image.width().max(1), image.height());
    let height_pt = width_pt * h as f32 / w as f32;
    PageLayout {
        width_pt,
        height_pt,
        elements: vec![PageElement::Image {
            image,
            x_pt: 0.0,
            y_pt: 0.0,
            width_pt,
            height_pt,
        }],
    }
}
