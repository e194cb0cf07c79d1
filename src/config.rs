//! Configuration types for docshift conversions.
//!
//! All tunable behaviour lives in [`ConversionConfig`], built via
//! [`ConversionConfigBuilder`]. The defaults reproduce the fixed constants of
//! the original browser tool: 2× render scale, JPEG quality 90, A4 pages in
//! millimetres with a 10 mm margin, 7 mm lines and a new page once the next
//! line would pass 280 mm.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Points per millimetre.
pub const PT_PER_MM: f32 = 72.0 / 25.4;

/// Configuration for a conversion run.
///
/// # Example
/// ```rust
/// use docshift::{ConversionConfig, SplitMode};
///
/// let config = ConversionConfig::builder()
///     .render_scale(3.0)
///     .split_mode(SplitMode::Range("1-3,5".into()))
///     .build()
///     .unwrap();
/// assert_eq!(config.jpeg_quality, 90);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Upscaling factor applied when rasterising PDF pages. Default: 2.0.
    pub render_scale: f32,

    /// JPEG quality for rendered pages, 1–100. Default: 90.
    pub jpeg_quality: u8,

    /// How a PDF is split. Default: [`SplitMode::All`].
    pub split_mode: SplitMode,

    /// Page geometry and text metrics for generated text PDFs.
    pub layout: TextLayout,

    /// Font size of the "Slide N" heading. Default: 20 pt.
    pub slide_title_font_pt: f32,

    /// Font size of slide body text. Default: 14 pt.
    pub slide_body_font_pt: f32,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional host notifications (staging, per-unit progress, emission).
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            render_scale: 2.0,
            jpeg_quality: 90,
            split_mode: SplitMode::default(),
            layout: TextLayout::default(),
            slide_title_font_pt: 20.0,
            slide_body_font_pt: 14.0,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("render_scale", &self.render_scale)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("split_mode", &self.split_mode)
            .field("layout", &self.layout)
            .field("slide_title_font_pt", &self.slide_title_font_pt)
            .field("slide_body_font_pt", &self.slide_body_font_pt)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale.clamp(0.5, 8.0);
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn split_mode(mut self, mode: SplitMode) -> Self {
        self.config.split_mode = mode;
        self
    }

    pub fn layout(mut self, layout: TextLayout) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn slide_fonts(mut self, title_pt: f32, body_pt: f32) -> Self {
        self.config.slide_title_font_pt = title_pt;
        self.config.slide_body_font_pt = body_pt;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if !(0.5..=8.0).contains(&c.render_scale) {
            return Err(ConvertError::InvalidConfig(format!(
                "render scale must be 0.5–8.0, got {}",
                c.render_scale
            )));
        }
        if c.jpeg_quality == 0 || c.jpeg_quality > 100 {
            return Err(ConvertError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        if c.slide_title_font_pt <= 0.0 || c.slide_body_font_pt <= 0.0 {
            return Err(ConvertError::InvalidConfig(
                "slide font sizes must be positive".into(),
            ));
        }
        c.layout.validate()?;
        Ok(self.config)
    }
}

// ── Enums & nested settings ──────────────────────────────────────────────

/// How [`crate::OperationKind::SplitDoc`] divides a PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitMode {
    /// One single-page PDF per page (default).
    #[default]
    All,
    /// One PDF holding the pages selected by a range expression like `"1-3,5"`.
    Range(String),
}

/// Page geometry for generated text documents, in millimetres.
///
/// Lines are placed top-down at `top_mm`, `top_mm + line_height_mm`, … and a
/// new page starts once the next baseline would lie below `bottom_limit_mm`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLayout {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_left_mm: f32,
    pub top_mm: f32,
    pub content_width_mm: f32,
    pub line_height_mm: f32,
    pub bottom_limit_mm: f32,
    pub font_size_pt: f32,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_left_mm: 10.0,
            top_mm: 10.0,
            content_width_mm: 180.0,
            line_height_mm: 7.0,
            bottom_limit_mm: 280.0,
            font_size_pt: 16.0,
        }
    }
}

impl TextLayout {
    /// Number of lines that fit on one page.
    pub fn lines_per_page(&self) -> usize {
        ((self.bottom_limit_mm - self.top_mm) / self.line_height_mm).floor() as usize + 1
    }

    pub fn page_width_pt(&self) -> f32 {
        self.page_width_mm * PT_PER_MM
    }

    pub fn page_height_pt(&self) -> f32 {
        self.page_height_mm * PT_PER_MM
    }

    pub fn content_width_pt(&self) -> f32 {
        self.content_width_mm * PT_PER_MM
    }

    fn validate(&self) -> Result<(), ConvertError> {
        let positive = [
            self.page_width_mm,
            self.page_height_mm,
            self.content_width_mm,
            self.line_height_mm,
            self.font_size_pt,
        ];
        if positive.iter().any(|v| *v <= 0.0) {
            return Err(ConvertError::InvalidConfig(
                "page size, content width, line height and font size must be positive".into(),
            ));
        }
        if self.margin_left_mm < 0.0 || self.margin_left_mm + self.content_width_mm > self.page_width_mm {
            return Err(ConvertError::InvalidConfig(format!(
                "content ({} mm + {} mm margin) does not fit a {} mm page",
                self.content_width_mm, self.margin_left_mm, self.page_width_mm
            )));
        }
        if self.top_mm < 0.0 || self.bottom_limit_mm < self.top_mm || self.bottom_limit_mm > self.page_height_mm {
            return Err(ConvertError::InvalidConfig(format!(
                "text area {}–{} mm does not fit a {} mm page",
                self.top_mm, self.bottom_limit_mm, self.page_height_mm
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_browser_constants() {
        let c = ConversionConfig::default();
        assert_eq!(c.render_scale, 2.0);
        assert_eq!(c.jpeg_quality, 90);
        assert_eq!(c.split_mode, SplitMode::All);
        assert_eq!(c.layout.lines_per_page(), 39);
    }

    #[test]
    fn builder_clamps_scale_and_quality() {
        let c = ConversionConfig::builder()
            .render_scale(50.0)
            .jpeg_quality(0)
            .build()
            .unwrap();
        assert_eq!(c.render_scale, 8.0);
        assert_eq!(c.jpeg_quality, 1);
    }

    #[test]
    fn oversized_content_width_rejected() {
        let layout = TextLayout {
            content_width_mm: 205.0,
            ..TextLayout::default()
        };
        let err = ConversionConfig::builder().layout(layout).build().unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }

    #[test]
    fn bottom_limit_beyond_page_rejected() {
        let layout = TextLayout {
            bottom_limit_mm: 300.0,
            ..TextLayout::default()
        };
        assert!(ConversionConfig::builder().layout(layout).build().is_err());
    }

    #[test]
    fn non_positive_slide_fonts_rejected() {
        assert!(ConversionConfig::builder()
            .slide_fonts(0.0, 12.0)
            .build()
            .is_err());
    }

    #[test]
    fn mm_to_points() {
        let layout = TextLayout::default();
        assert!((layout.page_width_pt() - 595.2756).abs() < 0.01);
        assert!((layout.page_height_pt() - 841.8898).abs() < 0.01);
    }
}
