//! Image codecs: decode staged JPEGs, encode rendered pages as JPEG.
//!
//! Rendered pages come back from pdfium as RGBA. JPEG has no alpha channel,
//! so pages are flattened to RGB before encoding.

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::debug;

use crate::error::ConvertError;
use crate::stager::StagedFile;

/// Decode a staged image file.
pub fn decode_image(file: &StagedFile) -> Result<DynamicImage, ConvertError> {
    let img = image::load_from_memory(&file.bytes).map_err(|e| ConvertError::decode(&file.name, e))?;
    debug!("Decoded '{}' → {}x{} px", file.name, img.width(), img.height());
    Ok(img)
}

/// Encode a rendered page as a JPEG at `quality` (1–100).
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
    debug!("Encoded {}x{} page → {} bytes JPEG", img.width(), img.height(), buf.len());
    Ok(buf)
}
