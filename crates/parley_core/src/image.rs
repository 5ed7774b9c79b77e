//! Image normalization for vision requests.
//!
//! Everything past this module assumes JPEG bytes.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, ImageReader};

use crate::error::{CoreError, Result};

/// Re-encode `bytes` as JPEG unless they already are.
pub fn ensure_jpeg(bytes: Vec<u8>) -> Result<Vec<u8>> {
    if matches!(image::guess_format(&bytes), Ok(ImageFormat::Jpeg)) {
        return Ok(bytes);
    }

    let decoded = image::load_from_memory(&bytes).map_err(|e| CoreError::Image(e.to_string()))?;
    // The JPEG encoder rejects alpha channels.
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());

    let mut out = Cursor::new(Vec::new());
    rgb.write_to(&mut out, ImageFormat::Jpeg)
        .map_err(|e| CoreError::Image(e.to_string()))?;
    Ok(out.into_inner())
}

/// Width and height read from the image header.
pub fn dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CoreError::Image(e.to_string()))?
        .into_dimensions()
        .map_err(|e| CoreError::Image(e.to_string()))
}
