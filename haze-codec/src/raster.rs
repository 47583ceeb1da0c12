//! Raster helpers: decode arbitrary image bytes, shrink them, and write PNGs.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageOutputFormat, RgbaImage};

use haze_core::{HazeError, Result};

/// An image shrunk to encoding size, plus facts about the original.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    /// RGBA8 pixels of the shrunk image
    pub pixels: Vec<u8>,
    /// Shrunk width
    pub width: u32,
    /// Shrunk height
    pub height: u32,
    /// Original width
    pub source_width: u32,
    /// Original height
    pub source_height: u32,
    /// Detected format, lowercase (e.g. "png")
    pub format: String,
}

/// Decodes `bytes` and resizes the image to fit inside `max_edge`×`max_edge`,
/// preserving aspect ratio.
pub fn prepare(bytes: &[u8], max_edge: u32) -> Result<PreparedImage> {
    let format = image::guess_format(bytes)
        .map_err(|e| HazeError::Transform(format!("Unrecognized image format: {}", e)))?;
    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| HazeError::Transform(format!("Failed to decode image: {}", e)))?;

    let (source_width, source_height) = img.dimensions();
    let rgba = img.resize(max_edge, max_edge, FilterType::Triangle).to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(PreparedImage {
        pixels: rgba.into_raw(),
        width,
        height,
        source_width,
        source_height,
        format: format!("{:?}", format).to_lowercase(),
    })
}

/// Encodes RGBA8 `pixels` as a PNG.
pub fn encode_png(pixels: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>> {
    let buffer = RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
        HazeError::Transform(format!("Pixel buffer does not match {}x{}", width, height))
    })?;

    let mut out = Vec::new();
    DynamicImage::ImageRgba8(buffer)
        .write_to(&mut Cursor::new(&mut out), ImageOutputFormat::Png)
        .map_err(|e| HazeError::Transform(format!("PNG encoding failed: {}", e)))?;
    Ok(out)
}
