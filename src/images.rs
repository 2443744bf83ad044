//! Image normalization: everything stored ends up a 300x300 JPEG.

use std::io::Cursor;

use image::{imageops::FilterType, ImageFormat};

pub const THUMB_WIDTH: u32 = 300;
pub const THUMB_HEIGHT: u32 = 300;

/// Decodes `bytes` in any supported format, resizes to exactly
/// 300x300 (aspect ratio not preserved), and re-encodes as JPEG.
pub fn normalize_image(bytes: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let decoded = image::load_from_memory(bytes)?;
    let resized = decoded
        .resize_exact(THUMB_WIDTH, THUMB_HEIGHT, FilterType::Triangle)
        .to_rgb8();
    let mut out = Cursor::new(Vec::new());
    resized.write_to(&mut out, ImageFormat::Jpeg)?;
    Ok(out.into_inner())
}
