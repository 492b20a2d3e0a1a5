//! Image loading and decoding helpers.
//!
//! Covers the two ways an image reaches the screener: a file on disk and
//! an uploaded byte buffer already in memory. Neither path persists
//! anything.

use crate::core::errors::{ScreenError, ScreenResult};
use image::{DynamicImage, ImageBuffer, RgbImage};

/// Converts a DynamicImage to an RgbImage.
pub fn dynamic_to_rgb(img: DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Loads an image from a file path and converts it to RGB.
///
/// # Errors
///
/// Returns `ImageDecode` if the file cannot be opened or decoded.
pub fn load_image(path: &std::path::Path) -> ScreenResult<RgbImage> {
    let img = image::open(path).map_err(ScreenError::ImageDecode)?;
    Ok(dynamic_to_rgb(img))
}

/// Decodes an in-memory image buffer (an upload, typically PNG or JPEG).
///
/// The format is guessed from the buffer contents. The caller decides how
/// to convert the result; pass `decode_image(bytes)?.to_rgb8()` into the
/// screener.
pub fn decode_image(bytes: &[u8]) -> ScreenResult<DynamicImage> {
    image::load_from_memory(bytes).map_err(ScreenError::ImageDecode)
}

/// Creates an RgbImage from raw RGB pixel data.
///
/// Returns `None` if the data length does not match `width * height * 3`.
pub fn create_rgb_image(width: u32, height: u32, data: Vec<u8>) -> Option<RgbImage> {
    if data.len() != (width * height * 3) as usize {
        return None;
    }

    ImageBuffer::from_raw(width, height, data)
}
