//! Image decoding, grayscale conversion, and promotion to floating point.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces a
//! single-channel 8-bit image. [`to_float`] widens any single-channel
//! image into the `f32` working format without rescaling, so an 8-bit
//! sample of 200 becomes `200.0`, not `0.784`.

use image::{GrayImage, Luma, Primitive};
use imageproc::definitions::Image;

use crate::types::{FloatImage, ScoreError};

/// Decode raw image bytes and convert to grayscale.
///
/// Supports PNG, JPEG, BMP, and WebP formats (whatever the `image` crate
/// can decode). The standard luminance formula is used for RGB-to-gray
/// conversion: `0.299*R + 0.587*G + 0.114*B`.
///
/// # Errors
///
/// Returns [`ScoreError::EmptyInput`] if `bytes` is empty.
/// Returns [`ScoreError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_and_grayscale(bytes: &[u8]) -> Result<GrayImage, ScoreError> {
    if bytes.is_empty() {
        return Err(ScoreError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_luma8())
}

/// Widen a single-channel image to `f32` samples, keeping their values.
#[must_use = "returns the promoted image"]
pub fn to_float<P>(image: &Image<Luma<P>>) -> FloatImage
where
    P: Primitive + Into<f32>,
{
    let mut out = FloatImage::new(image.width(), image.height());
    for (dst, &src) in out.iter_mut().zip(image.iter()) {
        *dst = src.into();
    }
    out
}
