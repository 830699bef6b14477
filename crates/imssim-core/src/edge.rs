//! Sobel gradients and the 8-bit edge magnitude used to rank pixel
//! importance.
//!
//! The magnitude is the weighted sum `0.5*|Gx| + 0.5*|Gy|` of the two
//! saturated absolute gradients, *not* the Euclidean norm
//! `sqrt(Gx^2 + Gy^2)`. Scores are only comparable with each other when
//! this exact approximation is used, so it is kept as-is.
//!
//! Intermediate values follow 8/16-bit integer semantics:
//!
//! 1. [`sobel_x`] / [`sobel_y`]: 3x3 Sobel, rounded half-to-even and
//!    saturated to `i16`.
//! 2. [`abs_saturate`]: `|G|` saturated to `[0, 255]`.
//! 3. [`combine_magnitudes`]: weighted sum, rounded half-to-even and
//!    saturated to `[0, 255]`.
//!
//! Because of the rounding in step 3, a pixel whose `|Gx| + |Gy|` is
//! exactly 1 gets magnitude `round(0.5) = 0`.

use image::{GrayImage, Luma, Primitive};
use imageproc::definitions::Image;

use crate::filter::separable_filter;
use crate::grayscale::to_float;
use crate::types::{Dimensions, FloatImage, ScoreError, ensure_same};

/// Weight applied to each of `|Gx|` and `|Gy|` when combining them.
pub const GRADIENT_WEIGHT: f32 = 0.5;

/// First-derivative taps of the 3x3 Sobel operator.
const DERIVATIVE: [f32; 3] = [-1.0, 0.0, 1.0];

/// Smoothing taps of the 3x3 Sobel operator.
const SMOOTHING: [f32; 3] = [1.0, 2.0, 1.0];

/// Horizontal gradient (x order 1, y order 0).
#[must_use = "returns the horizontal gradient"]
pub fn sobel_x(image: &FloatImage) -> Image<Luma<i16>> {
    saturate_i16(&separable_filter(image, &DERIVATIVE, &SMOOTHING))
}

/// Vertical gradient (x order 0, y order 1).
#[must_use = "returns the vertical gradient"]
pub fn sobel_y(image: &FloatImage) -> Image<Luma<i16>> {
    saturate_i16(&separable_filter(image, &SMOOTHING, &DERIVATIVE))
}

#[allow(clippy::cast_possible_truncation)]
fn saturate_i16(gradient: &FloatImage) -> Image<Luma<i16>> {
    let mut out = Image::new(gradient.width(), gradient.height());
    for (dst, &src) in out.iter_mut().zip(gradient.iter()) {
        // Float-to-int `as` saturates (and maps NaN to 0).
        *dst = src.round_ties_even() as i16;
    }
    out
}

/// Absolute gradient, saturated to 8 bits.
#[must_use = "returns the absolute gradient"]
pub fn abs_saturate(gradient: &Image<Luma<i16>>) -> GrayImage {
    let mut out = GrayImage::new(gradient.width(), gradient.height());
    for (dst, &src) in out.iter_mut().zip(gradient.iter()) {
        *dst = u8::try_from(src.unsigned_abs()).unwrap_or(u8::MAX);
    }
    out
}

/// Combine absolute gradients as `0.5*|Gx| + 0.5*|Gy|`, rounded
/// half-to-even.
///
/// # Errors
///
/// Returns [`ScoreError::DimensionMismatch`] if the two inputs differ in
/// size.
pub fn combine_magnitudes(abs_x: &GrayImage, abs_y: &GrayImage) -> Result<GrayImage, ScoreError> {
    ensure_same(
        "vertical gradient",
        Dimensions::from(abs_x.dimensions()),
        Dimensions::from(abs_y.dimensions()),
    )?;

    Ok(weighted_sum(abs_x, abs_y))
}

/// Per-pixel `0.5*|Gx| + 0.5*|Gy|` of two equally sized maps.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn weighted_sum(abs_x: &GrayImage, abs_y: &GrayImage) -> GrayImage {
    let mut out = GrayImage::new(abs_x.width(), abs_x.height());
    for ((dst, &gx), &gy) in out.iter_mut().zip(abs_x.iter()).zip(abs_y.iter()) {
        let weighted = GRADIENT_WEIGHT * f32::from(gx) + GRADIENT_WEIGHT * f32::from(gy);
        *dst = weighted.round_ties_even().clamp(0.0, 255.0) as u8;
    }
    out
}

/// 8-bit edge magnitude of a single-channel image.
#[must_use = "returns the edge magnitude map"]
pub fn gradient_magnitude<P>(image: &Image<Luma<P>>) -> GrayImage
where
    P: Primitive + Into<f32>,
{
    let float = to_float(image);
    let abs_x = abs_saturate(&sobel_x(&float));
    let abs_y = abs_saturate(&sobel_y(&float));
    weighted_sum(&abs_x, &abs_y)
}
