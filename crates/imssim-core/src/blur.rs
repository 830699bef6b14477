//! Gaussian smoothing used to gather local image statistics.
//!
//! The window is fixed at [`KERNEL_SIZE`] x [`KERNEL_SIZE`] with standard
//! deviation [`SIGMA`]. Both are part of the metric's definition: changing
//! either changes every score, so they are constants rather than
//! parameters.

use crate::filter::separable_filter;
use crate::types::FloatImage;

/// Side length of the square Gaussian window, in pixels.
pub const KERNEL_SIZE: usize = 11;
const _: () = assert!(KERNEL_SIZE % 2 == 1);

/// Standard deviation of the Gaussian window, in pixels.
pub const SIGMA: f64 = 1.5;

/// Normalized 1-D Gaussian weights of length `size`, centred on the
/// middle tap.
///
/// Weights are computed in `f64`, normalized to sum to one and then
/// narrowed to `f32`.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn gaussian_kernel(size: usize, sigma: f64) -> Vec<f32> {
    let center = (size / 2) as f64;
    let denom = 2.0 * sigma * sigma;
    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / denom).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights.iter().map(|w| (w / total) as f32).collect()
}

/// Blur a floating-point image with the fixed 11x11, sigma 1.5 window.
///
/// The kernel is separable, so this runs one horizontal and one vertical
/// pass with reflect-101 borders (see [`crate::filter`]).
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &FloatImage) -> FloatImage {
    let kernel = gaussian_kernel(KERNEL_SIZE, SIGMA);
    separable_filter(image, &kernel, &kernel)
}
