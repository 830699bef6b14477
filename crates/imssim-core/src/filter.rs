//! Separable correlation with a single, fixed border policy.
//!
//! Every convolution in the crate (the Sobel gradients in
//! [`crate::edge`] and the Gaussian statistics in [`crate::blur`]) goes
//! through [`separable_filter`], so pixels beyond the image boundary are
//! treated identically everywhere.
//!
//! The border policy is reflect-101: the image is mirrored about its edge
//! sample without repeating it,
//!
//! ```text
//! g f e d c b | a b c d e f g h | g f e d c b a
//! ```
//!
//! which is the reflection OpenCV calls `BORDER_REFLECT_101` (its
//! `BORDER_DEFAULT`). Offsets larger than the image are reflected
//! repeatedly until they land inside. A length-1 axis maps every offset to
//! its only sample.

use crate::types::FloatImage;

/// Map a possibly out-of-range sample index onto `0..len` using
/// reflect-101.
///
/// `len` must be nonzero.
#[must_use]
pub fn reflect_101(index: i64, len: usize) -> usize {
    debug_assert!(len > 0, "reflect_101 on an empty axis");
    if len <= 1 {
        return 0;
    }
    let last = i64::try_from(len - 1).unwrap_or(i64::MAX);
    let mut p = index;
    while p < 0 || p > last {
        p = if p < 0 { -p } else { 2 * last - p };
    }
    // `p` is in `0..=last` here.
    usize::try_from(p).unwrap_or(0)
}

/// Source indices touched by a centred kernel of `taps` samples, for every
/// output position along an axis of length `len`.
///
/// Laid out as `len` consecutive runs of `taps` indices.
fn tap_indices(len: usize, taps: usize) -> Vec<usize> {
    let span = i64::try_from(taps).unwrap_or(0);
    let radius = span / 2;
    let end = i64::try_from(len).unwrap_or(0);
    let mut indices = Vec::with_capacity(len * taps);
    for pos in 0..end {
        for k in 0..span {
            indices.push(reflect_101(pos + k - radius, len));
        }
    }
    indices
}

/// Correlate `image` with the outer product of `kernel_y` (column) and
/// `kernel_x` (row).
///
/// Rows are filtered first, then columns. Kernels are applied as written
/// (correlation, no flip) and must have odd length so they can be centred.
/// Accumulation is in `f32`.
#[must_use = "returns the filtered image"]
pub fn separable_filter(image: &FloatImage, kernel_x: &[f32], kernel_y: &[f32]) -> FloatImage {
    debug_assert!(kernel_x.len() % 2 == 1, "horizontal kernel must be odd");
    debug_assert!(kernel_y.len() % 2 == 1, "vertical kernel must be odd");

    let (w, h) = image.dimensions();
    let (width, height) = (w as usize, h as usize);
    if width == 0 || height == 0 {
        return image.clone();
    }
    let src: &[f32] = image;

    // Horizontal pass.
    let x_taps = tap_indices(width, kernel_x.len());
    let mut rows = vec![0.0_f32; width * height];
    for (src_row, dst_row) in src.chunks_exact(width).zip(rows.chunks_exact_mut(width)) {
        for (dst, taps) in dst_row.iter_mut().zip(x_taps.chunks_exact(kernel_x.len())) {
            *dst = kernel_x
                .iter()
                .zip(taps)
                .map(|(k, &i)| k * src_row[i])
                .sum();
        }
    }

    // Vertical pass.
    let y_taps = tap_indices(height, kernel_y.len());
    let mut out = FloatImage::new(w, h);
    for (dst_row, taps) in out
        .chunks_exact_mut(width)
        .zip(y_taps.chunks_exact(kernel_y.len()))
    {
        for (x, dst) in dst_row.iter_mut().enumerate() {
            *dst = kernel_y
                .iter()
                .zip(taps)
                .map(|(k, &row)| k * rows[row * width + x])
                .sum();
        }
    }
    out
}
