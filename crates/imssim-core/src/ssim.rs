//! Per-pixel structural similarity (SSIM) field.
//!
//! Local means, variances and covariance are Gaussian-weighted averages
//! (see [`crate::blur`]):
//!
//! ```text
//! muA  = blur(A)            muB  = blur(B)
//! sA^2 = blur(A*A) - muA^2  sB^2 = blur(B*B) - muB^2
//! sAB  = blur(A*B) - muA*muB
//!
//!        (2 muA muB + C1) (2 sAB + C2)
//! S = -------------------------------------
//!     (muA^2 + muB^2 + C1) (sA^2 + sB^2 + C2)
//! ```
//!
//! All arithmetic is `f32`. The expression is evaluated so that swapping
//! `A` and `B` gives bit-identical output.

use image::{Luma, Primitive};
use imageproc::definitions::Image;

use crate::blur::gaussian_blur;
use crate::grayscale::to_float;
use crate::types::{
    Dimensions, FloatImage, ScoreError, SimilarityField, ensure_nonempty, ensure_same,
};

/// Luminance stabilizer, `(0.01 * 255)^2`.
pub const C1: f32 = 6.5025;

/// Contrast/structure stabilizer, `(0.03 * 255)^2`.
pub const C2: f32 = 58.5225;

/// Compute the similarity field of two equally sized images.
///
/// Samples are widened to `f32` without rescaling; the constants assume an
/// 8-bit dynamic range.
///
/// # Errors
///
/// Returns [`ScoreError::ZeroSizedImage`] if the images have zero area,
/// or [`ScoreError::DimensionMismatch`] if their sizes differ.
pub fn similarity_field<P>(
    a: &Image<Luma<P>>,
    b: &Image<Luma<P>>,
) -> Result<SimilarityField, ScoreError>
where
    P: Primitive + Into<f32>,
{
    let dimensions = Dimensions::from(a.dimensions());
    ensure_nonempty(dimensions)?;
    ensure_same("second image", dimensions, Dimensions::from(b.dimensions()))?;

    let a = to_float(a);
    let b = to_float(b);

    let mu_a = gaussian_blur(&a);
    let mu_b = gaussian_blur(&b);
    let blur_a_sq = gaussian_blur(&product(&a, &a));
    let blur_b_sq = gaussian_blur(&product(&b, &b));
    let blur_ab = gaussian_blur(&product(&a, &b));

    let mut out = FloatImage::new(dimensions.width, dimensions.height);
    let pixels = out
        .iter_mut()
        .zip(mu_a.iter().zip(mu_b.iter()))
        .zip(blur_a_sq.iter().zip(blur_b_sq.iter()))
        .zip(blur_ab.iter());
    for (((dst, (&mu_a, &mu_b)), (&a_sq, &b_sq)), &ab) in pixels {
        *dst = similarity(mu_a, mu_b, a_sq, b_sq, ab);
    }
    Ok(SimilarityField::new(out))
}

/// SSIM of one pixel from its blurred moments.
fn similarity(mu_a: f32, mu_b: f32, blur_a_sq: f32, blur_b_sq: f32, blur_ab: f32) -> f32 {
    let mu_a_sq = mu_a * mu_a;
    let mu_b_sq = mu_b * mu_b;
    let mu_ab = mu_a * mu_b;

    let sigma_a_sq = blur_a_sq - mu_a_sq;
    let sigma_b_sq = blur_b_sq - mu_b_sq;
    let sigma_ab = blur_ab - mu_ab;

    let numerator = (2.0 * mu_ab + C1) * (2.0 * sigma_ab + C2);
    let denominator = (mu_a_sq + mu_b_sq + C1) * (sigma_a_sq + sigma_b_sq + C2);
    numerator / denominator
}

/// Elementwise product of two equally sized images.
fn product(x: &FloatImage, y: &FloatImage) -> FloatImage {
    let mut out = FloatImage::new(x.width(), x.height());
    for ((dst, &p), &q) in out.iter_mut().zip(x.iter()).zip(y.iter()) {
        *dst = p * q;
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::GrayImage;

    use super::*;

    /// Deterministic textured test image.
    fn texture(width: u32, height: u32, seed: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let v = (x * 31 + y * 17 + seed * 7 + (x ^ y) * 5) % 256;
            Luma([u8::try_from(v).unwrap()])
        })
    }

    #[test]
    fn constants_match_eight_bit_range() {
        assert!((C1 - (0.01_f32 * 255.0).powi(2)).abs() < 1e-3);
        assert!((C2 - (0.03_f32 * 255.0).powi(2)).abs() < 1e-3);
    }

    #[test]
    fn identical_images_give_unit_field() {
        let img = texture(24, 18, 3);
        let field = similarity_field(&img, &img).unwrap();
        for &v in field.values() {
            assert!((v - 1.0).abs() < 1e-6, "expected 1.0, got {v}");
        }
    }

    #[test]
    fn field_is_symmetric() {
        let a = texture(20, 20, 1);
        let b = texture(20, 20, 9);
        let ab = similarity_field(&a, &b).unwrap();
        let ba = similarity_field(&b, &a).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn distortion_lowers_similarity() {
        let a = texture(32, 32, 5);
        let noisy = GrayImage::from_fn(32, 32, |x, y| {
            let v = a.get_pixel(x, y).0[0];
            Luma([if (x + y) % 2 == 0 { v.saturating_add(60) } else { v.saturating_sub(60) }])
        });
        let field = similarity_field(&a, &noisy).unwrap();
        let mean = field.mean().unwrap();
        assert!(mean < 0.95, "expected noticeable drop, got {mean}");
        assert!(field.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn uniform_pair_compares_luminance_only() {
        // Flat images: all variances vanish, leaving the luminance term.
        let a = GrayImage::from_pixel(12, 12, Luma([100]));
        let b = GrayImage::from_pixel(12, 12, Luma([120]));
        let field = similarity_field(&a, &b).unwrap();
        let expected = (2.0 * 100.0 * 120.0 + C1) / (100.0_f32.powi(2) + 120.0_f32.powi(2) + C1);
        for &v in field.values() {
            assert!((v - expected).abs() < 1e-3, "expected {expected}, got {v}");
        }
    }

    /// Direct 11x11 windowed statistics in `f64`, mirroring borders
    /// without repeating the edge sample.
    #[allow(
        clippy::cast_possible_wrap,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn windowed_reference(a: &GrayImage, b: &GrayImage) -> Vec<f64> {
        let (w, h) = (i64::from(a.width()), i64::from(a.height()));
        let mirror = |mut i: i64, n: i64| loop {
            if i < 0 {
                i = -i;
            } else if i >= n {
                i = 2 * (n - 1) - i;
            } else {
                break i as u32;
            }
        };
        let raw: Vec<f64> = (-5..=5_i32)
            .map(|d| (-f64::from(d * d) / 4.5).exp())
            .collect();
        let total: f64 = raw.iter().sum();
        let g: Vec<f64> = raw.iter().map(|v| v / total).collect();
        let (c1, c2) = (f64::from(C1), f64::from(C2));

        let mut out = Vec::new();
        for y in 0..h {
            for x in 0..w {
                let (mut ma, mut mb, mut aa, mut bb, mut ab) = (0.0, 0.0, 0.0, 0.0, 0.0);
                for (j, gy) in g.iter().enumerate() {
                    for (i, gx) in g.iter().enumerate() {
                        let sx = mirror(x + i as i64 - 5, w);
                        let sy = mirror(y + j as i64 - 5, h);
                        let weight = gx * gy;
                        let pa = f64::from(a.get_pixel(sx, sy).0[0]);
                        let pb = f64::from(b.get_pixel(sx, sy).0[0]);
                        ma += weight * pa;
                        mb += weight * pb;
                        aa += weight * pa * pa;
                        bb += weight * pb * pb;
                        ab += weight * pa * pb;
                    }
                }
                let (va, vb, cov) = (aa - ma * ma, bb - mb * mb, ab - ma * mb);
                out.push(
                    ((2.0 * ma * mb + c1) * (2.0 * cov + c2))
                        / ((ma * ma + mb * mb + c1) * (va + vb + c2)),
                );
            }
        }
        out
    }

    #[test]
    fn field_matches_direct_windowed_statistics() {
        // Smaller than the window on one axis, so reflection wraps.
        let a = texture(13, 6, 2);
        let b = GrayImage::from_fn(13, 6, |x, y| {
            let v = a.get_pixel(x, y).0[0];
            Luma([if (x * 3 + y) % 4 == 0 { v.wrapping_add(77) } else { v / 2 + 40 }])
        });
        let field = similarity_field(&a, &b).unwrap();
        let expected = windowed_reference(&a, &b);
        assert_eq!(field.values().len(), expected.len());
        for (i, (&got, &want)) in field.values().iter().zip(&expected).enumerate() {
            assert!(
                (f64::from(got) - want).abs() < 1e-4,
                "pixel {i}: expected {want}, got {got}",
            );
        }
    }

    #[test]
    fn field_matches_input_dimensions() {
        let a = texture(7, 13, 0);
        let b = texture(7, 13, 2);
        let field = similarity_field(&a, &b).unwrap();
        assert_eq!(field.dimensions(), Dimensions::new(7, 13));
    }

    #[test]
    fn mismatched_sizes_are_rejected() {
        let result = similarity_field(&GrayImage::new(4, 4), &GrayImage::new(5, 5));
        assert!(matches!(
            result,
            Err(ScoreError::DimensionMismatch {
                expected: Dimensions { width: 4, height: 4 },
                found: Dimensions { width: 5, height: 5 },
                ..
            })
        ));
    }

    #[test]
    fn zero_area_is_rejected() {
        let result = similarity_field(&GrayImage::new(0, 0), &GrayImage::new(0, 0));
        assert!(matches!(result, Err(ScoreError::ZeroSizedImage(_))));
    }
}
