//! Importance mask: which pixels count toward the score.
//!
//! A pixel is important when its 8-bit edge magnitude (see
//! [`crate::edge`]) exceeds [`IMPORTANCE_THRESHOLD`]. With a threshold of
//! zero, any pixel with a measurable gradient is kept; only locally flat
//! regions are excluded.

use image::{GrayImage, Luma, Primitive};
use imageproc::definitions::Image;

use crate::edge::gradient_magnitude;
use crate::types::{Dimensions, ImportanceMask, ScoreError, ensure_nonempty};

/// Edge magnitudes strictly above this value mark a pixel as important.
pub const IMPORTANCE_THRESHOLD: u8 = 0;

/// Build the importance mask of an image from its edge magnitude.
///
/// A uniform image has zero gradient everywhere and yields an all-false
/// mask. That is a valid mask, but scoring with it fails with
/// [`ScoreError::EmptyMask`].
///
/// # Errors
///
/// Returns [`ScoreError::ZeroSizedImage`] if the image has zero width or
/// height.
pub fn build_importance_mask<P>(image: &Image<Luma<P>>) -> Result<ImportanceMask, ScoreError>
where
    P: Primitive + Into<f32>,
{
    ensure_nonempty(Dimensions::from(image.dimensions()))?;
    Ok(threshold(&gradient_magnitude(image)))
}

/// Threshold an edge magnitude map into a mask.
#[must_use = "returns the importance mask"]
pub fn threshold(magnitude: &GrayImage) -> ImportanceMask {
    ImportanceMask::from_fn(magnitude.width(), magnitude.height(), |x, y| {
        magnitude.get_pixel(x, y).0[0] > IMPORTANCE_THRESHOLD
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::FloatImage;

    #[test]
    fn uniform_image_yields_empty_mask() {
        let img = GrayImage::from_pixel(16, 16, Luma([128]));
        let mask = build_importance_mask(&img).unwrap();
        assert!(mask.is_empty());
        assert_eq!(mask.dimensions(), Dimensions::new(16, 16));
    }

    #[test]
    fn step_edge_marks_both_sides_of_boundary() {
        let img = GrayImage::from_fn(12, 6, |x, _| Luma([if x < 6 { 30 } else { 200 }]));
        let mask = build_importance_mask(&img).unwrap();
        assert_eq!(mask.count(), 2 * 6);
        for y in 0..6 {
            assert!(mask.is_important(5, y));
            assert!(mask.is_important(6, y));
            assert!(!mask.is_important(0, y));
            assert!(!mask.is_important(11, y));
        }
    }

    #[test]
    fn faint_gradient_rounds_away() {
        // |Gx| = 4 * 0.25 = 1 beside the step, and 0.5 * 1 rounds half to
        // even, down to 0.
        let img = FloatImage::from_fn(5, 5, |x, _| Luma([if x >= 3 { 0.25 } else { 0.0 }]));
        let mask = build_importance_mask(&img).unwrap();
        assert!(mask.is_empty());
    }

    #[test]
    fn float_input_uses_same_rule() {
        let img = FloatImage::from_fn(8, 8, |x, _| Luma([if x < 4 { 0.0 } else { 100.0 }]));
        let mask = build_importance_mask(&img).unwrap();
        assert!(mask.is_important(3, 0));
        assert!(mask.is_important(4, 7));
        assert!(!mask.is_important(0, 0));
    }

    #[test]
    fn zero_area_image_is_rejected() {
        let result = build_importance_mask(&GrayImage::new(0, 4));
        assert!(matches!(result, Err(ScoreError::ZeroSizedImage(_))));
    }

    #[test]
    fn threshold_is_strictly_greater_than_zero() {
        let magnitude = GrayImage::from_raw(3, 1, vec![0, 1, 255]).unwrap();
        let mask = threshold(&magnitude);
        assert_eq!(mask.cells().collect::<Vec<_>>(), vec![false, true, true]);
    }

    #[test]
    fn mask_is_deterministic() {
        let img = GrayImage::from_fn(9, 7, |x, y| {
            Luma([u8::try_from((x * y * 29) % 256).unwrap()])
        });
        assert_eq!(
            build_importance_mask(&img).unwrap(),
            build_importance_mask(&img).unwrap(),
        );
    }
}
