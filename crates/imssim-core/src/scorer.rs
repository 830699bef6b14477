//! Importance-weighted aggregation of the similarity field.
//!
//! The score is the plain mean of the field over the cells the mask marks
//! important. The reduction is a single row-major pass producing a
//! `(sum, count)` pair, accumulated in `f64`, so repeated runs are
//! bit-identical.

use image::{Luma, Primitive};
use imageproc::definitions::Image;

use crate::ssim::similarity_field;
use crate::types::{
    Dimensions, ImportanceMask, ScoreError, SimilarityField, ensure_nonempty, ensure_same,
};

/// Score two images over the important pixels of `mask`.
///
/// All three inputs must share the same dimensions. Size and mask checks
/// run before any pixel work.
///
/// # Errors
///
/// - [`ScoreError::ZeroSizedImage`] if the images have zero area.
/// - [`ScoreError::DimensionMismatch`] if `b` or `mask` differ in size
///   from `a`.
/// - [`ScoreError::EmptyMask`] if the mask marks no pixel.
pub fn score<P>(
    a: &Image<Luma<P>>,
    b: &Image<Luma<P>>,
    mask: &ImportanceMask,
) -> Result<f64, ScoreError>
where
    P: Primitive + Into<f32>,
{
    let dimensions = Dimensions::from(a.dimensions());
    ensure_nonempty(dimensions)?;
    ensure_same("second image", dimensions, Dimensions::from(b.dimensions()))?;
    ensure_same("importance mask", dimensions, mask.dimensions())?;
    if mask.is_empty() {
        return Err(ScoreError::EmptyMask);
    }

    let field = similarity_field(a, b)?;
    masked_mean(&field, mask)
}

/// Mean of `field` over the cells where `mask` is true.
///
/// # Errors
///
/// Returns [`ScoreError::DimensionMismatch`] if the mask and field differ
/// in size, or [`ScoreError::EmptyMask`] if no cell is important.
#[allow(clippy::cast_precision_loss)]
pub fn masked_mean(field: &SimilarityField, mask: &ImportanceMask) -> Result<f64, ScoreError> {
    ensure_same("importance mask", field.dimensions(), mask.dimensions())?;

    let (sum, count) = field
        .values()
        .iter()
        .zip(mask.cells())
        .filter(|&(_, important)| important)
        .fold((0.0_f64, 0_u64), |(sum, count), (&value, _)| {
            (sum + f64::from(value), count + 1)
        });

    if count == 0 {
        return Err(ScoreError::EmptyMask);
    }
    Ok(sum / count as f64)
}
