//! imssim-core: importance-masked structural similarity (sans-IO).
//!
//! Scores a degraded image against its reference, counting only the
//! pixels that sit on intensity edges of the reference:
//!
//! 1. Sobel edge magnitude of the reference -> binary importance mask
//!    ([`importance`], built on [`edge`])
//! 2. Per-pixel SSIM of the two images ([`ssim`], built on [`blur`])
//! 3. Mean of the SSIM field over the important pixels ([`scorer`])
//!
//! Every convolution uses the same reflect-101 border policy
//! ([`filter`]).
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! images or byte slices. File handling lives in the `imssim` binary.

pub mod blur;
pub mod diagnostics;
pub mod edge;
pub mod filter;
pub mod grayscale;
pub mod importance;
pub mod scorer;
pub mod ssim;
pub mod types;

use image::{Luma, Primitive};
use imageproc::definitions::Image;

pub use importance::build_importance_mask;
pub use scorer::{masked_mean, score};
pub use ssim::similarity_field;
pub use types::{
    Dimensions, Evaluation, FloatImage, GrayImage, ImportanceMask, ScoreError, ScoreSummary,
    SimilarityField,
};

use types::{ensure_nonempty, ensure_same};

/// Score `distorted` against `reference`, deriving the importance mask
/// from `reference`.
///
/// The mask and the similarity field are returned alongside the score for
/// inspection.
///
/// # Errors
///
/// Returns [`ScoreError::ZeroSizedImage`] if the images have zero area.
/// Returns [`ScoreError::DimensionMismatch`] if the two sizes differ.
/// Returns [`ScoreError::EmptyMask`] if the reference has no edges (for
/// example, a uniform image).
pub fn evaluate<P>(
    reference: &Image<Luma<P>>,
    distorted: &Image<Luma<P>>,
) -> Result<Evaluation, ScoreError>
where
    P: Primitive + Into<f32>,
{
    check_pair(reference, distorted)?;
    let mask = reference_mask(reference)?;
    let field = similarity_field(reference, distorted)?;
    let score = masked_mean(&field, &mask)?;
    let summary = ScoreSummary::new(score, &mask);
    Ok(Evaluation {
        mask,
        field,
        summary,
    })
}

/// Size checks for a reference/distorted pair, run before any pixel work.
pub(crate) fn check_pair<P>(
    reference: &Image<Luma<P>>,
    distorted: &Image<Luma<P>>,
) -> Result<Dimensions, ScoreError>
where
    P: Primitive,
{
    let dimensions = Dimensions::from(reference.dimensions());
    ensure_nonempty(dimensions)?;
    ensure_same(
        "distorted image",
        dimensions,
        Dimensions::from(distorted.dimensions()),
    )?;
    Ok(dimensions)
}

/// Importance mask of the reference, rejected if it selects nothing.
pub(crate) fn reference_mask<P>(reference: &Image<Luma<P>>) -> Result<ImportanceMask, ScoreError>
where
    P: Primitive + Into<f32>,
{
    let mask = build_importance_mask(reference)?;
    if mask.is_empty() {
        return Err(ScoreError::EmptyMask);
    }
    Ok(mask)
}

/// Decode two encoded images (PNG, JPEG, BMP, WebP) to 8-bit grayscale
/// and [`evaluate`] them.
///
/// # Errors
///
/// Returns [`ScoreError::EmptyInput`] or [`ScoreError::ImageDecode`] if
/// either image cannot be decoded, plus every error of [`evaluate`].
pub fn evaluate_bytes(reference: &[u8], distorted: &[u8]) -> Result<Evaluation, ScoreError> {
    let reference = grayscale::decode_and_grayscale(reference)?;
    let distorted = grayscale::decode_and_grayscale(distorted)?;
    evaluate(&reference, &distorted)
}
