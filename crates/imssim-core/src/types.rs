//! Shared types for importance-masked similarity scoring.

use std::fmt;

use image::Luma;
use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can hand 8-bit images to
/// the scorer without depending on `image` directly.
pub use image::GrayImage;

/// Single-channel floating-point image: the working format for all
/// arithmetic (blur, statistics, similarity).
pub type FloatImage = imageproc::definitions::Image<Luma<f32>>;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create a new dimensions value.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of pixels (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns `true` if either axis is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Binary per-pixel selector of the pixels that contribute to the score.
///
/// Stored as an 8-bit image where important cells hold
/// [`ImportanceMask::IMPORTANT`] and all others hold 0, so the mask can be
/// written out directly for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportanceMask(GrayImage);

impl ImportanceMask {
    /// Pixel value stored for important cells.
    pub const IMPORTANT: u8 = 255;

    /// Build a mask by evaluating `f(x, y)` for every cell.
    #[must_use]
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        Self(GrayImage::from_fn(width, height, |x, y| {
            Luma([if f(x, y) { Self::IMPORTANT } else { 0 }])
        }))
    }

    /// Interpret an arbitrary 8-bit map as a mask: any nonzero cell is
    /// important.
    #[must_use]
    pub fn from_gray(map: &GrayImage) -> Self {
        Self::from_fn(map.width(), map.height(), |x, y| map.get_pixel(x, y).0[0] > 0)
    }

    /// Mask dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::from(self.0.dimensions())
    }

    /// Whether the cell at `(x, y)` is important.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    #[must_use]
    pub fn is_important(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y).0[0] > 0
    }

    /// Row-major iterator over the cells.
    pub fn cells(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().map(|&v| v > 0)
    }

    /// Number of important cells.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.cells().map(u64::from).sum()
    }

    /// Returns `true` if no cell is important.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.cells().any(|important| important)
    }

    /// Fraction of cells that are important (0.0 for a zero-area mask).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn coverage(&self) -> f64 {
        let total = self.dimensions().pixel_count();
        if total == 0 {
            0.0
        } else {
            self.count() as f64 / total as f64
        }
    }

    /// The mask as an 8-bit image (255 = important).
    #[must_use]
    pub const fn as_image(&self) -> &GrayImage {
        &self.0
    }

    /// Consume the mask, returning the underlying 8-bit image.
    #[must_use]
    pub fn into_image(self) -> GrayImage {
        self.0
    }
}

/// Dense per-pixel structural similarity values.
///
/// Values lie near `[-1, 1]` and are not clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityField(FloatImage);

impl SimilarityField {
    pub(crate) const fn new(values: FloatImage) -> Self {
        Self(values)
    }

    /// Field dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::from(self.0.dimensions())
    }

    /// Similarity at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.0.get_pixel(x, y).0[0]
    }

    /// Row-major slice of all values.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        self.0.as_raw()
    }

    /// Unmasked mean over every pixel (classic mean SSIM).
    ///
    /// Returns `None` for a zero-area field.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> Option<f64> {
        let values = self.values();
        if values.is_empty() {
            return None;
        }
        let sum: f64 = values.iter().copied().map(f64::from).sum();
        Some(sum / values.len() as f64)
    }

    /// The field as a floating-point image.
    #[must_use]
    pub const fn as_image(&self) -> &FloatImage {
        &self.0
    }

    /// Render the field for viewing: values are clamped to `[0, 1]` and
    /// scaled to `[0, 255]`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.0.width(), self.0.height(), |x, y| {
            let v = self.0.get_pixel(x, y).0[0].clamp(0.0, 1.0);
            Luma([(v * 255.0).round() as u8])
        })
    }
}

/// Serializable outcome of one scoring run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    /// Mean similarity over the important pixels.
    pub score: f64,
    /// Number of pixels the mask marked important.
    pub important_pixels: u64,
    /// Total pixels in the compared images.
    pub total_pixels: u64,
    /// Dimensions of the compared images.
    pub dimensions: Dimensions,
}

impl ScoreSummary {
    /// Summary of a score taken over `mask`.
    #[must_use]
    pub fn new(score: f64, mask: &ImportanceMask) -> Self {
        let dimensions = mask.dimensions();
        Self {
            score,
            important_pixels: mask.count(),
            total_pixels: dimensions.pixel_count(),
            dimensions,
        }
    }
}

/// Result of [`evaluate`](crate::evaluate), with the intermediate mask and
/// similarity field preserved for inspection.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Importance mask derived from the reference image.
    pub mask: ImportanceMask,
    /// Per-pixel similarity between reference and distorted images.
    pub field: SimilarityField,
    /// Score and pixel counts.
    pub summary: ScoreSummary,
}

impl Evaluation {
    /// The importance-weighted similarity score.
    #[must_use]
    pub const fn score(&self) -> f64 {
        self.summary.score
    }
}

/// Errors that can occur while building masks or scoring.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// Failed to decode an input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// An image has zero width or height.
    #[error("image has zero area ({0})")]
    ZeroSizedImage(Dimensions),

    /// Operands of a scoring operation have different dimensions.
    #[error("{operand} is {found}, expected {expected}")]
    DimensionMismatch {
        /// Which operand disagreed with the first image.
        operand: &'static str,
        /// Dimensions of the first image.
        expected: Dimensions,
        /// Dimensions of the offending operand.
        found: Dimensions,
    },

    /// The importance mask marks no pixel, so the mean is undefined.
    #[error("importance mask selects no pixels")]
    EmptyMask,
}

/// Reject zero-area images.
pub(crate) fn ensure_nonempty(dimensions: Dimensions) -> Result<(), ScoreError> {
    if dimensions.is_empty() {
        Err(ScoreError::ZeroSizedImage(dimensions))
    } else {
        Ok(())
    }
}

/// Reject an operand whose dimensions differ from `expected`.
pub(crate) fn ensure_same(
    operand: &'static str,
    expected: Dimensions,
    found: Dimensions,
) -> Result<(), ScoreError> {
    if expected == found {
        Ok(())
    } else {
        Err(ScoreError::DimensionMismatch {
            operand,
            expected,
            found,
        })
    }
}
