//! Evaluation diagnostics: timing and counts for each scoring stage.
//!
//! Timestamps come from a caller-supplied [`Clock`], so this crate stays
//! free of platform time APIs. Durations are [`std::time::Duration`] and
//! are serialized as fractional seconds (`f64`) for JSON compatibility.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, Evaluation, ScoreError, ScoreSummary};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationDiagnostics {
    /// Stage 0: decoding both images to grayscale.
    pub decode: StageDiagnostics,
    /// Stage 1: importance mask from the reference.
    pub importance: StageDiagnostics,
    /// Stage 2: similarity field.
    pub similarity: StageDiagnostics,
    /// Stage 3: masked aggregation.
    pub aggregation: StageDiagnostics,
    /// Total wall-clock duration of the evaluation (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Final score and counts.
    pub summary: ScoreSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Image decoding metrics.
    Decode {
        /// Size of the encoded reference image.
        reference_bytes: usize,
        /// Size of the encoded distorted image.
        distorted_bytes: usize,
        /// Decoded reference dimensions.
        dimensions: Dimensions,
    },
    /// Importance mask metrics.
    Importance {
        /// Pixels marked important.
        important_pixels: u64,
        /// Total pixel count, for computing coverage.
        total_pixels: u64,
    },
    /// Similarity field metrics.
    Similarity {
        /// Gaussian window side length.
        kernel_size: usize,
        /// Gaussian standard deviation.
        sigma: f64,
        /// Smallest field value.
        min: f32,
        /// Largest field value.
        max: f32,
        /// Mean over every pixel, ignoring the mask.
        unmasked_mean: f64,
    },
    /// Aggregation metrics.
    Aggregation {
        /// Number of values averaged.
        averaged_pixels: u64,
        /// Resulting score.
        score: f64,
    },
}

/// Decode and evaluate two encoded images, timing every stage.
///
/// Produces the same [`Evaluation`] as [`crate::evaluate_bytes`].
///
/// # Errors
///
/// Same as [`crate::evaluate_bytes`].
pub fn evaluate_bytes_with_diagnostics<C: Clock>(
    reference_bytes: &[u8],
    distorted_bytes: &[u8],
    clock: &C,
) -> Result<(Evaluation, EvaluationDiagnostics), ScoreError> {
    let start = clock.now();

    let stage = clock.now();
    let reference = crate::grayscale::decode_and_grayscale(reference_bytes)?;
    let distorted = crate::grayscale::decode_and_grayscale(distorted_bytes)?;
    let dimensions = crate::check_pair(&reference, &distorted)?;
    let decode = StageDiagnostics {
        duration: clock.elapsed(&stage),
        metrics: StageMetrics::Decode {
            reference_bytes: reference_bytes.len(),
            distorted_bytes: distorted_bytes.len(),
            dimensions,
        },
    };

    let stage = clock.now();
    let mask = crate::reference_mask(&reference)?;
    let importance = StageDiagnostics {
        duration: clock.elapsed(&stage),
        metrics: StageMetrics::Importance {
            important_pixels: mask.count(),
            total_pixels: dimensions.pixel_count(),
        },
    };

    let stage = clock.now();
    let field = crate::ssim::similarity_field(&reference, &distorted)?;
    let (min, max) = field
        .values()
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let similarity = StageDiagnostics {
        duration: clock.elapsed(&stage),
        metrics: StageMetrics::Similarity {
            kernel_size: crate::blur::KERNEL_SIZE,
            sigma: crate::blur::SIGMA,
            min,
            max,
            unmasked_mean: field.mean().unwrap_or(f64::NAN),
        },
    };

    let stage = clock.now();
    let score = crate::scorer::masked_mean(&field, &mask)?;
    let summary = ScoreSummary::new(score, &mask);
    let aggregation = StageDiagnostics {
        duration: clock.elapsed(&stage),
        metrics: StageMetrics::Aggregation {
            averaged_pixels: summary.important_pixels,
            score,
        },
    };

    let diagnostics = EvaluationDiagnostics {
        decode,
        importance,
        similarity,
        aggregation,
        total_duration: clock.elapsed(&start),
        summary,
    };
    Ok((
        Evaluation {
            mask,
            field,
            summary,
        },
        diagnostics,
    ))
}

impl EvaluationDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Evaluation Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {} ({} pixels)",
            self.summary.dimensions, self.summary.total_pixels,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Decode", &self.decode),
            ("Importance", &self.importance),
            ("Similarity", &self.similarity),
            ("Aggregation", &self.aggregation),
        ];
        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Score: {:.6}  |  Important pixels: {}/{}",
            self.summary.score, self.summary.important_pixels, self.summary.total_pixels,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            reference_bytes,
            distorted_bytes,
            dimensions,
        } => format!("{reference_bytes}+{distorted_bytes} bytes -> {dimensions}"),
        StageMetrics::Importance {
            important_pixels,
            total_pixels,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let coverage = if *total_pixels > 0 {
                *important_pixels as f64 / *total_pixels as f64 * 100.0
            } else {
                0.0
            };
            format!("important={important_pixels} ({coverage:.1}%)")
        }
        StageMetrics::Similarity {
            kernel_size,
            sigma,
            min,
            max,
            unmasked_mean,
        } => format!(
            "window={kernel_size}x{kernel_size} sigma={sigma:.2} range=[{min:.4}, {max:.4}] mean={unmasked_mean:.4}",
        ),
        StageMetrics::Aggregation {
            averaged_pixels,
            score,
        } => format!("{averaged_pixels} px -> {score:.6}"),
    }
}
