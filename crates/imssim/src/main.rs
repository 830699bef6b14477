//! imssim: score a degraded image against its reference.
//!
//! Derives an importance mask from the edges of the reference image and
//! prints the mean structural similarity over the important pixels.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin imssim -- [OPTIONS] <REFERENCE> <DISTORTED>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use image::GrayImage;
use imssim_core::diagnostics::{self, Clock};

/// Importance-masked SSIM between a reference image and a degraded copy.
///
/// Only pixels on intensity edges of the reference contribute to the
/// score. Identical images score 1.0.
#[derive(Debug, Parser)]
#[command(name = "imssim", version)]
struct Cli {
    /// Reference image (PNG, JPEG, BMP, WebP). The importance mask is
    /// derived from this image.
    reference: PathBuf,

    /// Degraded image to compare. Must match the reference dimensions.
    distorted: PathBuf,

    /// Print a JSON summary instead of the bare score.
    #[arg(long)]
    json: bool,

    /// Print per-stage timing diagnostics to stderr.
    #[arg(long)]
    report: bool,

    /// Write the importance mask as an 8-bit image.
    #[arg(long, value_name = "FILE")]
    mask: Option<PathBuf>,

    /// Write the similarity field as an 8-bit image.
    #[arg(long, value_name = "FILE")]
    ssim_map: Option<PathBuf>,
}

fn main() -> ExitCode {
    run(&Cli::parse())
}

fn run(cli: &Cli) -> ExitCode {
    let Some(reference) = read_image(&cli.reference) else {
        return ExitCode::FAILURE;
    };
    let Some(distorted) = read_image(&cli.distorted) else {
        return ExitCode::FAILURE;
    };

    let (evaluation, diagnostics) =
        match diagnostics::evaluate_bytes_with_diagnostics(&reference, &distorted, &StdClock) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Scoring error: {e}");
                return ExitCode::FAILURE;
            }
        };

    if cli.report {
        eprintln!("{}", diagnostics.report());
        eprintln!();
    }

    let mut outputs_written = true;
    if let Some(ref path) = cli.mask {
        outputs_written &= write_image(path, "Mask", evaluation.mask.as_image());
    }
    if let Some(ref path) = cli.ssim_map {
        outputs_written &= write_image(path, "SSIM map", &evaluation.field.to_gray_image());
    }

    if cli.json {
        match serde_json::to_string_pretty(&evaluation.summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing summary: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", format_score(evaluation.score()));
    }

    if outputs_written {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Read an image file, reporting failures on stderr.
fn read_image(path: &Path) -> Option<Vec<u8>> {
    match std::fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            None
        }
    }
}

/// Save an auxiliary output image, reporting the outcome on stderr.
///
/// Returns `false` if the image could not be written.
fn write_image(path: &Path, label: &str, image: &GrayImage) -> bool {
    match image.save(path) {
        Ok(()) => {
            eprintln!(
                "{label} written to {} ({}x{})",
                path.display(),
                image.width(),
                image.height(),
            );
            true
        }
        Err(e) => {
            eprintln!("Error writing {label} to {}: {e}", path.display());
            false
        }
    }
}

/// Six fractional digits, like C's `%f`.
fn format_score(score: f64) -> String {
    format!("{score:.6}")
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
