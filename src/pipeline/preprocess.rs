//! Image normalisation and deterministic classification.
//!
//! Two independent verdicts are produced per image, both from fixed
//! thresholds (no learned models, no network):
//!
//! - **Logo**: small marks and decorative strips get a different prompt so
//!   the VLM identifies them instead of describing pixels.
//! - **Flagged**: images unlikely to yield a reliable description carry a
//!   human-readable reason that surfaces as a note on the final label.
//!
//! Classification runs on the image's *original* dimensions; downscaling to
//! `max_dim` happens afterwards and only affects the bytes sent to the
//! provider.

use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

/// Longest edge at or below this is treated as a logo-sized mark.
const LOGO_MAX_EDGE: u32 = 160;
/// Aspect ratio beyond which a low-variance image is a banner/rule → logo.
const LOGO_ASPECT: f32 = 3.0;
/// Colour variance below this counts as "low" for the logo heuristic.
const LOGO_LOW_VARIANCE: f32 = 300.0;

/// Shortest edge below this flags the image as too small to describe.
const FLAG_MIN_EDGE: u32 = 32;
/// Near-zero colour variance: essentially a solid fill.
const FLAG_LOW_VARIANCE: f32 = 50.0;
/// Aspect ratio beyond which the image is flagged outright.
const FLAG_MAX_ASPECT: f32 = 8.0;

/// Cap on the number of pixels sampled for the variance estimate.
const VARIANCE_SAMPLE_CAP: usize = 10_000;

/// A normalised image plus its classification verdicts.
pub struct ProcessedImage {
    /// RGB8, longest edge at most `max_dim`.
    pub image: DynamicImage,
    pub is_logo: bool,
    pub flagged: bool,
    /// Present iff `flagged`.
    pub reason: Option<String>,
}

/// Classify and normalise one extracted image.
pub fn preprocess(image: DynamicImage, max_dim: u32) -> ProcessedImage {
    let width = image.width();
    let height = image.height();
    let variance = color_variance(&image);
    let aspect = aspect_ratio(width, height);

    let is_logo = width.max(height) <= LOGO_MAX_EDGE
        || (variance < LOGO_LOW_VARIANCE && aspect > LOGO_ASPECT);

    let (flagged, reason) = flag_verdict(width, height, variance, aspect);

    debug!(
        "Classified {}x{} image: variance={:.1} aspect={:.1} logo={} flagged={}",
        width, height, variance, aspect, is_logo, flagged
    );

    let normalised = normalise(image, max_dim);

    ProcessedImage {
        image: normalised,
        is_logo,
        flagged,
        reason,
    }
}

fn flag_verdict(width: u32, height: u32, variance: f32, aspect: f32) -> (bool, Option<String>) {
    if width.min(height) < FLAG_MIN_EDGE {
        return (true, Some("too small for reliable description".to_string()));
    }
    if variance < FLAG_LOW_VARIANCE {
        return (true, Some("low color variance".to_string()));
    }
    if aspect > FLAG_MAX_ASPECT {
        return (true, Some("extreme aspect ratio".to_string()));
    }
    (false, None)
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    let long = width.max(height).max(1) as f32;
    let short = width.min(height).max(1) as f32;
    long / short
}

/// Convert to RGB8 and downscale so the longest edge fits `max_dim`.
fn normalise(image: DynamicImage, max_dim: u32) -> DynamicImage {
    let width = image.width();
    let height = image.height();
    let longest = width.max(height);

    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    if longest <= max_dim {
        return rgb;
    }

    let scale = max_dim as f32 / longest as f32;
    let new_w = ((width as f32 * scale).round() as u32).max(1);
    let new_h = ((height as f32 * scale).round() as u32).max(1);
    debug!("Downscaling {}x{} -> {}x{}", width, height, new_w, new_h);
    rgb.resize(new_w, new_h, FilterType::Lanczos3)
}

/// Mean per-channel variance over a bounded pixel sample.
///
/// Sampling keeps cost flat regardless of image size: at most
/// `VARIANCE_SAMPLE_CAP` pixels are visited, stepping uniformly through the
/// raster.
fn color_variance(image: &DynamicImage) -> f32 {
    let rgb = image.to_rgb8();
    let pixels = rgb.pixels().len();
    if pixels == 0 {
        return 0.0;
    }
    let step = (pixels / VARIANCE_SAMPLE_CAP).max(1);

    let mut sums = [0.0f64; 3];
    let mut sq_sums = [0.0f64; 3];
    let mut n = 0.0f64;
    for pixel in rgb.pixels().step_by(step) {
        for c in 0..3 {
            let v = pixel.0[c] as f64;
            sums[c] += v;
            sq_sums[c] += v * v;
        }
        n += 1.0;
    }

    let mut total = 0.0f64;
    for c in 0..3 {
        let mean = sums[c] / n;
        total += sq_sums[c] / n - mean * mean;
    }
    (total / 3.0) as f32
}
