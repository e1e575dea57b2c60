//! Output types: per-image results, run statistics, and label formatting.
//!
//! The final artifact is a plain-text file with one label per image,
//! blank-line separated. Everything else here exists so callers can inspect
//! a run programmatically: which images were logos, which were flagged for
//! review, which failed, and how long the stages took.

use crate::error::ImageError;
use serde::{Deserialize, Serialize};

/// The result of processing a single embedded image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResult {
    /// 1-indexed PDF page the image appeared on.
    pub page: u32,
    /// 1-indexed position of the image within its page.
    pub index: usize,
    /// Cleaned alt-text. Empty when `error` is set.
    pub alt_text: String,
    /// Heuristic logo/decorative classification.
    pub is_logo: bool,
    /// Low-confidence extraction flag, surfaced for manual review.
    pub flagged: bool,
    /// Human-readable reason when `flagged` is true.
    pub flag_reason: Option<String>,
    /// Wall-clock duration of the vision call in milliseconds.
    pub duration_ms: u64,
    /// Set when alt-text generation failed for this image.
    pub error: Option<ImageError>,
}

impl ImageResult {
    /// Render this result as its output-file label.
    ///
    /// Format: `Page {page} - Image {index}: {alt}` with an optional
    /// `(Note: {reason})` line appended for flagged images. Failed images
    /// get a placeholder body so the output still contains exactly one
    /// entry per extracted image.
    pub fn label(&self) -> String {
        let body = if self.error.is_some() {
            "(alt-text generation failed)".to_string()
        } else {
            self.alt_text.clone()
        };
        let mut label = format!("Page {} - Image {}: {}", self.page, self.index, body);
        if let Some(ref reason) = self.flag_reason {
            label.push_str(&format!("\n(Note: {})", reason));
        }
        label
    }
}

/// Aggregate statistics for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Total images extracted from the document.
    pub total_images: usize,
    /// Images for which alt-text was generated successfully.
    pub generated: usize,
    /// Images whose vision call failed.
    pub failed: usize,
    /// Images classified as logos/decorative.
    pub logos: usize,
    /// Images flagged for manual review.
    pub flagged: usize,
    /// Total wall-clock duration in milliseconds.
    pub total_duration_ms: u64,
    /// Time spent parsing the PDF and decoding images.
    pub extract_duration_ms: u64,
    /// Time spent in vision API calls.
    pub vision_duration_ms: u64,
}

/// Per-page image counts, returned by [`crate::generate::inspect`].
///
/// Requires no API key; useful for previewing what a run would cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Display name derived from the input (file stem or URL tail).
    pub name: String,
    /// Number of pages in the document.
    pub page_count: usize,
    /// `(page, image_count)` pairs for pages that contain images, in page order.
    pub images_per_page: Vec<(u32, usize)>,
    /// Total embedded images across all pages.
    ///
    /// Counted without decoding, so this is an upper bound: a run may
    /// process fewer images if some streams turn out to be undecodable.
    pub total_images: usize,
}

/// The complete output of an alt-text generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    /// The assembled output text: one label per image, blank-line separated.
    pub text: String,
    /// Per-image results in page/index order.
    pub images: Vec<ImageResult>,
    /// Aggregate counts and timings.
    pub stats: RunStats,
    /// The file name the text is (or would be) written under,
    /// e.g. `report_alt_text.txt` for an input named `report.pdf`.
    pub output_filename: String,
}

impl RunOutput {
    /// Messages describing every flagged image, for a post-run review list.
    pub fn flagged_messages(&self) -> Vec<String> {
        self.images
            .iter()
            .filter_map(|r| {
                r.flag_reason.as_ref().map(|reason| {
                    format!("Page {} - Image {}: {}", r.page, r.index, reason)
                })
            })
            .collect()
    }
}

/// Derive the output file name from the input's display name.
///
/// `report.pdf` → `report_alt_text.txt`; names without an extension are
/// used as-is.
pub fn output_filename(input_name: &str) -> String {
    let stem = input_name.rsplit_once('.').map_or(input_name, |(s, _)| s);
    format!("{stem}_alt_text.txt")
}

/// Join labels into the final output text, blank-line separated.
pub fn assemble_text(images: &[ImageResult]) -> String {
    images
        .iter()
        .map(ImageResult::label)
        .collect::<Vec<_>>()
        .join("\n\n")
}
