//! Run orchestration: the top-level `generate*` entry points.
//!
//! The pipeline is strictly sequential: each image is preprocessed, encoded,
//! sent to the provider, and cleaned before the next image starts. A failed
//! image records its error on the [`ImageResult`] and the run continues;
//! only document-level problems (unreadable input, corrupt PDF, missing key,
//! unwritable output) abort the run.

use crate::config::RunConfig;
use crate::error::{AltTextError, ImageError};
use crate::output::{
    assemble_text, output_filename, DocumentSummary, ImageResult, RunOutput, RunStats,
};
use crate::pipeline::vision::VisionClient;
use crate::pipeline::{cleanup, encode, extract, input, preprocess};
use crate::prompts::build_prompt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Generate alt-text for every embedded image in a PDF.
///
/// `input` is a local path or an `http(s)://` URL. The output text is
/// returned but not written anywhere; use [`generate_to_file`] for the file
/// artifact.
pub async fn generate(input: &str, config: &RunConfig) -> Result<RunOutput, AltTextError> {
    let resolved = input::resolve_input(input, config.download_timeout_secs).await?;
    generate_from_bytes(&resolved.bytes, &resolved.name, config).await
}

/// Generate alt-text from in-memory PDF bytes.
///
/// `name` is the display name used for output naming (`report.pdf` →
/// `report_alt_text.txt`).
pub async fn generate_from_bytes(
    bytes: &[u8],
    name: &str,
    config: &RunConfig,
) -> Result<RunOutput, AltTextError> {
    let run_start = Instant::now();
    input::check_magic(bytes, name)?;

    let extract_start = Instant::now();
    let pages = extract::extract_images(bytes, name)?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

    let total_images: usize = pages.values().map(Vec::len).sum();
    info!(
        "Extracted {} image(s) across {} page(s) from '{}'",
        total_images,
        pages.len(),
        name
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total_images);
    }

    let mut stats = RunStats {
        total_images,
        extract_duration_ms,
        ..RunStats::default()
    };
    let mut results: Vec<ImageResult> = Vec::with_capacity(total_images);

    // A document without images is a successful, empty run. The key is only
    // resolved once there is something to send.
    if total_images > 0 {
        let client = VisionClient::from_config(config)?;

        for (page, images) in &pages {
            for (i, image) in images.iter().enumerate() {
                let index = i + 1;
                if let Some(ref cb) = config.progress_callback {
                    cb.on_image_start(*page, index);
                }

                let result = process_image(&client, config, image.clone(), *page, index).await;

                match &result.error {
                    None => {
                        stats.generated += 1;
                        if let Some(ref cb) = config.progress_callback {
                            cb.on_image_complete(*page, index, result.alt_text.len());
                        }
                    }
                    Some(err) => {
                        stats.failed += 1;
                        warn!("{}", err);
                        if let Some(ref cb) = config.progress_callback {
                            cb.on_image_error(*page, index, &err.to_string());
                        }
                    }
                }
                if result.is_logo {
                    stats.logos += 1;
                }
                if result.flagged {
                    stats.flagged += 1;
                }
                stats.vision_duration_ms += result.duration_ms;
                results.push(result);
            }
        }
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total_images, stats.generated);
    }

    stats.total_duration_ms = run_start.elapsed().as_millis() as u64;
    info!(
        "Run complete: {}/{} images in {} ms ({} logo(s), {} flagged)",
        stats.generated, stats.total_images, stats.total_duration_ms, stats.logos, stats.flagged
    );

    Ok(RunOutput {
        text: assemble_text(&results),
        images: results,
        stats,
        output_filename: output_filename(name),
    })
}

/// One image through preprocess → encode → vision → cleanup.
///
/// Never fails the run: every error path returns an [`ImageResult`] carrying
/// the [`ImageError`].
async fn process_image(
    client: &VisionClient,
    config: &RunConfig,
    image: image::DynamicImage,
    page: u32,
    index: usize,
) -> ImageResult {
    let processed = preprocess::preprocess(image, config.max_image_dim);
    let mut result = ImageResult {
        page,
        index,
        alt_text: String::new(),
        is_logo: processed.is_logo,
        flagged: processed.flagged,
        flag_reason: processed.reason.clone(),
        duration_ms: 0,
        error: None,
    };

    let encoded = match encode::encode_png(&processed.image) {
        Ok(e) => e,
        Err(detail) => {
            result.error = Some(ImageError::DecodeFailed {
                page,
                index,
                detail,
            });
            return result;
        }
    };

    let prompt = build_prompt(config.alt_lines, config.language, processed.is_logo);
    let vision_start = Instant::now();
    let raw = client.generate_alt_text(&encoded, &prompt, page, index).await;
    result.duration_ms = vision_start.elapsed().as_millis() as u64;

    match raw {
        Ok(text) => {
            let cleaned = cleanup::clean_alt_text(&text);
            if cleaned.is_empty() {
                result.error = Some(ImageError::GenerationFailed {
                    page,
                    index,
                    detail: "response cleaned to empty text".to_string(),
                });
            } else {
                result.alt_text = cleaned;
            }
        }
        Err(err) => result.error = Some(err),
    }

    result
}

/// Generate alt-text and write the output text file.
///
/// The file lands at `<output_dir>/<stem>_alt_text.txt`, written via a
/// temporary file and rename so a crash never leaves a half-written artifact.
/// Returns the run output and the path written.
pub async fn generate_to_file(
    input: &str,
    config: &RunConfig,
) -> Result<(RunOutput, PathBuf), AltTextError> {
    let output = generate(input, config).await?;
    let path = write_output(&config.output_dir, &output.output_filename, &output.text)?;
    info!("Wrote {}", path.display());
    Ok((output, path))
}

/// Inspect a document without touching the network: page count and per-page
/// image counts. Requires no API key.
pub async fn inspect(input: &str, config: &RunConfig) -> Result<DocumentSummary, AltTextError> {
    let resolved = input::resolve_input(input, config.download_timeout_secs).await?;
    extract::summarize(&resolved.bytes, &resolved.name)
}

/// Blocking wrapper around [`generate_to_file`] for synchronous callers.
pub fn generate_sync(input: &str, config: &RunConfig) -> Result<(RunOutput, PathBuf), AltTextError> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| AltTextError::Internal(format!("failed to start async runtime: {}", e)))?;
    runtime.block_on(generate_to_file(input, config))
}

/// Atomically write `text` to `<dir>/<filename>`, creating `dir` on demand.
fn write_output(dir: &Path, filename: &str, text: &str) -> Result<PathBuf, AltTextError> {
    let wrap = |path: &Path, source: std::io::Error| AltTextError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(|e| wrap(dir, e))?;
    let final_path = dir.join(filename);
    let tmp_path = dir.join(format!(".{}.tmp", filename));

    std::fs::write(&tmp_path, text).map_err(|e| wrap(&tmp_path, e))?;
    std::fs::rename(&tmp_path, &final_path).map_err(|e| wrap(&final_path, e))?;
    Ok(final_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_output_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let path = write_output(&nested, "doc_alt_text.txt", "Page 1 - Image 1: A cat.").unwrap();
        assert_eq!(path, nested.join("doc_alt_text.txt"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Page 1 - Image 1: A cat.");
    }

    #[test]
    fn write_output_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        write_output(dir.path(), "x_alt_text.txt", "text").unwrap();
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn write_output_overwrites_existing() {
        let dir = tempfile::tempdir().unwrap();
        write_output(dir.path(), "doc_alt_text.txt", "old").unwrap();
        let path = write_output(dir.path(), "doc_alt_text.txt", "new").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "new");
    }

    #[test]
    fn non_pdf_bytes_are_rejected_before_extraction() {
        let config = RunConfig::default();
        let err = tokio_test::block_on(generate_from_bytes(b"<html></html>", "page.html", &config))
            .unwrap_err();
        assert!(matches!(err, AltTextError::NotAPdf { .. }));
    }
}
