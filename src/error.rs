//! Error types for the pdf2alt library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`AltTextError`] — **Fatal**: the run cannot proceed at all (bad input
//!   file, corrupt PDF, missing API key, output not writable). Returned as
//!   `Err(AltTextError)` from the top-level `generate*` functions.
//!
//! * [`ImageError`] — **Non-fatal**: a single image failed (undecodable
//!   stream, vision API error) but all other images are fine. Stored inside
//!   [`crate::output::ImageResult`] so callers can inspect partial success
//!   rather than losing the whole document to one bad image.
//!
//! The separation lets callers decide their own tolerance: abort on the first
//! image failure, log and continue, or collect all errors for a final report.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2alt library.
///
/// Image-level failures use [`ImageError`] and are stored in
/// [`crate::output::ImageResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum AltTextError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: {path:?}\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading {path:?}\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{name}'\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{name}' is corrupt: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    CorruptPdf { name: String, detail: String },

    // ── Provider errors ───────────────────────────────────────────────────
    /// No API key was supplied for the selected provider.
    #[error("No API key configured for provider '{provider}'.\n{hint}")]
    MissingApiKey { provider: String, hint: String },

    /// The key-validation call against the provider's model listing failed.
    #[error("API key check failed for provider '{provider}': {detail}")]
    KeyCheckFailed { provider: String, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output text file.
    #[error("Failed to write output file {path:?}: {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single image.
///
/// Stored alongside [`crate::output::ImageResult`] when an image fails.
/// The run continues; the image still receives a placeholder label so the
/// output keeps exactly one entry per extracted image.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageError {
    /// The image stream could not be decoded into pixels.
    #[error("Page {page} image {index}: decode failed: {detail}")]
    DecodeFailed {
        page: u32,
        index: usize,
        detail: String,
    },

    /// The vision API call failed or returned an unusable response.
    #[error("Page {page} image {index}: alt-text generation failed: {detail}")]
    GenerationFailed {
        page: u32,
        index: usize,
        detail: String,
    },

    /// The vision API call timed out.
    #[error("Page {page} image {index}: vision API call timed out after {secs}s")]
    Timeout { page: u32, index: usize, secs: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_check_display() {
        let e = AltTextError::KeyCheckFailed {
            provider: "openai".into(),
            detail: "HTTP 401 Unauthorized".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("openai"), "got: {msg}");
        assert!(msg.contains("401"));
    }

    #[test]
    fn missing_key_display() {
        let e = AltTextError::MissingApiKey {
            provider: "groq".into(),
            hint: "Set GROQ_API_KEY or pass --api-key.".into(),
        };
        assert!(e.to_string().contains("groq"));
        assert!(e.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn generation_failed_display() {
        let e = ImageError::GenerationFailed {
            page: 3,
            index: 2,
            detail: "HTTP 429".into(),
        };
        assert!(e.to_string().contains("Page 3"));
        assert!(e.to_string().contains("429"));
    }

    #[test]
    fn timeout_display() {
        let e = ImageError::Timeout {
            page: 1,
            index: 1,
            secs: 60,
        };
        assert!(e.to_string().contains("60s"));
    }
}
