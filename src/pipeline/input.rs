//! Input resolution: normalise a user-supplied path or URL to PDF bytes.
//!
//! The extractor parses the document from memory, so both branches end in a
//! plain byte buffer — a local file is read, a URL is downloaded. We validate
//! the `%PDF` magic bytes before returning so callers get a meaningful error
//! rather than a parser failure deep inside extraction.

use crate::error::AltTextError;
use std::path::PathBuf;
use tracing::{debug, info};

/// The resolved input: raw PDF bytes plus a display name used for the
/// output file (`report.pdf` → `report_alt_text.txt`).
#[derive(Debug)]
pub struct ResolvedInput {
    pub bytes: Vec<u8>,
    pub name: String,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to PDF bytes.
///
/// If the input is a URL, download it with the given timeout.
/// If the input is a local file, read it and validate permissions.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, AltTextError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else if input.contains("://") {
        // Some other scheme (ftp://, file://): not a path, not supported.
        Err(AltTextError::InvalidInput {
            input: input.to_string(),
        })
    } else {
        resolve_local(input)
    }
}

/// Read a local file, validating existence and PDF magic bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, AltTextError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(AltTextError::FileNotFound { path });
    }

    let bytes = match std::fs::read(&path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(AltTextError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(AltTextError::FileNotFound { path });
        }
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "document.pdf".to_string());

    check_magic(&bytes, &name)?;

    debug!("Resolved local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(ResolvedInput { bytes, name })
}

/// Download a URL into memory and return the bytes.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, AltTextError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AltTextError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            AltTextError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            AltTextError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(AltTextError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let name = extract_filename(url);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AltTextError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?
        .to_vec();

    check_magic(&bytes, &name)?;

    info!("Downloaded {} bytes as '{}'", bytes.len(), name);
    Ok(ResolvedInput { bytes, name })
}

/// Validate the `%PDF` magic bytes.
pub(crate) fn check_magic(bytes: &[u8], name: &str) -> Result<(), AltTextError> {
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(AltTextError::NotAPdf {
            name: name.to_string(),
            magic,
        });
    }
    Ok(())
}

/// Extract a reasonable filename from the URL path.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn magic_check_accepts_pdf_header() {
        assert!(check_magic(b"%PDF-1.7\n...", "a.pdf").is_ok());
    }

    #[test]
    fn magic_check_rejects_other_bytes() {
        let err = check_magic(b"<html>", "a.pdf").unwrap_err();
        assert!(matches!(err, AltTextError::NotAPdf { .. }));
        let err = check_magic(b"%P", "short.pdf").unwrap_err();
        assert!(matches!(err, AltTextError::NotAPdf { .. }));
    }

    #[test]
    fn filename_from_url_path() {
        assert_eq!(
            extract_filename("https://example.com/docs/report.pdf"),
            "report.pdf"
        );
        assert_eq!(extract_filename("https://example.com/"), "downloaded.pdf");
    }

    #[test]
    fn unsupported_scheme_is_invalid_input() {
        let err = tokio_test::block_on(resolve_input("ftp://example.com/doc.pdf", 5)).unwrap_err();
        assert!(matches!(err, AltTextError::InvalidInput { .. }));
    }

    #[test]
    fn missing_local_file_errors() {
        let err = resolve_local("/definitely/not/a/real/file.pdf").unwrap_err();
        assert!(matches!(err, AltTextError::FileNotFound { .. }));
    }
}
