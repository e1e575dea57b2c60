//! Image encoding for multimodal requests.
//!
//! PNG is used for every image regardless of its source format: it is
//! lossless, so the provider sees exactly the pixels the preprocessor
//! produced, and both providers accept it in `image_url` data URIs.

use base64::Engine;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// A base64-encoded image ready to embed in a request body.
pub struct EncodedImage {
    /// Base64-encoded PNG bytes (standard alphabet, padded).
    pub data: String,
    /// Always `image/png`.
    pub mime_type: &'static str,
}

impl EncodedImage {
    /// Render as a `data:` URI for OpenAI-style `image_url` content parts.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// PNG-encode and base64-wrap an image.
pub fn encode_png(image: &DynamicImage) -> Result<EncodedImage, String> {
    let mut png_bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png_bytes), image::ImageFormat::Png)
        .map_err(|e| format!("PNG encoding failed: {}", e))?;

    let data = base64::engine::general_purpose::STANDARD.encode(&png_bytes);
    debug!(
        "Encoded {}x{} image: {} PNG bytes, {} base64 chars",
        image.width(),
        image.height(),
        png_bytes.len(),
        data.len()
    );

    Ok(EncodedImage {
        data,
        mime_type: "image/png",
    })
}
