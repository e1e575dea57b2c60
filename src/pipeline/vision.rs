//! Vision-language provider client.
//!
//! Both supported providers (OpenAI, Groq) expose the OpenAI
//! chat-completions wire format, so a single client covers both; only the
//! base URL, model and key differ, all taken from [`crate::config`].
//!
//! Every image gets exactly one request. There is no retry or backoff:
//! a failed call is recorded as a per-image [`ImageError`] and the run moves
//! on to the next image.

use crate::config::{Provider, RunConfig};
use crate::error::{AltTextError, ImageError};
use crate::pipeline::encode::EncodedImage;
use crate::prompts::SYSTEM_PROMPT;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Client for one run's vision calls. Holds the resolved key and model so
/// per-image calls are cheap.
pub struct VisionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    timeout_secs: u64,
}

impl VisionClient {
    /// Build a client from the run configuration, resolving the API key.
    pub fn from_config(config: &RunConfig) -> Result<Self, AltTextError> {
        let api_key = config.resolve_api_key()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| AltTextError::Internal(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.provider.base_url().to_string(),
            api_key,
            model: config.effective_model().to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.api_timeout_secs,
        })
    }

    /// Generate alt-text for one encoded image.
    ///
    /// `page`/`index` identify the image for error reporting only; they are
    /// not sent to the provider.
    pub async fn generate_alt_text(
        &self,
        image: &EncodedImage,
        prompt: &str,
        page: u32,
        index: usize,
    ) -> Result<String, ImageError> {
        let body = build_request(&self.model, prompt, &image.to_data_uri(), self.temperature, self.max_tokens);
        let url = format!("{}/chat/completions", self.base_url);
        debug!("Vision request for page {} image {} -> {}", page, index, url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ImageError::Timeout {
                        page,
                        index,
                        secs: self.timeout_secs,
                    }
                } else {
                    ImageError::GenerationFailed {
                        page,
                        index,
                        detail: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .map(|t| format!("HTTP {}: {}", status, excerpt(&t)))
                .unwrap_or_else(|_| format!("HTTP {}", status));
            warn!("Vision call failed for page {} image {}: {}", page, index, detail);
            return Err(ImageError::GenerationFailed { page, index, detail });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| ImageError::GenerationFailed {
            page,
            index,
            detail: format!("malformed response body: {}", e),
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(ImageError::GenerationFailed {
                page,
                index,
                detail: "provider returned empty content".to_string(),
            });
        }

        Ok(content)
    }
}

/// Validate an API key against the provider's model listing endpoint.
///
/// A 2xx response means the key is usable; anything else is surfaced with
/// the HTTP status so the user can tell an expired key (401) from a network
/// problem.
pub async fn validate_key(
    provider: Provider,
    api_key: &str,
    timeout_secs: u64,
) -> Result<(), AltTextError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AltTextError::Internal(format!("HTTP client build failed: {}", e)))?;

    let url = format!("{}/models", provider.base_url());
    let response = client
        .get(&url)
        .bearer_auth(api_key)
        .send()
        .await
        .map_err(|e| AltTextError::KeyCheckFailed {
            provider: provider.name().to_string(),
            detail: e.to_string(),
        })?;

    let status = response.status();
    if status.is_success() {
        debug!("Key check passed for {}", provider);
        Ok(())
    } else {
        Err(AltTextError::KeyCheckFailed {
            provider: provider.name().to_string(),
            detail: format!("HTTP {}", status),
        })
    }
}

/// Build the chat-completions request body.
fn build_request(
    model: &str,
    prompt: &str,
    data_uri: &str,
    temperature: f32,
    max_tokens: usize,
) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            Message {
                role: "system",
                content: MessageContent::Text(SYSTEM_PROMPT.to_string()),
            },
            Message {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: data_uri.to_string(),
                        },
                    },
                ]),
            },
        ],
        temperature,
        max_tokens,
    }
}

fn excerpt(text: &str) -> String {
    const MAX: usize = 300;
    if text.len() <= MAX {
        text.trim().to_string()
    } else {
        let mut end = MAX;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", text[..end].trim())
    }
}

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
