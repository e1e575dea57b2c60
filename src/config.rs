//! Configuration types for alt-text generation.
//!
//! All run behaviour is controlled through [`RunConfig`], built via its
//! [`RunConfigBuilder`]. Keeping every knob in one struct makes it trivial to
//! share configs, serialise them for logging, and diff two runs to understand
//! why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::AltTextError;
use crate::progress::RunProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Remote vision-language provider.
///
/// Both providers speak the OpenAI chat-completions wire format, so the
/// request body is identical; only the base URL, the default model, and the
/// API-key environment variable differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI vision models (default).
    #[default]
    OpenAi,
    /// Groq-hosted open-weight vision models.
    Groq,
}

impl Provider {
    /// Parse a provider from its CLI/user-facing name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "groq" => Some(Self::Groq),
            _ => None,
        }
    }

    /// API base URL (no trailing slash).
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Groq => "https://api.groq.com/openai/v1",
        }
    }

    /// Default vision model when the user does not override one.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Groq => "meta-llama/llama-4-scout-17b-16e-instruct",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn key_env_var(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Groq => "GROQ_API_KEY",
        }
    }

    /// User-facing name, as accepted by [`Provider::parse`].
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Groq => "groq",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output language for the generated alt-text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Dutch,
    Spanish,
    French,
    German,
}

impl Language {
    /// Parse a language from its CLI/user-facing name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "english" | "en" => Some(Self::English),
            "dutch" | "nl" => Some(Self::Dutch),
            "spanish" | "es" => Some(Self::Spanish),
            "french" | "fr" => Some(Self::French),
            "german" | "de" => Some(Self::German),
            _ => None,
        }
    }

    /// English name of the language, used verbatim in the prompt.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Dutch => "Dutch",
            Self::Spanish => "Spanish",
            Self::French => "French",
            Self::German => "German",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for one alt-text generation run.
///
/// Built via [`RunConfig::builder()`] or using [`RunConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2alt::{Language, Provider, RunConfig};
///
/// let config = RunConfig::builder()
///     .provider(Provider::Groq)
///     .api_key("gsk_...")
///     .language(Language::Dutch)
///     .alt_lines(3)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// Which vision provider to call. Default: [`Provider::OpenAi`].
    pub provider: Provider,

    /// API key for the selected provider. If `None`, the provider's
    /// environment variable ([`Provider::key_env_var`]) is consulted at
    /// request time.
    pub api_key: Option<String>,

    /// Vision model identifier. If `None`, uses [`Provider::default_model`].
    pub model: Option<String>,

    /// Output language for the generated alt-text. Default: English.
    pub language: Language,

    /// Requested number of alt-text lines, 1–5. Default: 2.
    ///
    /// This is a prompt parameter, not a hard constraint: the model is asked
    /// for this many lines and usually complies, but the output is not
    /// truncated or padded to match.
    pub alt_lines: u8,

    /// Sampling temperature for the completion. Default: 0.2.
    ///
    /// Low temperature keeps the model descriptive and faithful to what it
    /// sees rather than creative, which is what accessibility text needs.
    pub temperature: f32,

    /// Maximum tokens the model may generate per image. Default: 300.
    ///
    /// Five lines of alt-text rarely exceed 150 tokens; 300 leaves headroom
    /// for verbose languages without letting a runaway completion cost much.
    pub max_tokens: usize,

    /// Longest edge an image is normalised down to before upload. Default: 1024.
    ///
    /// Embedded images can be print-resolution scans of several thousand
    /// pixels per side. Vision models describe a 1024 px version just as
    /// well, and the base64 payload stays far below request-size limits.
    pub max_image_dim: u32,

    /// Directory the output text file is written into.
    /// Default: `outputs/generated_texts`.
    pub output_dir: PathBuf,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-image vision API call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Optional progress callback receiving per-image events.
    pub progress_callback: Option<Arc<dyn RunProgressCallback>>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            api_key: None,
            model: None,
            language: Language::default(),
            alt_lines: 2,
            temperature: 0.2,
            max_tokens: 300,
            max_image_dim: 1024,
            output_dir: PathBuf::from("outputs/generated_texts"),
            download_timeout_secs: 120,
            api_timeout_secs: 60,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("language", &self.language)
            .field("alt_lines", &self.alt_lines)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_image_dim", &self.max_image_dim)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl RunConfig {
    /// Create a new builder for `RunConfig`.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolve the effective model name for the configured provider.
    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Resolve the API key: explicit config first, then the provider's
    /// environment variable.
    pub fn resolve_api_key(&self) -> Result<String, AltTextError> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Ok(key.clone());
            }
        }
        match std::env::var(self.provider.key_env_var()) {
            Ok(key) if !key.is_empty() => Ok(key),
            _ => Err(AltTextError::MissingApiKey {
                provider: self.provider.name().to_string(),
                hint: format!(
                    "Set {} or pass the key explicitly.",
                    self.provider.key_env_var()
                ),
            }),
        }
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn provider(mut self, provider: Provider) -> Self {
        self.config.provider = provider;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.config.language = language;
        self
    }

    pub fn alt_lines(mut self, lines: u8) -> Self {
        self.config.alt_lines = lines.clamp(1, 5);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_image_dim(mut self, px: u32) -> Self {
        self.config.max_image_dim = px.max(64);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn RunProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RunConfig, AltTextError> {
        let c = &self.config;
        if c.alt_lines < 1 || c.alt_lines > 5 {
            return Err(AltTextError::InvalidConfig(format!(
                "alt_lines must be 1–5, got {}",
                c.alt_lines
            )));
        }
        if c.max_tokens == 0 {
            return Err(AltTextError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parse_round_trip() {
        assert_eq!(Provider::parse("OpenAI"), Some(Provider::OpenAi));
        assert_eq!(Provider::parse("groq"), Some(Provider::Groq));
        assert_eq!(Provider::parse("anthropic"), None);
        assert_eq!(Provider::parse(Provider::Groq.name()), Some(Provider::Groq));
    }

    #[test]
    fn provider_endpoints() {
        assert!(Provider::OpenAi.base_url().starts_with("https://api.openai.com"));
        assert!(Provider::Groq.base_url().contains("groq.com"));
        assert!(!Provider::OpenAi.default_model().is_empty());
        assert!(!Provider::Groq.default_model().is_empty());
    }

    #[test]
    fn language_parse_accepts_codes() {
        assert_eq!(Language::parse("Dutch"), Some(Language::Dutch));
        assert_eq!(Language::parse("nl"), Some(Language::Dutch));
        assert_eq!(Language::parse("ES"), Some(Language::Spanish));
        assert_eq!(Language::parse("klingon"), None);
    }

    #[test]
    fn alt_lines_clamped() {
        let config = RunConfig::builder().alt_lines(9).build().unwrap();
        assert_eq!(config.alt_lines, 5);
        let config = RunConfig::builder().alt_lines(0).build().unwrap();
        assert_eq!(config.alt_lines, 1);
    }

    #[test]
    fn effective_model_falls_back_to_provider_default() {
        let config = RunConfig::default();
        assert_eq!(config.effective_model(), Provider::OpenAi.default_model());
        let config = RunConfig::builder().model("gpt-4o").build().unwrap();
        assert_eq!(config.effective_model(), "gpt-4o");
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = RunConfig::builder().api_key("sk-secret").build().unwrap();
        let dbg = format!("{:?}", config);
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
