//! # pdf2alt
//!
//! Generate accessibility alt-text for the images embedded in a PDF, using
//! remote vision-language models (OpenAI or Groq).
//!
//! The pipeline: resolve the input (path or URL) → extract embedded raster
//! images page by page with `lopdf` → classify each image with deterministic
//! heuristics (logos get a different prompt, dubious images get flagged) →
//! send each image to the configured provider, one at a time → clean the
//! response → assemble one label per image into a plain-text file.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use pdf2alt::{generate_to_file, Language, Provider, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), pdf2alt::AltTextError> {
//!     let config = RunConfig::builder()
//!         .provider(Provider::Groq)
//!         .language(Language::Dutch)
//!         .alt_lines(2)
//!         .build()?;
//!
//!     let (output, path) = generate_to_file("report.pdf", &config).await?;
//!     println!(
//!         "{} image(s) described, written to {}",
//!         output.stats.generated,
//!         path.display()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Failure model
//!
//! Document-level problems (unreadable input, corrupt PDF, missing API key,
//! unwritable output directory) abort the run with an [`AltTextError`].
//! Per-image problems never do: the image's [`ImageResult`] records the
//! [`ImageError`], its label becomes a placeholder, and the run continues.
//!
//! ## Feature flags
//!
//! - `cli` (default) — builds the `pdf2alt` binary and its dependencies
//!   (clap, indicatif, anyhow, tracing-subscriber). Library consumers can
//!   disable default features.

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

pub use config::{Language, Provider, RunConfig, RunConfigBuilder};
pub use error::{AltTextError, ImageError};
pub use generate::{generate, generate_from_bytes, generate_sync, generate_to_file, inspect};
pub use output::{DocumentSummary, ImageResult, RunOutput, RunStats};
pub use pipeline::vision::validate_key;
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
