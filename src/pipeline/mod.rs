//! Pipeline stages for PDF alt-text generation.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different extraction backend) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ preprocess ──▶ encode ──▶ vision ──▶ cleanup
//! (path/URL) (lopdf)    (heuristics)   (base64)   (VLM)     (text fixes)
//! ```
//!
//! 1. [`input`]      — canonicalise the user-supplied path or URL to PDF bytes
//! 2. [`extract`]    — walk pages and decode embedded image XObjects
//! 3. [`preprocess`] — normalise colour/size, classify logos, flag
//!    low-confidence images
//! 4. [`encode`]     — PNG-encode and base64-wrap each image for the
//!    multimodal request body
//! 5. [`vision`]     — build the provider request and parse the response;
//!    the only stage with network I/O
//! 6. [`cleanup`]    — deterministic text-cleanup rules to fix VLM quirks
//!    (fences, quotes, boilerplate prefixes)

pub mod cleanup;
pub mod encode;
pub mod extract;
pub mod input;
pub mod preprocess;
pub mod vision;
