//! Prompt construction for VLM-based alt-text generation.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the default behaviour (tone,
//!    length guidance, logo handling) requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the built prompt directly
//!    without spinning up a real VLM, making prompt regressions easy to catch.

use crate::config::Language;

/// System prompt sent with every alt-text request.
pub const SYSTEM_PROMPT: &str = "You are an accessibility expert writing alt-text for images \
found in PDF documents. Describe what the image shows, plainly and concretely, for a reader \
using a screen reader. Do not mention that the image comes from a PDF. Do not start with \
phrases like 'An image of' or 'This picture shows'. Output only the alt-text itself, with \
no commentary, quotes, or markdown formatting.";

/// Build the per-image user prompt.
///
/// The three parameters map directly onto the user-facing knobs: requested
/// line count (1–5), output language, and the logo heuristic's verdict.
/// Line count is guidance for the model, not a hard constraint — the
/// response is used as-is even when the model returns a different number of
/// lines.
pub fn build_prompt(alt_lines: u8, language: Language, is_logo: bool) -> String {
    let line_word = if alt_lines == 1 { "line" } else { "lines" };
    if is_logo {
        format!(
            "This image appears to be a logo or decorative element. Write concise alt-text \
             in {language} identifying it as such (for example the organisation it belongs to, \
             if recognisable), in at most {alt_lines} {line_word}.",
            language = language.as_str(),
            alt_lines = alt_lines,
            line_word = line_word,
        )
    } else {
        format!(
            "Write alt-text in {language} describing this image in exactly {alt_lines} \
             {line_word}. Focus on the information the image conveys: subjects, text shown, \
             data trends in charts, and spatial relationships that matter.",
            language = language.as_str(),
            alt_lines = alt_lines,
            line_word = line_word,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_reflects_line_count_and_language() {
        let p = build_prompt(3, Language::French, false);
        assert!(p.contains("French"));
        assert!(p.contains("exactly 3 lines"));
    }

    #[test]
    fn singular_line_word() {
        let p = build_prompt(1, Language::English, false);
        assert!(p.contains("1 line"));
        assert!(!p.contains("1 lines"));
    }

    #[test]
    fn logo_prompt_differs() {
        let logo = build_prompt(2, Language::German, true);
        let regular = build_prompt(2, Language::German, false);
        assert_ne!(logo, regular);
        assert!(logo.contains("logo"));
        assert!(logo.contains("German"));
    }

    #[test]
    fn system_prompt_forbids_preambles() {
        assert!(SYSTEM_PROMPT.contains("An image of"));
        assert!(SYSTEM_PROMPT.contains("alt-text"));
    }
}
