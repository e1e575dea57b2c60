//! Deterministic cleanup of raw VLM output.
//!
//! Vision models decorate their answers despite instructions to the
//! contrary: markdown fences, surrounding quotes, "Alt text:" preambles.
//! Every rule here is a fixed transformation so the same raw response always
//! cleans to the same text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Opening/closing markdown code fence, with optional language tag.
static FENCE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[a-zA-Z0-9_-]*\s*\n?").unwrap());
static FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n?```\s*$").unwrap());

/// Boilerplate prefixes models prepend even when told not to.
static BOILERPLATE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(alt[ -]?text|description|caption)\s*:\s*").unwrap()
});

/// Three or more consecutive newlines collapse to a blank line.
static EXCESS_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Runs of spaces or tabs within a line.
static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());

/// Zero-width and BOM characters that occasionally leak into responses.
static INVISIBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u{200B}\u{200C}\u{200D}\u{FEFF}]").unwrap());

/// Apply every cleanup rule, in order.
pub fn clean_alt_text(raw: &str) -> String {
    let mut text = raw.replace("\r\n", "\n").replace('\r', "\n");

    text = FENCE_OPEN.replace(&text, "").into_owned();
    text = FENCE_CLOSE.replace(&text, "").into_owned();
    text = strip_surrounding_quotes(text.trim()).to_string();
    text = BOILERPLATE_PREFIX.replace(&text, "").into_owned();
    text = INVISIBLE.replace_all(&text, "").into_owned();
    text = EXCESS_BLANK_LINES.replace_all(&text, "\n\n").into_owned();
    text = SPACE_RUNS.replace_all(&text, " ").into_owned();

    // Per-line trailing whitespace, then outer trim.
    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Strip one matching pair of surrounding quotes, if present.
fn strip_surrounding_quotes(text: &str) -> &str {
    let pairs = [('"', '"'), ('\'', '\''), ('“', '”'), ('‘', '’')];
    for (open, close) in pairs {
        if text.len() >= 2 && text.starts_with(open) && text.ends_with(close) {
            let inner = &text[open.len_utf8()..text.len() - close.len_utf8()];
            // Only strip when the pair actually wraps the whole text, not
            // e.g. `"quoted" and "quoted"`.
            if !inner.contains(open) || open != close {
                return inner.trim();
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_fences() {
        assert_eq!(clean_alt_text("```\nA red bicycle.\n```"), "A red bicycle.");
        assert_eq!(clean_alt_text("```text\nA red bicycle.\n```"), "A red bicycle.");
    }

    #[test]
    fn strips_surrounding_quotes() {
        assert_eq!(clean_alt_text("\"A harbour at dusk.\""), "A harbour at dusk.");
        assert_eq!(clean_alt_text("“Une photo du port.”"), "Une photo du port.");
    }

    #[test]
    fn keeps_interior_quotes() {
        let text = "A sign reading \"Exit\" above a door.";
        assert_eq!(clean_alt_text(text), text);
    }

    #[test]
    fn strips_boilerplate_prefix() {
        assert_eq!(clean_alt_text("Alt text: A pie chart."), "A pie chart.");
        assert_eq!(clean_alt_text("alt-text: A pie chart."), "A pie chart.");
        assert_eq!(clean_alt_text("Description: A map of Europe."), "A map of Europe.");
    }

    #[test]
    fn normalises_line_endings_and_blanks() {
        assert_eq!(clean_alt_text("Line one.\r\n\r\n\r\n\r\nLine two."), "Line one.\n\nLine two.");
    }

    #[test]
    fn collapses_space_runs() {
        assert_eq!(clean_alt_text("A   dog  in the    park."), "A dog in the park.");
    }

    #[test]
    fn removes_invisible_characters() {
        assert_eq!(clean_alt_text("\u{FEFF}A chart\u{200B} of sales."), "A chart of sales.");
    }

    #[test]
    fn trims_outer_whitespace() {
        assert_eq!(clean_alt_text("  \n  A fox.  \n "), "A fox.");
    }

    #[test]
    fn clean_text_passes_through() {
        let text = "Two engineers at a whiteboard.\nOne holds a marker.";
        assert_eq!(clean_alt_text(text), text);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(clean_alt_text(""), "");
        assert_eq!(clean_alt_text("   "), "");
    }
}
