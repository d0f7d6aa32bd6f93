//! HTML context preparation
//!
//! Strips the bulk that carries no product data (CSS, SVG, comments) while
//! keeping the DOM nodes that map a size label to a numeric variant ID and
//! the inline scripts (skuJson) that map that ID to stock and SKU. Both ends
//! of the document must survive truncation for the extraction model to
//! cross-reference them.

use once_cell::sync::Lazy;
use regex::Regex;

/// Hard budget for the prepared context, in characters.
pub const CONTEXT_BUDGET: usize = 150_000;
const KEEP_HEAD: usize = 75_000;
const KEEP_TAIL: usize = 75_000;
pub const TRUNCATION_MARKER: &str = " ... [TRUNCATED MIDDLE] ... ";

static STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style>").unwrap());
static SVG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<svg\b[^>]*>.*?</svg>").unwrap());
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Cleans raw page HTML down to at most [`CONTEXT_BUDGET`] characters.
///
/// Oversized documents keep the first and last 75k characters joined by
/// [`TRUNCATION_MARKER`]; the middle (galleries, recommendations, footers)
/// is discarded. This is best-effort size reduction, not parsing: entities
/// are left as-is.
pub fn prepare_context(html: &str) -> String {
    let clean = STYLE_RE.replace_all(html, "");
    let clean = SVG_RE.replace_all(&clean, "");
    let clean = COMMENT_RE.replace_all(&clean, "");
    let clean = WHITESPACE_RE.replace_all(&clean, " ");
    let clean = clean.trim();

    let char_count = clean.chars().count();
    if char_count <= CONTEXT_BUDGET {
        return clean.to_string();
    }

    // Byte offsets of the char boundaries, so multi-byte text never splits.
    let head_end = clean
        .char_indices()
        .nth(KEEP_HEAD)
        .map(|(i, _)| i)
        .unwrap_or(clean.len());
    let tail_start = clean
        .char_indices()
        .rev()
        .nth(KEEP_TAIL - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);

    format!(
        "{}{}{}",
        &clean[..head_end],
        TRUNCATION_MARKER,
        &clean[tail_start..]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_style_svg_comments() {
        let html = "<html><style type=\"text/css\">body { color: red; }</style>\
                    <body><svg viewBox=\"0 0 1 1\"><path d=\"M0\"/></svg>\
                    <!-- nav menu --><h1>Camiseta</h1></body></html>";
        let out = prepare_context(html);
        assert_eq!(out, "<html><body><h1>Camiseta</h1></body></html>");
    }

    #[test]
    fn test_strips_multiline_case_insensitive() {
        let html = "<STYLE>\na{}\nb{}\n</STYLE><p>ok</p><!--\nmulti\nline\n-->";
        assert_eq!(prepare_context(html), "<p>ok</p>");
    }

    #[test]
    fn test_collapses_whitespace() {
        let html = "  <p>\n\t a   b </p>  ";
        assert_eq!(prepare_context(html), "<p> a b </p>");
    }

    #[test]
    fn test_under_budget_never_truncated() {
        let html = "x".repeat(CONTEXT_BUDGET);
        let out = prepare_context(&html);
        assert_eq!(out.len(), CONTEXT_BUDGET);
        assert!(!out.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn test_over_budget_keeps_head_and_tail() {
        let head = "a".repeat(80_000);
        let tail = "z".repeat(80_000);
        let html = format!("{head}{tail}");
        let out = prepare_context(&html);
        assert_eq!(out.chars().count(), 75_000 + TRUNCATION_MARKER.len() + 75_000);
        assert!(out.starts_with(&"a".repeat(75_000)));
        assert!(out.ends_with(&"z".repeat(75_000)));
        assert!(out.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        // 'ã' is two bytes in UTF-8; slicing by byte offset would panic.
        let html = "ã".repeat(CONTEXT_BUDGET + 10);
        let out = prepare_context(&html);
        let marker_chars = TRUNCATION_MARKER.chars().count();
        assert_eq!(out.chars().count(), 75_000 + marker_chars + 75_000);
    }
}
