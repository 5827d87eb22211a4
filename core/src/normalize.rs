//! Text normalization shared by documents and queries.
//!
//! Markup is stripped (HTML tags and the common entities, Markdown fences,
//! headings, list/quote markers, emphasis, link syntax), then the text is NFKC
//! normalized, whitespace is collapsed to single spaces and everything is
//! lower-cased. Matching therefore ignores case and layout.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref FENCE: Regex = Regex::new(r"(?m)^[ \t]*(?:```|~~~)[^\n]*$").expect("valid regex");
    // Attributes must carry a value, so prose like "a<b and c>d" is not a tag.
    static ref HTML_TAG: Regex = Regex::new(
        r#"</?[A-Za-z][A-Za-z0-9-]*(?:\s+[A-Za-z_:][\w:.-]*\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'<>=`]+))*\s*/?>"#
    ).expect("valid regex");
    static ref ENTITY: Regex = Regex::new(r"&(amp|lt|gt|quot|#39|apos|nbsp);").expect("valid regex");
    static ref LINK: Regex = Regex::new(r"!?\[([^\]]*)\]\([^)]*\)").expect("valid regex");
    static ref HEADING: Regex = Regex::new(r"(?m)^[ \t]{0,3}#{1,6}[ \t]+").expect("valid regex");
    static ref BLOCK_MARKER: Regex = Regex::new(r"(?m)^[ \t]*(?:>[ \t>]*|[-*+][ \t]+|\d+[.)][ \t]+)").expect("valid regex");
    static ref EMPHASIS: Regex = Regex::new(r"[*~`]+").expect("valid regex");
}

/// Strip formatting markup but keep line structure and case.
pub fn strip_markup(text: &str) -> String {
    let text = FENCE.replace_all(text, "");
    let text = HTML_TAG.replace_all(&text, " ");
    let text = ENTITY.replace_all(&text, |caps: &Captures| {
        match &caps[1] {
            "amp" => "&",
            "lt" => "<",
            "gt" => ">",
            "quot" => "\"",
            "#39" | "apos" => "'",
            _ => " ",
        }
        .to_string()
    });
    let text = LINK.replace_all(&text, "$1");
    let text = HEADING.replace_all(&text, "");
    let text = BLOCK_MARKER.replace_all(&text, "");
    EMPHASIS.replace_all(&text, " ").into_owned()
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Full normalization applied to document bodies and queries alike.
pub fn normalize(text: &str) -> String {
    let stripped = strip_markup(text);
    collapse_whitespace(&stripped.nfkc().collect::<String>()).to_lowercase()
}
