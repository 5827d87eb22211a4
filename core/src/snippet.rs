use crate::tokenizer::tokenize_normalized;

const ELLIPSIS: &str = "…";

/// Excerpt of `text` around the first token whose term is in `terms`.
///
/// The window spans at most `before` chars before the match start and `after`
/// chars from it, trimmed back to whole words where possible. Falls back to the
/// head of the text when nothing matches.
pub fn extract(text: &str, terms: &[&str], before: usize, after: usize) -> String {
    let anchor = tokenize_normalized(text)
        .into_iter()
        .find(|t| terms.contains(&t.term.as_str()))
        .map_or(0, |t| t.start);

    let mut start = text[..anchor]
        .char_indices()
        .rev()
        .take(before)
        .last()
        .map_or(anchor, |(i, _)| i);
    let mut end = text[anchor..]
        .char_indices()
        .nth(after)
        .map_or(text.len(), |(i, _)| anchor + i);

    if start > 0 {
        if let Some(sp) = text[start..anchor].find(' ') {
            start += sp + 1;
        }
    }
    if end < text.len() {
        if let Some(sp) = text[anchor..end].rfind(' ') {
            end = anchor + sp;
        }
    }

    let mut snippet = String::with_capacity(end - start + 2 * ELLIPSIS.len());
    if start > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.push_str(text[start..end].trim());
    if end < text.len() {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}
