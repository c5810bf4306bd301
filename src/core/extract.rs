//! Parsing of raw provider completions into (content, author).
//!
//! The provider is asked for a `名言内容|作者姓名` shaped response, but
//! models drift, so a small set of delimiter heuristics is tried in
//! priority order. This module is pure; it never fails.

/// Author used when no delimiter matched and the author is unrecoverable.
pub const DEFAULT_AUTHOR: &str = "哲学家";

/// Delimiters tried in order; the first one present wins and only its
/// first occurrence is used as the split point.
const SEPARATORS: [&str; 3] = ["|", "——", " - "];

/// Split a raw completion into cleaned quote content and trimmed author.
pub fn split_quote(raw: &str) -> (String, String) {
    for sep in SEPARATORS {
        if let Some((content, author)) = raw.split_once(sep) {
            return (clean_content(content), author.trim().to_string());
        }
    }
    (clean_content(raw), DEFAULT_AUTHOR.to_string())
}

/// Strip surrounding whitespace and straight quote characters, then
/// unescape literal `\"` / `\'` sequences the model sometimes emits.
fn clean_content(content: &str) -> String {
    content
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .replace("\\\"", "\"")
        .replace("\\'", "'")
}
