use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref INLINE_SPACE: Regex = Regex::new(r"[^\S\n]+").expect("valid regex");
    static ref LINE_BREAKS: Regex = Regex::new(r"\s*\n\s*").expect("valid regex");
}

/// Trim the text, squeeze each run of non-newline whitespace into one space and
/// each run of whitespace containing a newline into a single `\n`.
pub fn normalize_whitespace(text: &str) -> String {
    let squeezed = INLINE_SPACE.replace_all(text.trim(), " ");
    LINE_BREAKS.replace_all(&squeezed, "\n").into_owned()
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
