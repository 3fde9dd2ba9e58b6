use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Bracketed integers are footnote/cross-reference markers, e.g. [12].
    static ref RE_FOOTNOTE: Regex = Regex::new(r"\[\d+\]").unwrap();
    // A newline run followed by a digit marks a verse start; keep one newline.
    static ref RE_BREAK_BEFORE_DIGIT: Regex = Regex::new(r"\n+(\d)").unwrap();
    // Any other newline run is a hard wrap inside a verse; drop it.
    static ref RE_BREAK_OTHER: Regex = Regex::new(r"\n+([^\d\n])").unwrap();
    static ref RE_BREAK_TRAILING: Regex = Regex::new(r"\n+$").unwrap();
}

/// Normalize flattened document text for segmentation:
/// strip `[N]` footnote markers, then collapse every newline run into
/// nothing unless the next character is a decimal digit, in which case
/// exactly one newline is kept.
///
/// The collapse needs lookahead across the whole run, so it operates on the
/// full text rather than line by line. The `regex` crate has no lookahead;
/// the three rewrites below compose to the same result. Idempotent.
pub fn clean_source_text(text: &str) -> String {
    let s = RE_FOOTNOTE.replace_all(text, "");
    let s = RE_BREAK_BEFORE_DIGIT.replace_all(&s, "\n$1");
    let s = RE_BREAK_OTHER.replace_all(&s, "$1");
    RE_BREAK_TRAILING.replace_all(&s, "").to_string()
}
