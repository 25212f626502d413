//! Utility functions for book text handling.
//!
//! Shared helpers used by the parser, the session excerpts and the input
//! cleaners.

use regex::Regex;
use std::sync::OnceLock;

/// Normalize line endings to `\n` and trim surrounding whitespace.
///
/// # Examples
///
/// ```
/// # use folio::parser::utils::normalize_text;
/// assert_eq!(normalize_text("\r\n  one\r\ntwo \r\n"), "one\ntwo");
/// ```
pub fn normalize_text(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

/// Split text into trimmed paragraphs on blank lines, dropping
/// whitespace-only paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    static BLANK_LINE: OnceLock<Regex> = OnceLock::new();
    let blank_line = BLANK_LINE.get_or_init(|| Regex::new(r"\n[ \t]*\n").unwrap());

    blank_line
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Collapse every whitespace run (including newlines) into one space.
///
/// # Examples
///
/// ```
/// # use folio::parser::utils::collapse_whitespace;
/// assert_eq!(collapse_whitespace("  a\n\n b\tc "), "a b c");
/// ```
pub fn collapse_whitespace(text: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").unwrap());

    whitespace.replace_all(text.trim(), " ").into_owned()
}

/// Cap `text` at `max_chars` characters, ending with `…` when cut.
///
/// # Examples
///
/// ```
/// # use folio::parser::utils::truncate_with_ellipsis;
/// assert_eq!(truncate_with_ellipsis("short", 10), "short");
/// assert_eq!(truncate_with_ellipsis("hello world", 6), "hello…");
/// ```
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    let kept: String = text.chars().take(max_chars - 1).collect();
    let mut out = kept.trim_end().to_string();
    out.push('…');
    out
}

/// Render a positive number as an upper-case Roman numeral.
///
/// Zero renders as an empty string.
///
/// # Examples
///
/// ```
/// # use folio::parser::utils::to_roman;
/// assert_eq!(to_roman(4), "IV");
/// assert_eq!(to_roman(14), "XIV");
/// ```
pub fn to_roman(mut n: u32) -> String {
    const NUMERALS: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];

    let mut out = String::new();
    for &(value, numeral) in &NUMERALS {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}
