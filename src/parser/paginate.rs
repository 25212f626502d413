//! Greedy pagination of prose.
//!
//! Paragraphs are packed into pages by character count. A paragraph is never
//! split: one longer than the page size becomes its own oversized page.

use super::utils::split_paragraphs;

/// Separator placed between paragraphs on the same page.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Pack the paragraphs of `text` into page-sized strings.
///
/// A page is closed when adding the next paragraph (plus separator) would
/// take it past `chars_per_page` characters. Empty input yields no pages.
pub fn paginate(text: &str, chars_per_page: usize) -> Vec<String> {
    let separator_len = PARAGRAPH_SEPARATOR.chars().count();
    let mut pages = Vec::new();
    let mut buffer = String::new();
    let mut buffer_len = 0;

    for paragraph in split_paragraphs(text) {
        let paragraph_len = paragraph.chars().count();

        if buffer_len > 0 && buffer_len + separator_len + paragraph_len > chars_per_page {
            pages.push(std::mem::take(&mut buffer));
            buffer_len = 0;
        }

        if buffer_len > 0 {
            buffer.push_str(PARAGRAPH_SEPARATOR);
            buffer_len += separator_len;
        }
        buffer.push_str(paragraph);
        buffer_len += paragraph_len;
    }

    if buffer_len > 0 {
        pages.push(buffer);
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_paragraphs_share_a_page() {
        let pages = paginate("One.\n\nTwo.\n\nThree.", 800);
        assert_eq!(pages, vec!["One.\n\nTwo.\n\nThree."]);
    }

    #[test]
    fn test_page_breaks_before_overflowing_paragraph() {
        let a = "a".repeat(500);
        let b = "b".repeat(400);
        let pages = paginate(&format!("{a}\n\n{b}"), 800);

        assert_eq!(pages, vec![a, b]);
    }

    #[test]
    fn test_exact_fit_stays_on_one_page() {
        let a = "a".repeat(399);
        let b = "b".repeat(399);
        let pages = paginate(&format!("{a}\n\n{b}"), 800);
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_oversized_paragraph_is_not_split() {
        let long = "A".repeat(2000);
        let pages = paginate(&format!("short\n\n{long}\n\ntail"), 800);

        assert_eq!(pages, vec!["short".to_string(), long, "tail".to_string()]);
    }

    #[test]
    fn test_whitespace_only_input_yields_no_pages() {
        assert!(paginate("  \n\n \t \n\n", 800).is_empty());
        assert!(paginate("", 800).is_empty());
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // 300 two-byte characters each: 602 chars with separator, 1202 bytes
        let a = "é".repeat(300);
        let b = "ü".repeat(300);
        let pages = paginate(&format!("{a}\n\n{b}"), 800);
        assert_eq!(pages.len(), 1);
    }
}
