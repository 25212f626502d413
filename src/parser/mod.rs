//! Book parsing and document structure extraction.
//!
//! This module turns a flat text blob of prose and embedded illustration
//! markers into a [`Book`]: chapters split on `CHAPTER <roman numeral>`
//! headings, prose packed into pages, one page per illustration, and page ids
//! numbered across the whole book.
//!
//! Parsing never fails. Malformed markers degrade to plain text and input
//! without headings becomes a single chapter.
//!
//! A heading must sit alone on its line (`CHAPTER IV` or `CHAPTER IV.`).
//! A title on the same line, as in `CHAPTER IV. THE CAVE`, is not a heading
//! and stays in the page text; put the title on the following line instead.

mod document;
pub mod lexer;
pub mod output;
pub mod paginate;
pub mod utils;

pub use document::{Book, Chapter, Page, PageKind};
pub use output::{BookMetadata, BookOutput, ChapterSummary};

use lexer::{IllustrationBlock, Segment};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Default page size in characters.
pub const DEFAULT_CHARS_PER_PAGE: usize = 800;

/// Tuning knobs for [`parse_book_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Soft upper bound on the characters of prose per page
    pub chars_per_page: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            chars_per_page: DEFAULT_CHARS_PER_PAGE,
        }
    }
}

/// Parse a book file from disk with default options.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn parse_file(path: &Path) -> std::io::Result<Book> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_book(&content))
}

/// Parse raw book text with default options.
///
/// # Example
///
/// ```
/// use folio::parse_book;
///
/// let book = parse_book("CHAPTER I\nIt was a cave.\n\nCHAPTER II\nIt was a castle.");
/// assert_eq!(book.chapters.len(), 2);
/// assert_eq!(book.chapters[1].title, "CHAPTER II");
/// ```
pub fn parse_book(raw: &str) -> Book {
    parse_book_with(raw, &ParseOptions::default())
}

/// Parse raw book text into chapters of pages.
pub fn parse_book_with(raw: &str, options: &ParseOptions) -> Book {
    let text = utils::normalize_text(raw);
    if text.is_empty() {
        return Book::default();
    }

    let mut chapters = Vec::new();
    for (title, body) in split_chapters(&text) {
        let title = title.unwrap_or_else(|| fallback_title(chapters.len()));
        let chapter = build_chapter(title, body, options);
        if !chapter.pages.is_empty() {
            chapters.push(chapter);
        }
    }

    let mut book = Book::new(chapters);
    book.reindex();

    log::debug!(
        "parsed {} chapters with {} pages",
        book.chapters.len(),
        book.page_count()
    );
    book
}

/// Split normalized text into `(heading, body)` pairs.
///
/// Text before the first heading is returned with no heading when it is not
/// blank; text with no headings at all is returned whole.
fn split_chapters(text: &str) -> Vec<(Option<String>, &str)> {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    let heading = HEADING
        .get_or_init(|| Regex::new(r"(?m)^[ \t]*CHAPTER[ \t]+[IVXLCDM]+\.?[ \t]*$").unwrap());

    let matches: Vec<_> = heading.find_iter(text).collect();
    if matches.is_empty() {
        return vec![(None, text)];
    }

    let mut segments = Vec::with_capacity(matches.len() + 1);
    let preamble = &text[..matches[0].start()];
    if !preamble.trim().is_empty() {
        segments.push((None, preamble));
    }

    for (index, m) in matches.iter().enumerate() {
        let end = matches.get(index + 1).map_or(text.len(), |next| next.start());
        let title = m.as_str().trim().trim_end_matches('.').to_string();
        segments.push((Some(title), &text[m.end()..end]));
    }
    segments
}

/// Title for a chapter without a heading, from its 1-based position.
fn fallback_title(index: usize) -> String {
    format!("Chapter {}", utils::to_roman(index as u32 + 1))
}

fn build_chapter(title: String, body: &str, options: &ParseOptions) -> Chapter {
    let mut pages = Vec::new();

    for segment in lexer::tokenize(body) {
        match segment {
            Segment::Text(span) => {
                pages.extend(
                    paginate::paginate(span, options.chars_per_page)
                        .into_iter()
                        .map(|content| Page::text(&title, content)),
                );
            }
            Segment::Illustration(block) => pages.push(illustration_page(&title, block)),
        }
    }

    Chapter {
        id: 0,
        title,
        pages,
    }
}

fn illustration_page(chapter_title: &str, block: IllustrationBlock) -> Page {
    let lines = block.lines();
    Page {
        id: 0,
        chapter_title: chapter_title.to_string(),
        kind: PageKind::Illustration,
        content: block.inner,
        image_reference: block.src,
        illustration_id: block.id,
        caption: block.alt,
        dialogue: (!lines.is_empty()).then_some(lines),
    }
}
