//! Input handling for book sources.
//!
//! A book can be opened from marked-up text (parsed on load) or from a JSON
//! document written earlier by `folio build`. This module also cleans raw
//! Project Gutenberg downloads into parser input.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

use crate::parser::{self, Book, ParseOptions};

/// Errors raised while loading book sources.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a valid document: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while cleaning a Gutenberg text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("unable to locate Gutenberg book boundaries (missing {missing:?})")]
    MissingBoundaries { missing: &'static str },
}

/// How a book file should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Marked-up book text, parsed on load
    Text,
    /// A pre-parsed JSON book document
    Json,
}

impl SourceFormat {
    /// Detect the format from the file extension; anything but `.json` is text.
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SourceFormat::Json,
            _ => SourceFormat::Text,
        }
    }
}

/// Load a book from a text or pre-parsed JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, or if a JSON file is not a
/// book document.
pub fn load_book(path: &Path, options: &ParseOptions) -> Result<Book, InputError> {
    let contents = std::fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    match SourceFormat::detect(path) {
        SourceFormat::Json => {
            let book: Book =
                serde_json::from_str(&contents).map_err(|source| InputError::Decode {
                    path: path.to_path_buf(),
                    source,
                })?;
            log::debug!(
                "loaded pre-parsed book {} ({} pages)",
                path.display(),
                book.page_count()
            );
            Ok(book)
        }
        SourceFormat::Text => Ok(parser::parse_book_with(&contents, options)),
    }
}

const START_MARKER: &str = "CHAPTER I";
const END_MARKER: &str = "*** END OF THE PROJECT GUTENBERG EBOOK";

/// Clean a raw Project Gutenberg plain-text download into book text.
///
/// Keeps the text from the first `CHAPTER I` up to the end-of-book marker,
/// drops `[Illustration ...]` placeholder lines, squeezes runs of blank lines,
/// and cuts the printer's colophon and transcriber's notes.
///
/// # Errors
///
/// Returns [`ExtractError::MissingBoundaries`] when either marker is missing.
pub fn extract_gutenberg(raw: &str) -> Result<String, ExtractError> {
    static ILLUSTRATION_LINE: OnceLock<Regex> = OnceLock::new();
    static BLANK_LINE: OnceLock<Regex> = OnceLock::new();
    static EXTRA_NEWLINES: OnceLock<Regex> = OnceLock::new();
    static COLOPHON: OnceLock<Regex> = OnceLock::new();
    static TRANSCRIBER_NOTES: OnceLock<Regex> = OnceLock::new();

    let illustration_line =
        ILLUSTRATION_LINE.get_or_init(|| Regex::new(r"(?m)^\[Illustration[^\]]*\]\s*$").unwrap());
    let blank_line = BLANK_LINE.get_or_init(|| Regex::new(r"(?m)^[ \t]+$").unwrap());
    let extra_newlines = EXTRA_NEWLINES.get_or_init(|| Regex::new(r"\n{3,}").unwrap());
    let colophon = COLOPHON.get_or_init(|| Regex::new(r"(?is)\n\s*UNWIN BROTHERS.*$").unwrap());
    let transcriber_notes =
        TRANSCRIBER_NOTES.get_or_init(|| Regex::new(r"(?is)\nTranscriber's Notes:.*$").unwrap());

    let start = raw
        .find(START_MARKER)
        .ok_or(ExtractError::MissingBoundaries {
            missing: START_MARKER,
        })?;
    let end = raw.find(END_MARKER).ok_or(ExtractError::MissingBoundaries {
        missing: END_MARKER,
    })?;
    if end < start {
        return Err(ExtractError::MissingBoundaries {
            missing: END_MARKER,
        });
    }

    let text = raw[start..end].replace('\r', "");
    let text = illustration_line.replace_all(&text, "");
    let text = blank_line.replace_all(&text, "");
    let text = extra_newlines.replace_all(&text, "\n\n");
    let text = colophon.replace(&text, "");
    let text = transcriber_notes.replace(&text, "");

    Ok(text.trim().to_string())
}
