//! # folio
//!
//! A paginated reader library for illustrated books.
//!
//! This library turns a plain-text book with embedded illustration markers
//! into chapters of fixed-size pages, and keeps a reading session over that
//! book: the current position, bookmarks, and their persistence across runs.
//!
//! ## Features
//!
//! - Split text into chapters on `CHAPTER <roman numeral>` headings
//! - Paginate prose without ever splitting a paragraph
//! - One page per `<comic-panel>` or `<illustration>` block, with dialogue
//! - Bookmarks with short excerpts, most recent first
//! - Write-through persistence, tolerant of corrupt or stale state
//! - Migration of the old single-page position record
//!
//! ## Example
//!
//! ```rust
//! use folio::session::{KeyValueSessionStore, MemoryStore, SessionOptions, StorageKeys};
//! use folio::{ReadingSession, parse_book};
//!
//! let book = parse_book(r#"
//! CHAPTER I
//! There were three of them.
//!
//! <comic-panel src="/images/panel-1.png" alt="The cave">
//! "It's a cave," said Gerald.
//! </comic-panel>
//!
//! CHAPTER II
//! They walked along the passage.
//! "#);
//!
//! let store = KeyValueSessionStore::new(MemoryStore::new(), StorageKeys::default());
//! let mut session = ReadingSession::open(book, store, SessionOptions::default());
//!
//! session.go_to_next();
//! assert!(session.current_page().is_some_and(|p| p.is_illustration()));
//!
//! session.toggle_bookmark();
//! assert_eq!(session.bookmarks()[0].excerpt, "\"It's a cave,\" said Gerald.");
//! ```

/// Configuration module for persisting user preferences.
///
/// Provides page size, excerpt length, storage and illustration settings.
pub mod config;

/// Input handling module for book files.
///
/// Loads text or pre-parsed JSON books and cleans Gutenberg downloads.
pub mod input;

/// Parser module for book text.
///
/// Provides functions to parse book files and content into chapters and pages.
pub mod parser;

/// Illustration catalog overlay and asset path resolution.
pub mod illustrations;

/// Reading sessions over a parsed book.
///
/// Provides navigation, bookmarks and their persistence.
pub mod session;

// Re-export commonly used types for convenience
pub use config::Config;
pub use parser::{Book, Chapter, Page, PageKind, ParseOptions, parse_book, parse_book_with, parse_file};
pub use session::{Action, Bookmark, ReadingProgress, ReadingSession};
