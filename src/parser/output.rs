//! JSON output types for book summaries.
//!
//! The full book is serialized directly from [`Book`]; these types describe
//! the lighter table of contents printed by `folio -o json <BOOK> chapters`.

use serde::{Deserialize, Serialize};

use super::{Book, PageKind};

/// Root summary with metadata and one entry per chapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookOutput {
    pub metadata: BookMetadata,
    pub chapters: Vec<ChapterSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMetadata {
    pub source: Option<String>,
    pub chapter_count: usize,
    pub page_count: usize,
    pub illustration_count: usize,
    pub word_count: usize,
}

/// A chapter entry in the table of contents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterSummary {
    pub id: u32,
    pub title: String,
    /// First page of the chapter, the target of a chapter jump
    pub first_page_id: Option<u32>,
    pub page_count: usize,
    pub illustration_count: usize,
}

impl BookOutput {
    pub fn from_book(book: &Book, source: Option<String>) -> Self {
        let chapters: Vec<ChapterSummary> = book
            .chapters
            .iter()
            .map(|chapter| ChapterSummary {
                id: chapter.id,
                title: chapter.title.clone(),
                first_page_id: chapter.first_page_id(),
                page_count: chapter.pages.len(),
                illustration_count: chapter
                    .pages
                    .iter()
                    .filter(|p| p.kind == PageKind::Illustration)
                    .count(),
            })
            .collect();

        let word_count = book
            .pages()
            .filter(|p| p.kind == PageKind::Text)
            .map(|p| p.content.split_whitespace().count())
            .sum();

        Self {
            metadata: BookMetadata {
                source,
                chapter_count: chapters.len(),
                page_count: book.page_count(),
                illustration_count: chapters.iter().map(|c| c.illustration_count).sum(),
                word_count,
            },
            chapters,
        }
    }
}
