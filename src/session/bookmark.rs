//! Bookmarks and their preview excerpts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::parser::utils::{collapse_whitespace, truncate_with_ellipsis};
use crate::parser::{Chapter, Page, PageKind};

/// Default excerpt length in characters.
pub const DEFAULT_EXCERPT_LENGTH: usize = 140;

/// A user-created pointer to a page.
///
/// Chapter fields are copied when the bookmark is created and never updated,
/// and `page_id` may dangle if the book changes between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub page_id: u32,
    pub chapter_id: u32,
    pub chapter_title: String,
    pub excerpt: String,
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    /// Bookmark `page`, owned by `chapter`, with a fresh id.
    pub fn new(page: &Page, chapter: &Chapter, excerpt_length: usize) -> Self {
        Self::at(page.id, chapter, excerpt(page, excerpt_length))
    }

    /// Bookmark a page id directly, for pages the book may no longer have.
    pub fn at(page_id: u32, chapter: &Chapter, excerpt: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            page_id,
            chapter_id: chapter.id,
            chapter_title: chapter.title.clone(),
            excerpt,
            created_at: Utc::now(),
        }
    }
}

/// Short preview of a page, capped at `max_chars` characters.
///
/// Illustration pages prefer their dialogue, then caption, then content;
/// text pages use their content. Pages with nothing to show get a generic
/// label.
pub fn excerpt(page: &Page, max_chars: usize) -> String {
    let dialogue = page.dialogue_lines().join(" ");
    let candidates = match page.kind {
        PageKind::Illustration => vec![
            dialogue.as_str(),
            page.caption.as_deref().unwrap_or_default(),
            page.content.as_str(),
        ],
        PageKind::Text => vec![page.content.as_str()],
    };

    let source = candidates
        .iter()
        .map(|text| collapse_whitespace(text))
        .find(|text| !text.is_empty())
        .unwrap_or_else(|| match page.kind {
            PageKind::Illustration => "Illustration".to_string(),
            PageKind::Text => format!("Page {}", page.id),
        });

    truncate_with_ellipsis(&source, max_chars)
}
