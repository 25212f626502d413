//! Book, chapter and page types produced by the parser.

use serde::{Deserialize, Serialize};

/// What a page displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// Prose reassembled from one or more paragraphs.
    Text,
    /// A single embedded illustration (comic panel).
    #[serde(alias = "comic")]
    Illustration,
}

/// The atomic unit of reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Position in reading order across the whole book (1-based, contiguous)
    pub id: u32,
    /// Title of the owning chapter
    #[serde(alias = "chapter")]
    pub chapter_title: String,
    #[serde(alias = "type")]
    pub kind: PageKind,
    /// Prose for text pages, inner block text for illustrations
    #[serde(default)]
    pub content: String,
    #[serde(
        default,
        alias = "imageSrc",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_reference: Option<String>,
    /// Stable identifier that survives image renames
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub illustration_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue: Option<Vec<String>>,
}

impl Page {
    /// Create a text page. The id is assigned once the whole book is built.
    pub fn text(chapter_title: &str, content: String) -> Self {
        Self {
            id: 0,
            chapter_title: chapter_title.to_string(),
            kind: PageKind::Text,
            content,
            image_reference: None,
            illustration_id: None,
            caption: None,
            dialogue: None,
        }
    }

    pub fn is_illustration(&self) -> bool {
        self.kind == PageKind::Illustration
    }

    /// Dialogue lines, treating an absent list and an empty one the same way.
    pub fn dialogue_lines(&self) -> &[String] {
        self.dialogue.as_deref().unwrap_or_default()
    }
}

/// A named, ordered grouping of pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: u32,
    pub title: String,
    pub pages: Vec<Page>,
}

impl Chapter {
    pub fn first_page_id(&self) -> Option<u32> {
        self.pages.first().map(|p| p.id)
    }

    pub fn contains_page(&self, page_id: u32) -> bool {
        self.pages.iter().any(|p| p.id == page_id)
    }
}

/// A parsed book: chapters in reading order.
///
/// This is also the interchange document written by `folio build`, so a
/// reader can start from a pre-parsed file without running the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl Book {
    pub fn new(chapters: Vec<Chapter>) -> Self {
        Self { chapters }
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.iter().all(|c| c.pages.is_empty())
    }

    /// All pages in reading order.
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.chapters.iter().flat_map(|c| c.pages.iter())
    }

    pub fn pages_mut(&mut self) -> impl Iterator<Item = &mut Page> {
        self.chapters.iter_mut().flat_map(|c| c.pages.iter_mut())
    }

    pub fn page_count(&self) -> usize {
        self.chapters.iter().map(|c| c.pages.len()).sum()
    }

    pub fn page(&self, page_id: u32) -> Option<&Page> {
        self.pages().find(|p| p.id == page_id)
    }

    pub fn chapter(&self, chapter_id: u32) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == chapter_id)
    }

    /// The chapter whose pages contain `page_id`, if any.
    pub fn chapter_of(&self, page_id: u32) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.contains_page(page_id))
    }

    pub fn first_page_id(&self) -> Option<u32> {
        self.pages().next().map(|p| p.id)
    }

    pub fn last_page_id(&self) -> Option<u32> {
        self.chapters
            .iter()
            .rev()
            .find_map(|c| c.pages.last())
            .map(|p| p.id)
    }

    /// Renumber chapters and pages in reading order, starting at 1.
    ///
    /// Pages also pick up their owning chapter's title so the denormalized
    /// copy can never disagree with the chapter.
    pub fn reindex(&mut self) {
        let mut next_page = 1;
        for (index, chapter) in self.chapters.iter_mut().enumerate() {
            chapter.id = index as u32 + 1;
            for page in &mut chapter.pages {
                page.id = next_page;
                page.chapter_title.clone_from(&chapter.title);
                next_page += 1;
            }
        }
    }
}
