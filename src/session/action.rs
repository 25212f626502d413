//! Navigation actions
//!
//! This module defines every operation a presentation layer can ask a
//! reading session to perform.

use strum::Display;

/// All navigation actions understood by [`ReadingSession::apply`].
///
/// [`ReadingSession::apply`]: super::ReadingSession::apply
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Action {
    // === Navigation ===
    /// Move to the next page
    Next,
    /// Move to the previous page
    Previous,
    /// Jump to the first page of the book
    First,
    /// Jump to the last page of the book
    Last,
    /// Jump to a page by id
    GoToPage(u32),
    /// Jump to the first page of a chapter
    GoToChapter(u32),

    // === Bookmarks ===
    /// Jump to a bookmarked page
    GoToBookmark(String),
    /// Add or remove a bookmark on the current page
    ToggleBookmark,
    /// Delete a bookmark by id
    RemoveBookmark(String),
}

impl Action {
    /// Get a human-readable description of the action
    pub fn description(&self) -> &'static str {
        match self {
            // Navigation
            Action::Next => "Next page",
            Action::Previous => "Previous page",
            Action::First => "First page",
            Action::Last => "Last page",
            Action::GoToPage(_) => "Go to page",
            Action::GoToChapter(_) => "Go to chapter start",

            // Bookmarks
            Action::GoToBookmark(_) => "Open bookmark",
            Action::ToggleBookmark => "Toggle bookmark",
            Action::RemoveBookmark(_) => "Remove bookmark",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(Action::Next.to_string(), "next");
        assert_eq!(Action::GoToChapter(3).to_string(), "go-to-chapter");
        assert_eq!(Action::ToggleBookmark.to_string(), "toggle-bookmark");
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(Action::Previous.description(), "Previous page");
        assert_eq!(Action::GoToBookmark("b".into()).description(), "Open bookmark");
    }
}
