//! Reading sessions: position, bookmarks and their persistence.
//!
//! A [`ReadingSession`] owns a read-only [`Book`] plus the mutable reading
//! state, and mirrors every change into a [`SessionStore`] as it happens.
//! Operations never fail: unknown pages, chapters and bookmarks are no-ops,
//! and a position that no longer resolves falls back to the first page.

mod action;
pub mod bookmark;
pub mod store;

pub use action::Action;
pub use bookmark::{Bookmark, DEFAULT_EXCERPT_LENGTH};
pub use store::{
    FileStore, KeyValueSessionStore, KeyValueStore, MemoryStore, SessionState, SessionStore,
    StorageKeys, StoreError,
};

use serde::Serialize;

use crate::parser::{Book, Chapter, Page};

/// Tuning knobs for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Maximum bookmark excerpt length in characters
    pub excerpt_length: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            excerpt_length: DEFAULT_EXCERPT_LENGTH,
        }
    }
}

/// Where the reader is, as "page N of M".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgress {
    /// 1-based position of the current page in reading order
    pub page_number: usize,
    pub total_pages: usize,
    /// Whole percent, 0 to 100
    pub percent: u8,
}

/// Reading state over a single book.
pub struct ReadingSession<S: SessionStore> {
    book: Book,
    /// Page ids in reading order
    order: Vec<u32>,
    store: S,
    options: SessionOptions,
    current: u32,
    bookmarks: Vec<Bookmark>,
}

impl<S: SessionStore> ReadingSession<S> {
    /// Start a session, restoring position and bookmarks from `store`.
    ///
    /// A legacy position record, if present, is migrated: it becomes the
    /// starting position, is turned into a bookmark unless that page is
    /// already bookmarked, and is deleted from the store.
    pub fn open(book: Book, store: S, options: SessionOptions) -> Self {
        let order: Vec<u32> = book.pages().map(|p| p.id).collect();
        let state = store.load();
        let first = order.first().copied().unwrap_or(1);

        let mut session = Self {
            book,
            order,
            store,
            options,
            current: first,
            bookmarks: state.bookmarks,
        };

        if let Some(position) = state.position {
            if session.has_page(position) {
                session.current = position;
            } else {
                log::warn!("stored position {position} is not in this book, starting at page {first}");
            }
        }

        if let Some(legacy) = state.legacy_position {
            session.migrate_legacy_position(legacy);
        }

        log::debug!(
            "session opened at page {} with {} bookmarks",
            session.current,
            session.bookmarks.len()
        );
        session
    }

    /// Adopt an old single-value position record.
    ///
    /// Safe to repeat: a page that already has a bookmark is not bookmarked
    /// again. The migrated state, without the legacy record, is written back.
    /// A book with no chapters cannot hold the bookmark, so the record is
    /// left in the store untouched.
    pub fn migrate_legacy_position(&mut self, page_id: u32) {
        if !self.is_bookmarked(page_id) {
            let chapter = self
                .book
                .chapter_of(page_id)
                .or_else(|| self.book.chapters.first());

            let Some(chapter) = chapter else {
                log::warn!("keeping legacy reading position {page_id}: the book has no chapters");
                return;
            };

            let bookmark = match self.book.page(page_id) {
                Some(page) => Bookmark::new(page, chapter, self.options.excerpt_length),
                None => Bookmark::at(page_id, chapter, format!("Page {page_id}")),
            };
            self.bookmarks.insert(0, bookmark);
        }

        log::info!("migrated legacy reading position {page_id}");
        if self.has_page(page_id) {
            self.current = page_id;
        }
        self.persist();
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn current_page_id(&self) -> u32 {
        self.current
    }

    /// The current page, `None` only for an empty book.
    pub fn current_page(&self) -> Option<&Page> {
        self.book.page(self.current)
    }

    /// The chapter holding the current page, or the first chapter.
    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.book
            .chapter_of(self.current)
            .or_else(|| self.book.chapters.first())
    }

    /// Bookmarks, most recent first.
    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn is_current_page_bookmarked(&self) -> bool {
        self.is_bookmarked(self.current)
    }

    pub fn is_bookmarked(&self, page_id: u32) -> bool {
        self.bookmarks.iter().any(|b| b.page_id == page_id)
    }

    /// Bookmarks pointing at pages this book does not have.
    pub fn stale_bookmarks(&self) -> impl Iterator<Item = &Bookmark> {
        self.bookmarks.iter().filter(|b| !self.has_page(b.page_id))
    }

    pub fn progress(&self) -> ReadingProgress {
        let total_pages = self.order.len();
        let page_number = self.index().map_or(0, |i| i + 1);
        let percent = if total_pages == 0 {
            0
        } else {
            (page_number * 100 / total_pages) as u8
        };

        ReadingProgress {
            page_number,
            total_pages,
            percent,
        }
    }

    /// Perform a navigation action. Returns whether the session changed.
    pub fn apply(&mut self, action: Action) -> bool {
        log::debug!("{action} at page {}", self.current);
        match action {
            Action::Next => self.go_to_next(),
            Action::Previous => self.go_to_previous(),
            Action::First => self.go_to_first(),
            Action::Last => self.go_to_last(),
            Action::GoToPage(page_id) => self.go_to_page(page_id),
            Action::GoToChapter(chapter_id) => self.go_to_chapter_start(chapter_id),
            Action::GoToBookmark(id) => self.go_to_bookmark(&id),
            Action::ToggleBookmark => {
                let before = self.bookmarks.len();
                self.toggle_bookmark();
                self.bookmarks.len() != before
            }
            Action::RemoveBookmark(id) => self.remove_bookmark(&id),
        }
    }

    /// Move to the next page. No-op on the last page.
    pub fn go_to_next(&mut self) -> bool {
        match self.index().and_then(|i| self.order.get(i + 1)) {
            Some(&next) => self.set_position(next),
            None => false,
        }
    }

    /// Move to the previous page. No-op on the first page.
    pub fn go_to_previous(&mut self) -> bool {
        match self
            .index()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| self.order.get(i))
        {
            Some(&previous) => self.set_position(previous),
            None => false,
        }
    }

    pub fn go_to_first(&mut self) -> bool {
        match self.order.first() {
            Some(&first) => self.set_position(first),
            None => false,
        }
    }

    pub fn go_to_last(&mut self) -> bool {
        match self.order.last() {
            Some(&last) => self.set_position(last),
            None => false,
        }
    }

    /// Jump to a page. No-op if the book has no such page.
    pub fn go_to_page(&mut self, page_id: u32) -> bool {
        if !self.has_page(page_id) {
            log::debug!("ignoring jump to unknown page {page_id}");
            return false;
        }
        self.set_position(page_id)
    }

    /// Jump to the first page of a chapter. No-op for unknown chapters.
    pub fn go_to_chapter_start(&mut self, chapter_id: u32) -> bool {
        match self.book.chapter(chapter_id).and_then(Chapter::first_page_id) {
            Some(page_id) => self.go_to_page(page_id),
            None => false,
        }
    }

    /// Jump to a bookmarked page. No-op for unknown or dangling bookmarks.
    pub fn go_to_bookmark(&mut self, bookmark_id: &str) -> bool {
        match self.bookmarks.iter().find(|b| b.id == bookmark_id) {
            Some(bookmark) => self.go_to_page(bookmark.page_id),
            None => false,
        }
    }

    /// Remove the current page's bookmark, or add one at the front.
    ///
    /// Returns whether the current page is bookmarked afterwards.
    pub fn toggle_bookmark(&mut self) -> bool {
        if self.is_current_page_bookmarked() {
            let current = self.current;
            self.bookmarks.retain(|b| b.page_id != current);
            self.persist();
            return false;
        }

        let Some(page) = self.book.page(self.current) else {
            return false;
        };
        let Some(chapter) = self.book.chapter_of(self.current) else {
            return false;
        };

        let bookmark = Bookmark::new(page, chapter, self.options.excerpt_length);
        self.bookmarks.insert(0, bookmark);
        self.persist();
        true
    }

    /// Delete a bookmark by id. Returns whether one was removed.
    pub fn remove_bookmark(&mut self, bookmark_id: &str) -> bool {
        let before = self.bookmarks.len();
        self.bookmarks.retain(|b| b.id != bookmark_id);
        if self.bookmarks.len() == before {
            return false;
        }
        self.persist();
        true
    }

    fn has_page(&self, page_id: u32) -> bool {
        self.order.contains(&page_id)
    }

    fn index(&self) -> Option<usize> {
        self.order.iter().position(|&id| id == self.current)
    }

    fn set_position(&mut self, page_id: u32) -> bool {
        if page_id == self.current {
            return false;
        }
        self.current = page_id;
        self.persist();
        true
    }

    /// Write the full state through to the store.
    fn persist(&mut self) {
        let state = SessionState {
            position: Some(self.current),
            bookmarks: self.bookmarks.clone(),
            legacy_position: None,
        };
        if let Err(err) = self.store.save(&state) {
            log::warn!("failed to save reading state: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_book;
    use proptest::prelude::*;

    const BOOK: &str = r#"CHAPTER I
There were three of them.

<comic-panel src="/images/comic-panel-1.png" alt="Gerald proposing the bandit game" id="bandits">
"More likely expel us," said Gerald.
</comic-panel>

They went out into the garden.

CHAPTER II
"It's a cave," said Gerald.

CHAPTER III
They walked along the passage."#;

    type TestStore = KeyValueSessionStore<MemoryStore>;

    fn store() -> TestStore {
        KeyValueSessionStore::new(MemoryStore::new(), StorageKeys::default())
    }

    fn open(store: TestStore) -> ReadingSession<TestStore> {
        ReadingSession::open(parse_book(BOOK), store, SessionOptions::default())
    }

    fn store_with(records: &[(&str, &str)]) -> TestStore {
        let mut store = store();
        for (key, value) in records {
            store.inner_mut().set(key, value.to_string()).unwrap();
        }
        store
    }

    #[test]
    fn test_fixture_shape() {
        let session = open(store());
        assert_eq!(session.book().page_count(), 5);
        assert_eq!(session.current_page_id(), 1);
        assert_eq!(session.progress().page_number, 1);
    }

    #[test]
    fn test_next_and_previous_stop_at_the_ends() {
        let mut session = open(store());

        assert!(!session.go_to_previous());
        assert_eq!(session.current_page_id(), 1);

        for expected in 2..=5 {
            assert!(session.go_to_next());
            assert_eq!(session.current_page_id(), expected);
        }
        assert!(!session.go_to_next());
        assert_eq!(session.current_page_id(), 5);

        assert!(session.go_to_previous());
        assert_eq!(session.current_page_id(), 4);
    }

    #[test]
    fn test_go_to_unknown_page_is_noop() {
        let mut session = open(store());
        session.go_to_page(3);

        assert!(!session.go_to_page(99));
        assert!(!session.go_to_page(0));
        assert_eq!(session.current_page_id(), 3);
    }

    #[test]
    fn test_chapter_navigation() {
        let mut session = open(store());

        assert!(session.go_to_chapter_start(3));
        assert_eq!(session.current_page_id(), 5);
        assert_eq!(session.current_chapter().map(|c| c.title.as_str()), Some("CHAPTER III"));

        assert!(!session.go_to_chapter_start(42));
        assert_eq!(session.current_page_id(), 5);

        assert!(session.apply(Action::GoToChapter(2)));
        assert_eq!(session.current_page_id(), 4);
    }

    #[test]
    fn test_first_and_last() {
        let mut session = open(store());
        assert!(session.apply(Action::Last));
        assert_eq!(session.progress().percent, 100);
        assert!(session.apply(Action::First));
        assert_eq!(session.current_page_id(), 1);
        assert!(!session.apply(Action::First));
    }

    #[test]
    fn test_position_is_written_on_every_change() {
        let mut session = open(store());
        session.go_to_next();
        session.go_to_next();

        let store = session.into_store();
        assert_eq!(store.inner().get("folio-progress").as_deref(), Some("3"));
    }

    #[test]
    fn test_position_restored_on_reopen() {
        let mut session = open(store());
        session.go_to_page(4);

        let session = open(session.into_store());
        assert_eq!(session.current_page_id(), 4);
        assert_eq!(session.current_chapter().map(|c| c.id), Some(2));
    }

    #[test]
    fn test_stale_position_falls_back_to_first_page() {
        let session = open(store_with(&[("folio-progress", "42")]));

        assert_eq!(session.current_page_id(), 1);
        assert_eq!(session.current_chapter().map(|c| c.id), Some(1));
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut session = open(store());
        session.go_to_page(2);

        assert!(session.toggle_bookmark());
        assert!(session.is_current_page_bookmarked());
        let bookmark = &session.bookmarks()[0];
        assert_eq!(bookmark.page_id, 2);
        assert_eq!(bookmark.chapter_id, 1);
        assert_eq!(bookmark.chapter_title, "CHAPTER I");
        assert_eq!(bookmark.excerpt, "\"More likely expel us,\" said Gerald.");

        assert!(!session.toggle_bookmark());
        assert!(!session.is_current_page_bookmarked());
        assert!(session.bookmarks().is_empty());
    }

    #[test]
    fn test_new_bookmarks_go_first() {
        let mut session = open(store());
        session.toggle_bookmark();
        session.go_to_page(5);
        session.toggle_bookmark();

        let pages: Vec<u32> = session.bookmarks().iter().map(|b| b.page_id).collect();
        assert_eq!(pages, vec![5, 1]);
    }

    #[test]
    fn test_remove_bookmark() {
        let mut session = open(store());
        session.toggle_bookmark();
        session.go_to_next();
        session.toggle_bookmark();

        let oldest = session.bookmarks()[1].id.clone();
        assert!(!session.remove_bookmark("non-existent-id"));
        assert_eq!(session.bookmarks().len(), 2);

        assert!(session.apply(Action::RemoveBookmark(oldest)));
        assert_eq!(session.bookmarks().len(), 1);
        assert_eq!(session.bookmarks()[0].page_id, 2);
    }

    #[test]
    fn test_bookmarks_restored_on_reopen() {
        let mut session = open(store());
        session.go_to_page(4);
        session.toggle_bookmark();
        let saved = session.bookmarks().to_vec();

        let session = open(session.into_store());
        assert_eq!(session.bookmarks(), saved.as_slice());
        assert!(session.is_current_page_bookmarked());
    }

    #[test]
    fn test_go_to_bookmark() {
        let mut session = open(store());
        session.go_to_page(4);
        session.toggle_bookmark();
        let id = session.bookmarks()[0].id.clone();
        session.go_to_first();

        assert!(session.go_to_bookmark(&id));
        assert_eq!(session.current_page_id(), 4);
        assert!(!session.go_to_bookmark("missing"));
    }

    #[test]
    fn test_dangling_bookmark_is_tolerated() {
        let chapter = Chapter {
            id: 9,
            title: "CHAPTER IX".to_string(),
            pages: vec![],
        };
        let dangling = Bookmark::at(77, &chapter, "gone".to_string());
        let raw = serde_json::to_string(&vec![dangling.clone()]).unwrap();
        let mut session = open(store_with(&[("folio-bookmarks", raw.as_str())]));

        assert_eq!(session.stale_bookmarks().count(), 1);
        assert!(!session.go_to_bookmark(&dangling.id));
        assert_eq!(session.current_page_id(), 1);
        // still listed, never pruned
        assert_eq!(session.bookmarks().len(), 1);
    }

    #[test]
    fn test_corrupted_bookmark_record() {
        let session = open(store_with(&[("folio-bookmarks", "not valid json")]));
        assert!(session.bookmarks().is_empty());
    }

    #[test]
    fn test_legacy_position_is_migrated() {
        let session = open(store_with(&[("folio-page", "4")]));

        assert_eq!(session.current_page_id(), 4);
        assert_eq!(session.bookmarks().len(), 1);
        assert_eq!(session.bookmarks()[0].page_id, 4);
        assert_eq!(session.bookmarks()[0].chapter_title, "CHAPTER II");

        let store = session.into_store();
        assert_eq!(store.inner().get("folio-page"), None);
        assert_eq!(store.inner().get("folio-progress").as_deref(), Some("4"));
    }

    #[test]
    fn test_legacy_migration_is_idempotent() {
        let mut session = open(store_with(&[("folio-page", "3")]));
        session.migrate_legacy_position(3);
        assert_eq!(session.bookmarks().len(), 1);

        // an old reader writes the same record again
        let mut store = session.into_store();
        store.inner_mut().set("folio-page", "3".to_string()).unwrap();
        let session = open(store);

        let for_page: Vec<_> = session.bookmarks().iter().filter(|b| b.page_id == 3).collect();
        assert_eq!(for_page.len(), 1);
        assert_eq!(session.bookmarks().len(), 1);
    }

    #[test]
    fn test_legacy_page_already_bookmarked() {
        let mut session = open(store());
        session.go_to_page(5);
        session.toggle_bookmark();
        let existing = session.bookmarks()[0].clone();

        let mut store = session.into_store();
        store.inner_mut().set("folio-page", "5".to_string()).unwrap();
        let session = open(store);

        assert_eq!(session.bookmarks(), &[existing]);
    }

    #[test]
    fn test_legacy_position_outside_book() {
        let session = open(store_with(&[("folio-page", "15")]));

        assert_eq!(session.current_page_id(), 1);
        assert_eq!(session.bookmarks()[0].page_id, 15);
        assert_eq!(session.bookmarks()[0].chapter_id, 1);
        assert_eq!(session.stale_bookmarks().count(), 1);
    }

    #[test]
    fn test_empty_book() {
        let mut session = ReadingSession::open(Book::default(), store(), SessionOptions::default());

        assert!(session.current_page().is_none());
        assert!(session.current_chapter().is_none());
        assert!(!session.go_to_next());
        assert!(!session.toggle_bookmark());
        assert!(session.bookmarks().is_empty());
        assert_eq!(session.progress().total_pages, 0);
    }

    #[test]
    fn test_legacy_position_kept_for_empty_book() {
        let session = ReadingSession::open(
            Book::default(),
            store_with(&[("folio-page", "15")]),
            SessionOptions::default(),
        );
        assert!(session.bookmarks().is_empty());

        let store = session.into_store();
        assert_eq!(store.inner().get("folio-page").as_deref(), Some("15"));
        assert_eq!(store.inner().get("folio-progress"), None);
    }

    /// Accepts reads, refuses every write.
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&mut self, _key: &str, _value: String) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }

        fn remove(&mut self, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failures_do_not_interrupt_session() {
        let store = KeyValueSessionStore::new(ReadOnlyStore, StorageKeys::default());
        let mut session = ReadingSession::open(parse_book(BOOK), store, SessionOptions::default());

        assert!(session.go_to_next());
        assert_eq!(session.current_page_id(), 2);

        assert!(session.toggle_bookmark());
        assert!(session.is_current_page_bookmarked());

        assert!(session.apply(Action::GoToChapter(3)));
        assert_eq!(session.current_page_id(), 5);

        let id = session.bookmarks()[0].id.clone();
        assert!(session.remove_bookmark(&id));
        assert!(session.bookmarks().is_empty());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Next,
        Previous,
        Goto(u32),
        Toggle,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Next),
            Just(Op::Previous),
            (0u32..8).prop_map(Op::Goto),
            Just(Op::Toggle),
        ]
    }

    proptest! {
        #[test]
        fn prop_at_most_one_bookmark_per_page(ops in prop::collection::vec(op(), 0..60)) {
            let mut session = open(store());
            for op in ops {
                match op {
                    Op::Next => { session.go_to_next(); }
                    Op::Previous => { session.go_to_previous(); }
                    Op::Goto(page) => { session.go_to_page(page); }
                    Op::Toggle => { session.toggle_bookmark(); }
                }
            }

            let mut pages: Vec<u32> = session.bookmarks().iter().map(|b| b.page_id).collect();
            let total = pages.len();
            pages.sort_unstable();
            pages.dedup();
            prop_assert_eq!(pages.len(), total);
        }

        #[test]
        fn prop_even_toggles_restore_state(page in 1u32..=5, pairs in 1usize..5) {
            let mut session = open(store());
            session.go_to_page(page);
            let before = session.is_current_page_bookmarked();
            let count = session.bookmarks().len();

            for _ in 0..pairs * 2 {
                session.toggle_bookmark();
            }

            prop_assert_eq!(session.is_current_page_bookmarked(), before);
            prop_assert_eq!(session.bookmarks().len(), count);
        }
    }
}
