//! Persistence for reading sessions.
//!
//! Sessions talk to storage through the narrow [`SessionStore`] interface: one
//! call loads the whole state, one call writes it back. The provided
//! implementation, [`KeyValueSessionStore`], lays that state out as three
//! string records in a [`KeyValueStore`], the same shape a browser's local
//! storage would hold:
//!
//! - `<namespace>-bookmarks`: JSON array of bookmarks
//! - `<namespace>-progress`: current page id
//! - `<namespace>-page`: legacy single "last read page" record
//!
//! Decoding is forgiving. A corrupted bookmark record loads as an empty list
//! and an unreadable page id loads as absent, so a damaged store never stops
//! a session from opening.

use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::bookmark::Bookmark;

/// Errors raised while writing session state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode session state: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("could not determine a data directory for the state file")]
    NoDataDir,
}

/// Everything a session persists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Current page id
    pub position: Option<u32>,
    /// Bookmarks, most recent first
    pub bookmarks: Vec<Bookmark>,
    /// Position written by older readers; saving `None` deletes the record
    pub legacy_position: Option<u32>,
}

/// Load/save interface between a session and its storage.
pub trait SessionStore {
    /// Read the stored state. Never fails; unreadable records load as empty.
    fn load(&self) -> SessionState;

    /// Replace the stored state.
    fn save(&mut self, state: &SessionState) -> Result<(), StoreError>;
}

/// A string key/value substrate.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// Make buffered changes durable.
    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// In-process key/value store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: IndexMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.records.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.records.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.records.shift_remove(key);
        Ok(())
    }
}

/// Key/value store kept in a single JSON object file.
///
/// Changes are buffered in memory until [`KeyValueStore::flush`], which
/// replaces the file atomically.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    records: IndexMap<String, String>,
    dirty: bool,
}

impl FileStore {
    /// Platform data path for the state file
    /// - Linux: ~/.local/share/folio/state.json
    /// - macOS: ~/Library/Application Support/folio/state.json
    /// - Windows: %APPDATA%/folio/state.json
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("folio").join("state.json"))
    }

    /// Open the store at `path`. A missing or unreadable file opens empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("ignoring unreadable state file {}: {err}", path.display());
                IndexMap::new()
            }),
            Err(_) => IndexMap::new(),
        };

        Self {
            path,
            records,
            dirty: false,
        }
    }

    /// Open the store at [`FileStore::default_path`].
    pub fn open_default() -> Result<Self, StoreError> {
        Self::default_path()
            .map(Self::open)
            .ok_or(StoreError::NoDataDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.records.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        if self.records.get(key) != Some(&value) {
            self.records.insert(key.to_string(), value);
            self.dirty = true;
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.records.shift_remove(key).is_some() {
            self.dirty = true;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        // Write to a temp file in the same directory, then rename over the target
        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(serde_json::to_string_pretty(&self.records)?.as_bytes())?;
        temp_file.flush()?;
        temp_file.persist(&self.path).map_err(|err| err.error)?;

        self.dirty = false;
        Ok(())
    }
}

/// Names of the records a session occupies in a key/value store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub bookmarks: String,
    pub progress: String,
    pub legacy_position: String,
}

impl StorageKeys {
    pub fn for_namespace(namespace: &str) -> Self {
        Self {
            bookmarks: format!("{namespace}-bookmarks"),
            progress: format!("{namespace}-progress"),
            legacy_position: format!("{namespace}-page"),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::for_namespace("folio")
    }
}

/// [`SessionStore`] over any [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct KeyValueSessionStore<K> {
    inner: K,
    keys: StorageKeys,
}

impl<K: KeyValueStore> KeyValueSessionStore<K> {
    pub fn new(inner: K, keys: StorageKeys) -> Self {
        Self { inner, keys }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn inner(&self) -> &K {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut K {
        &mut self.inner
    }

    pub fn into_inner(self) -> K {
        self.inner
    }
}

impl<K: KeyValueStore> SessionStore for KeyValueSessionStore<K> {
    fn load(&self) -> SessionState {
        SessionState {
            position: self
                .inner
                .get(&self.keys.progress)
                .and_then(|raw| decode_page_id(&raw)),
            bookmarks: self
                .inner
                .get(&self.keys.bookmarks)
                .map(|raw| decode_bookmarks(&raw))
                .unwrap_or_default(),
            legacy_position: self
                .inner
                .get(&self.keys.legacy_position)
                .and_then(|raw| decode_page_id(&raw)),
        }
    }

    fn save(&mut self, state: &SessionState) -> Result<(), StoreError> {
        self.inner.set(
            &self.keys.bookmarks,
            serde_json::to_string(&state.bookmarks)?,
        )?;

        match state.position {
            Some(page_id) => self.inner.set(&self.keys.progress, page_id.to_string())?,
            None => self.inner.remove(&self.keys.progress)?,
        }

        match state.legacy_position {
            Some(page_id) => self
                .inner
                .set(&self.keys.legacy_position, page_id.to_string())?,
            None => self.inner.remove(&self.keys.legacy_position)?,
        }

        self.inner.flush()
    }
}

/// Decode a bookmark record, keeping every entry that is a valid bookmark.
///
/// Anything that is not a JSON array decodes to an empty list. Only the first
/// (most recent) bookmark for each page is kept.
pub fn decode_bookmarks(raw: &str) -> Vec<Bookmark> {
    let entries: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!("discarding unreadable bookmark record: {err}");
            return Vec::new();
        }
    };

    let total = entries.len();
    let valid: Vec<Bookmark> = entries
        .into_iter()
        .filter_map(|entry| Bookmark::deserialize(entry).ok())
        .collect();

    if valid.len() < total {
        log::warn!("dropped {} malformed bookmark entries", total - valid.len());
    }

    let valid_count = valid.len();
    let mut by_page: IndexMap<u32, Bookmark> = IndexMap::with_capacity(valid_count);
    for bookmark in valid {
        by_page.entry(bookmark.page_id).or_insert(bookmark);
    }
    if by_page.len() < valid_count {
        log::warn!(
            "dropped {} duplicate bookmarks for already bookmarked pages",
            valid_count - by_page.len()
        );
    }
    by_page.into_values().collect()
}

/// Decode a stored page id: a bare integer, optionally JSON-quoted.
pub fn decode_page_id(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    raw.parse()
        .ok()
        .or_else(|| {
            serde_json::from_str::<String>(raw)
                .ok()
                .and_then(|s| s.trim().parse().ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Chapter;

    fn chapter() -> Chapter {
        Chapter {
            id: 1,
            title: "CHAPTER I".to_string(),
            pages: vec![],
        }
    }

    fn memory_store() -> KeyValueSessionStore<MemoryStore> {
        KeyValueSessionStore::new(MemoryStore::new(), StorageKeys::default())
    }

    #[test]
    fn test_empty_store_loads_default_state() {
        assert_eq!(memory_store().load(), SessionState::default());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = memory_store();
        let state = SessionState {
            position: Some(25),
            bookmarks: vec![Bookmark::at(10, &chapter(), "Test excerpt content".to_string())],
            legacy_position: None,
        };

        store.save(&state).unwrap();
        assert_eq!(store.load(), state);
        assert_eq!(store.inner().get("folio-progress").as_deref(), Some("25"));
    }

    #[test]
    fn test_saving_without_legacy_deletes_record() {
        let mut store = memory_store();
        store.inner_mut().set("folio-page", "15".to_string()).unwrap();
        assert_eq!(store.load().legacy_position, Some(15));

        store.save(&SessionState::default()).unwrap();
        assert_eq!(store.inner().get("folio-page"), None);
        assert_eq!(store.inner().get("folio-progress"), None);
    }

    #[test]
    fn test_corrupted_bookmarks_load_empty() {
        let mut store = memory_store();
        store
            .inner_mut()
            .set("folio-bookmarks", "not valid json".to_string())
            .unwrap();
        assert!(store.load().bookmarks.is_empty());

        store
            .inner_mut()
            .set("folio-bookmarks", r#"{"not": "an array"}"#.to_string())
            .unwrap();
        assert!(store.load().bookmarks.is_empty());
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let good = Bookmark::at(3, &chapter(), "ok".to_string());
        let raw = format!(
            "[{}, {{\"pageId\": \"three\"}}, 42]",
            serde_json::to_string(&good).unwrap()
        );
        assert_eq!(decode_bookmarks(&raw), vec![good]);
    }

    #[test]
    fn test_duplicate_pages_keep_most_recent() {
        let newest = Bookmark::at(4, &chapter(), "newest".to_string());
        let other = Bookmark::at(6, &chapter(), "other".to_string());
        let older = Bookmark::at(4, &chapter(), "older".to_string());
        let raw = serde_json::to_string(&vec![&newest, &other, &older]).unwrap();

        assert_eq!(decode_bookmarks(&raw), vec![newest, other]);
    }

    #[test]
    fn test_open_default_uses_data_dir() {
        match FileStore::default_path() {
            Some(path) => assert_eq!(FileStore::open_default().unwrap().path(), path.as_path()),
            None => assert!(matches!(
                FileStore::open_default(),
                Err(StoreError::NoDataDir)
            )),
        }
    }

    #[test]
    fn test_decode_page_id() {
        assert_eq!(decode_page_id("42"), Some(42));
        assert_eq!(decode_page_id(" 7\n"), Some(7));
        assert_eq!(decode_page_id("\"11\""), Some(11));
        assert_eq!(decode_page_id("eleven"), None);
        assert_eq!(decode_page_id("-3"), None);
        assert_eq!(decode_page_id(""), None);
    }

    #[test]
    fn test_namespaced_keys() {
        let keys = StorageKeys::for_namespace("enchanted-castle");
        assert_eq!(keys.bookmarks, "enchanted-castle-bookmarks");
        assert_eq!(keys.progress, "enchanted-castle-progress");
        assert_eq!(keys.legacy_position, "enchanted-castle-page");
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut store = KeyValueSessionStore::new(FileStore::open(&path), StorageKeys::default());
        let state = SessionState {
            position: Some(4),
            bookmarks: vec![Bookmark::at(4, &chapter(), "four".to_string())],
            legacy_position: None,
        };
        store.save(&state).unwrap();
        assert!(path.exists());

        let reopened = KeyValueSessionStore::new(FileStore::open(&path), StorageKeys::default());
        assert_eq!(reopened.load(), state);
    }

    #[test]
    fn test_file_store_buffers_until_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = FileStore::open(&path);
        store.set("key", "value".to_string()).unwrap();
        assert!(!path.exists());

        store.flush().unwrap();
        assert_eq!(FileStore::open(&path).get("key").as_deref(), Some("value"));
    }

    #[test]
    fn test_corrupted_state_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{{{").unwrap();

        let store = KeyValueSessionStore::new(FileStore::open(&path), StorageKeys::default());
        assert_eq!(store.load(), SessionState::default());
    }
}
