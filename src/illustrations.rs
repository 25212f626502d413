//! Illustration catalog overlay.
//!
//! An optional JSON catalog describes every illustration scene with a
//! canonical image path and a description. Overlaying it onto a parsed book
//! lets images be renamed or moved without touching the book text or
//! breaking bookmarks, since pages are matched by their stable id first.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::input::InputError;
use crate::parser::{Book, Page};

/// A single illustration scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: String,
    pub description: String,
    /// Layout hint for the presentation layer
    #[serde(default)]
    pub placement: String,
    /// Canonical image path
    pub path: String,
    /// Name of the file the image was produced from
    #[serde(default)]
    pub original_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneChapter {
    pub chapter_id: u32,
    pub title: String,
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

/// The catalog document: scenes grouped by chapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IllustrationCatalog {
    #[serde(default)]
    pub chapters: Vec<SceneChapter>,
}

impl IllustrationCatalog {
    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a catalog.
    pub fn load(path: &Path) -> Result<Self, InputError> {
        let contents = std::fs::read_to_string(path).map_err(|source| InputError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| InputError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.chapters.iter().flat_map(|c| c.scenes.iter())
    }

    /// Scene ids that appear more than once across chapters.
    pub fn duplicate_scene_ids(&self) -> Vec<&str> {
        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for scene in self.scenes() {
            *counts.entry(scene.id.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|&(_, count)| count > 1)
            .map(|(id, _)| id)
            .collect()
    }

    /// Illustration pages whose `illustration_id` is not in the catalog.
    pub fn unknown_references<'a>(&self, book: &'a Book) -> Vec<&'a Page> {
        let index = SceneIndex::new(self);
        book.pages()
            .filter(|p| p.is_illustration())
            .filter(|p| {
                p.illustration_id
                    .as_deref()
                    .is_some_and(|id| !index.by_id.contains_key(id))
            })
            .collect()
    }

    /// Overlay scene metadata onto the book's illustration pages.
    ///
    /// Returns the number of pages that resolved to a scene. Pages that do
    /// not resolve are left unchanged.
    pub fn apply(&self, book: &mut Book) -> usize {
        let index = SceneIndex::new(self);
        let mut resolved = 0;

        for page in book.pages_mut().filter(|p| p.is_illustration()) {
            let Some(scene) = index.resolve(page) else {
                log::debug!("page {} has no catalog scene", page.id);
                continue;
            };

            if page.caption.as_deref().is_none_or(str::is_empty) {
                page.caption = Some(scene.description.clone());
            }
            page.image_reference = Some(scene.path.clone());
            if page.illustration_id.is_none() {
                page.illustration_id = Some(scene.id.clone());
            }
            resolved += 1;
        }

        log::debug!("illustration catalog resolved {resolved} pages");
        resolved
    }
}

/// Lookup tables from scene id and image path to scene.
struct SceneIndex<'a> {
    by_id: IndexMap<&'a str, &'a Scene>,
    by_path: IndexMap<&'a str, &'a Scene>,
}

impl<'a> SceneIndex<'a> {
    fn new(catalog: &'a IllustrationCatalog) -> Self {
        let mut by_id = IndexMap::new();
        let mut by_path = IndexMap::new();
        for scene in catalog.scenes() {
            by_id.entry(scene.id.as_str()).or_insert(scene);
            by_path.entry(scene.path.as_str()).or_insert(scene);
            if !scene.original_file.is_empty() {
                by_path.entry(scene.original_file.as_str()).or_insert(scene);
            }
        }
        Self { by_id, by_path }
    }

    fn resolve(&self, page: &Page) -> Option<&'a Scene> {
        let by_id = page
            .illustration_id
            .as_deref()
            .and_then(|id| self.by_id.get(id));
        let by_path = || {
            page.image_reference
                .as_deref()
                .and_then(|path| self.by_path.get(path))
        };
        by_id.or_else(by_path).copied()
    }
}

/// Resolve an asset path against a base path.
///
/// Absolute URLs (`http:`, `https:`, protocol-relative `//`) and `data:` URIs
/// pass through unchanged; an empty path resolves to an empty string.
///
/// # Examples
///
/// ```
/// # use folio::illustrations::resolve_asset;
/// assert_eq!(resolve_asset("/reader", "/images/a.png"), "/reader/images/a.png");
/// assert_eq!(resolve_asset("/", "images/a.png"), "/images/a.png");
/// assert_eq!(resolve_asset("/reader/", "https://cdn.example/a.png"), "https://cdn.example/a.png");
/// ```
pub fn resolve_asset(base: &str, path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }

    let lower = path.to_ascii_lowercase();
    if lower.starts_with("http://")
        || lower.starts_with("https://")
        || path.starts_with("//")
        || lower.starts_with("data:")
    {
        return path.to_string();
    }

    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    format!("{base}{}", path.strip_prefix('/').unwrap_or(path))
}
