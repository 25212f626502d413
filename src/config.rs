use crate::parser::{DEFAULT_CHARS_PER_PAGE, ParseOptions};
use crate::session::{DEFAULT_EXCERPT_LENGTH, SessionOptions, StorageKeys};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub reader: ReaderConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Illustration catalog overlay
    #[serde(default)]
    pub illustrations: IllustrationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Soft upper bound on prose characters per page (default: 800)
    #[serde(default = "default_chars_per_page")]
    pub chars_per_page: usize,

    /// Maximum bookmark excerpt length in characters (default: 140)
    #[serde(default = "default_excerpt_length")]
    pub excerpt_length: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            chars_per_page: default_chars_per_page(),
            excerpt_length: default_excerpt_length(),
        }
    }
}

fn default_chars_per_page() -> usize {
    DEFAULT_CHARS_PER_PAGE
}

fn default_excerpt_length() -> usize {
    DEFAULT_EXCERPT_LENGTH
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Prefix for the stored record names, e.g. "folio" gives "folio-bookmarks"
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Reading state file. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            state_file: None,
        }
    }
}

fn default_namespace() -> String {
    "folio".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IllustrationConfig {
    /// JSON scene catalog applied on top of parsed illustration pages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,

    /// Base path that illustration references are resolved against
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

impl Default for IllustrationConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            base_path: default_base_path(),
        }
    }
}

fn default_base_path() -> String {
    "/".to_string()
}

impl Config {
    /// Get the XDG-style config file path (~/.config/folio/config.toml)
    /// This is preferred on macOS for CLI tools and cross-platform dotfiles
    #[cfg(target_os = "macos")]
    fn xdg_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("folio").join("config.toml"))
    }

    /// Get the platform-specific config file path
    /// - macOS: ~/Library/Application Support/folio/config.toml
    /// - Linux: ~/.config/folio/config.toml
    /// - Windows: %APPDATA%/folio/config.toml
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("folio").join("config.toml"))
    }

    /// Load config from file, or return default if file doesn't exist
    /// On macOS, checks ~/.config/folio first, then falls back to ~/Library/Application Support
    pub fn load() -> Self {
        #[cfg(target_os = "macos")]
        {
            if let Some(config) = Self::xdg_config_path().and_then(|path| Self::read(&path)) {
                return config;
            }
        }

        Self::config_path()
            .and_then(|path| Self::read(&path))
            .unwrap_or_default()
    }

    fn read(path: &std::path::Path) -> Option<Self> {
        let contents = fs::read_to_string(path).ok()?;
        match toml::from_str(&contents) {
            Ok(config) => Some(config),
            Err(err) => {
                log::warn!("ignoring invalid config {}: {err}", path.display());
                None
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let path = Self::config_path().ok_or("Could not determine config directory")?;

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;

        Ok(())
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            chars_per_page: self.reader.chars_per_page.max(1),
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            excerpt_length: self.reader.excerpt_length,
        }
    }

    pub fn storage_keys(&self) -> StorageKeys {
        StorageKeys::for_namespace(&self.storage.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.reader.chars_per_page, 800);
        assert_eq!(config.reader.excerpt_length, 140);
        assert_eq!(config.storage.namespace, "folio");
        assert_eq!(config.illustrations.base_path, "/");
        assert_eq!(config.storage_keys(), StorageKeys::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [reader]
            chars_per_page = 400

            [storage]
            namespace = "castle"
            "#,
        )
        .unwrap();

        assert_eq!(config.parse_options().chars_per_page, 400);
        assert_eq!(config.session_options().excerpt_length, 140);
        assert_eq!(config.storage_keys().bookmarks, "castle-bookmarks");
        assert_eq!(config.storage_keys().legacy_position, "castle-page");
        assert_eq!(config.illustrations.catalog, None);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = Config::default();
        config.storage.state_file = Some(PathBuf::from("/tmp/state.json"));
        config.illustrations.catalog = Some(PathBuf::from("illustrations.json"));

        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_zero_page_size_is_clamped() {
        let mut config = Config::default();
        config.reader.chars_per_page = 0;
        assert_eq!(config.parse_options().chars_per_page, 1);
    }
}
