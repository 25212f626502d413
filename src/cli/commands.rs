use clap::{Parser, ValueEnum};
use folio::{Action, Config};
use std::path::PathBuf;

#[cfg(feature = "unstable-dynamic")]
use clap_complete::engine::{ArgValueCompleter, CompletionCandidate};

#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "A paginated reader for illustrated books")]
#[command(
    long_about = "folio - Read an illustrated book a page at a time, with bookmarks and saved progress.\n\n\
    The book is either marked-up text (chapters headed `CHAPTER <roman numeral>`, illustrations\n\
    in <comic-panel> blocks) or a JSON document produced by `folio build`. Every command\n\
    prints the page you end up on, and your position is saved between runs.\n\n\
    Examples:\n  \
    folio castle.txt                  # Show the current page\n  \
    folio castle.txt next             # Turn the page\n  \
    folio castle.txt chapter 3        # Jump to the start of chapter 3\n  \
    folio castle.txt bookmark         # Bookmark (or unbookmark) this page\n  \
    folio -o json castle.txt bookmarks\n  \
    folio castle.txt build -o book.json\n  \
    folio raw.txt extract -o castle.txt"
)]
pub struct Cli {
    /// Book to read (.txt text or .json pre-parsed book)
    ///
    /// For `extract`, this is a raw Project Gutenberg download instead.
    /// Not needed for `init-config`.
    #[arg(add = book_file_completer())]
    pub book: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,

    /// Reading state file (overrides config)
    ///
    /// Bookmarks and the reading position are stored here.
    /// Defaults to the platform data directory, e.g. ~/.local/share/folio/state.json
    #[arg(long = "state", value_name = "FILE", global = true)]
    pub state: Option<PathBuf>,

    /// Illustration catalog to overlay onto the book (overrides config)
    ///
    /// A JSON scene list that supplies captions and canonical image paths
    /// for illustration pages.
    #[arg(long = "illustrations", value_name = "FILE", global = true)]
    pub illustrations: Option<PathBuf>,

    /// Soft limit on prose characters per page (overrides config)
    ///
    /// Paragraphs are never split, so a single long paragraph may exceed it.
    #[arg(long = "chars-per-page", value_name = "N", global = true)]
    pub chars_per_page: Option<usize>,

    /// Output format
    ///
    ///   plain - Human-readable text (default)
    ///   json  - Pretty-printed JSON for scripting
    #[arg(short = 'o', long = "output", default_value = "plain")]
    pub output: OutputFormat,
}

impl Cli {
    /// Apply command-line overrides on top of `config`.
    ///
    /// Priority: CLI args > config file > defaults. `init-config` writes the
    /// file itself, so it gets `config` back untouched.
    pub fn settings(&self, mut config: Config) -> Config {
        if let Some(Command::InitConfig) = self.command {
            return config;
        }
        if let Some(ref state) = self.state {
            config.storage.state_file = Some(state.clone());
        }
        if let Some(ref catalog) = self.illustrations {
            config.illustrations.catalog = Some(catalog.clone());
        }
        if let Some(chars_per_page) = self.chars_per_page {
            config.reader.chars_per_page = chars_per_page;
        }
        config
    }
}

#[derive(Debug, Clone, clap::Subcommand)]
pub enum Command {
    /// Show the current page (default)
    Show,

    /// Turn to the next page
    Next,

    /// Turn to the previous page
    Prev,

    /// Jump to the first page
    First,

    /// Jump to the last page
    Last,

    /// Jump to a page by number
    Goto {
        /// Page number, counted across the whole book
        page: u32,
    },

    /// Jump to the first page of a chapter
    Chapter {
        /// Chapter number, starting at 1
        id: u32,
    },

    /// Bookmark the current page, or remove its bookmark
    Bookmark,

    /// List bookmarks, most recent first
    Bookmarks,

    /// Delete a bookmark
    Unbookmark {
        /// Bookmark id, as shown by `bookmarks`
        id: String,
    },

    /// Jump to a bookmarked page
    OpenBookmark {
        /// Bookmark id, as shown by `bookmarks`
        id: String,
    },

    /// List chapters with their first page
    Chapters,

    /// Parse the book and write it as JSON
    ///
    /// The output can be opened directly by folio, skipping the parse step.
    Build {
        /// Output file (defaults to stdout)
        #[arg(short = 'o', long = "output", value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Clean a raw Project Gutenberg download into book text
    Extract {
        /// Output file (defaults to stdout)
        #[arg(short = 'o', long = "output", value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Write the default configuration file
    InitConfig,
}

impl Command {
    /// The session action this command performs, if any.
    pub fn action(&self) -> Option<Action> {
        match self {
            Command::Next => Some(Action::Next),
            Command::Prev => Some(Action::Previous),
            Command::First => Some(Action::First),
            Command::Last => Some(Action::Last),
            Command::Goto { page } => Some(Action::GoToPage(*page)),
            Command::Chapter { id } => Some(Action::GoToChapter(*id)),
            Command::Bookmark => Some(Action::ToggleBookmark),
            Command::Unbookmark { id } => Some(Action::RemoveBookmark(id.clone())),
            Command::OpenBookmark { id } => Some(Action::GoToBookmark(id.clone())),
            Command::Show
            | Command::Bookmarks
            | Command::Chapters
            | Command::Build { .. }
            | Command::Extract { .. }
            | Command::InitConfig => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Plain,
    /// JSON output
    Json,
}

#[cfg(feature = "unstable-dynamic")]
fn book_file_completer() -> ArgValueCompleter {
    ArgValueCompleter::new(complete_book_path)
}

/// Directories and `.txt`/`.json` files starting with the typed name.
#[cfg(feature = "unstable-dynamic")]
fn complete_book_path(current: &std::ffi::OsStr) -> Vec<CompletionCandidate> {
    use std::path::Path;

    let current = current.to_string_lossy();
    let (dir, name_prefix) = match current.rfind('/') {
        Some(slash) => (&current[..=slash], &current[slash + 1..]),
        None => ("", current.as_ref()),
    };
    let search_dir = if dir.is_empty() { Path::new(".") } else { Path::new(dir) };
    let Ok(entries) = std::fs::read_dir(search_dir) else {
        return Vec::new();
    };
    let name_prefix = name_prefix.to_lowercase();

    entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.to_lowercase().starts_with(&name_prefix) {
                return None;
            }
            let path = entry.path();
            if path.is_dir() {
                Some(CompletionCandidate::new(format!("{dir}{name}/")).help(Some("directory".into())))
            } else {
                is_book_file(&path).then(|| CompletionCandidate::new(format!("{dir}{name}")))
            }
        })
        .collect()
}

#[cfg(feature = "unstable-dynamic")]
fn is_book_file(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt") || ext.eq_ignore_ascii_case("json"))
}

#[cfg(not(feature = "unstable-dynamic"))]
fn book_file_completer() -> clap::builder::ValueHint {
    clap::ValueHint::FilePath
}
