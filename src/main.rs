//! # folio
//!
//! A paginated reader for illustrated books.
//!
//! ## Usage
//!
//! Show the page you were reading:
//! ```sh
//! folio castle.txt
//! ```
//!
//! Turn the page and bookmark it:
//! ```sh
//! folio castle.txt next
//! folio castle.txt bookmark
//! ```
//!
//! Pre-parse a book to JSON:
//! ```sh
//! folio castle.txt build -o castle.json
//! ```

mod cli;

use clap::Parser as ClapParser;
use cli::{Cli, Command, OutputFormat};
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use folio::illustrations::{IllustrationCatalog, resolve_asset};
use folio::parser::BookOutput;
use folio::session::{FileStore, KeyValueSessionStore, SessionStore};
use folio::{Action, Book, Config, ReadingSession, input};
use serde::Serialize;
use std::fs;
use std::path::Path;

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Handle dynamic shell completions
    #[cfg(feature = "unstable-dynamic")]
    clap_complete::CompleteEnv::with_factory(|| {
        use clap::CommandFactory;
        Cli::command()
    })
    .complete();

    let args = Cli::parse();

    let command = args.command.clone().unwrap_or(Command::Show);

    if let Command::InitConfig = command {
        args.settings(Config::default())
            .save()
            .map_err(|e| eyre!("failed to write config: {e}"))?;
        if let Some(path) = Config::config_path() {
            println!("Wrote {}", path.display());
        }
        return Ok(());
    }

    let config = args.settings(Config::load());

    let book_path = args
        .book
        .as_deref()
        .ok_or_else(|| eyre!("a book file is required\n\nUsage: folio [OPTIONS] <BOOK> [COMMAND]"))?;

    match command {
        Command::Extract { ref output } => {
            let raw = fs::read_to_string(book_path)
                .wrap_err_with(|| format!("failed to read {}", book_path.display()))?;
            let text = input::extract_gutenberg(&raw)?;
            write_output(output.as_deref(), &text)
        }
        Command::Build { ref output } => {
            let book = open_book(book_path, &config)?;
            let json = serde_json::to_string_pretty(&book)?;
            write_output(output.as_deref(), &json)
        }
        Command::Chapters => {
            let book = open_book(book_path, &config)?;
            print_chapters(&book, book_path, args.output)
        }
        _ => run_session(&command, book_path, &config, args.output),
    }
}

/// Load the book and overlay the illustration catalog, if one is configured.
fn open_book(path: &Path, config: &Config) -> Result<Book> {
    let mut book = input::load_book(path, &config.parse_options())?;

    if let Some(ref catalog_path) = config.illustrations.catalog {
        let catalog = IllustrationCatalog::load(catalog_path)?;
        for id in catalog.duplicate_scene_ids() {
            log::warn!("illustration catalog lists scene {id:?} more than once");
        }
        for page in catalog.unknown_references(&book) {
            log::warn!(
                "page {} refers to unknown illustration {:?}",
                page.id,
                page.illustration_id.as_deref().unwrap_or_default()
            );
        }
        catalog.apply(&mut book);
    }

    if book.is_empty() {
        log::warn!("{} contains no readable text", path.display());
    }
    Ok(book)
}

fn run_session(
    command: &Command,
    book_path: &Path,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let book = open_book(book_path, config)?;
    let file_store = match config.storage.state_file {
        Some(ref path) => FileStore::open(path.clone()),
        None => FileStore::open_default().wrap_err("pass --state <FILE> to choose a state file")?,
    };
    let store = KeyValueSessionStore::new(file_store, config.storage_keys());
    let mut session = ReadingSession::open(book, store, config.session_options());

    if let Some(action) = command.action() {
        if !session.apply(action.clone()) {
            explain_noop(&action);
        }
    }

    match command {
        Command::Bookmarks => print_bookmarks(&session, format),
        _ => print_page(&session, config, format),
    }
}

/// Tell the user why an action left the session unchanged.
fn explain_noop(action: &Action) {
    let reason = match action {
        Action::GoToPage(page) => format!("there is no page {page} in this book"),
        Action::GoToChapter(chapter) => format!("there is no chapter {chapter} in this book"),
        Action::GoToBookmark(id) | Action::RemoveBookmark(id) => {
            format!("no bookmark with id {id}")
        }
        Action::Next => "already on the last page".to_string(),
        Action::Previous => "already on the first page".to_string(),
        Action::First | Action::Last | Action::ToggleBookmark => return,
    };
    eprintln!("{}: {reason}.", action.description());
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageView<'a> {
    page: &'a folio::Page,
    chapter_id: Option<u32>,
    progress: folio::session::ReadingProgress,
    bookmarked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

fn print_page<S: SessionStore>(
    session: &ReadingSession<S>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let Some(page) = session.current_page() else {
        eprintln!("This book has no pages.");
        return Ok(());
    };
    let progress = session.progress();
    let image = page
        .image_reference
        .as_deref()
        .map(|path| resolve_asset(&config.illustrations.base_path, path));

    match format {
        OutputFormat::Json => {
            let view = PageView {
                page,
                chapter_id: session.current_chapter().map(|c| c.id),
                progress,
                bookmarked: session.is_current_page_bookmarked(),
                image,
            };
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        OutputFormat::Plain => {
            let marker = if session.is_current_page_bookmarked() {
                "  [bookmarked]"
            } else {
                ""
            };
            println!(
                "{}  ·  page {} of {} ({}%){}",
                page.chapter_title,
                progress.page_number,
                progress.total_pages,
                progress.percent,
                marker
            );
            println!();

            if page.is_illustration() {
                let caption = page.caption.as_deref().unwrap_or("Illustration");
                println!("[{caption}]");
                if let Some(ref image) = image {
                    println!("({image})");
                }
                if !page.dialogue_lines().is_empty() {
                    println!();
                    for line in page.dialogue_lines() {
                        println!("  {line}");
                    }
                }
            } else {
                println!("{}", page.content);
            }
        }
    }
    Ok(())
}

fn print_bookmarks<S: SessionStore>(session: &ReadingSession<S>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(session.bookmarks())?);
        }
        OutputFormat::Plain => {
            if session.bookmarks().is_empty() {
                println!("No bookmarks.");
                return Ok(());
            }
            for bookmark in session.bookmarks() {
                let missing = if session.book().page(bookmark.page_id).is_none() {
                    "  (page no longer in book)"
                } else {
                    ""
                };
                println!(
                    "{}  page {}  {}  {}{}",
                    bookmark.id,
                    bookmark.page_id,
                    bookmark.chapter_title,
                    bookmark.created_at.format("%Y-%m-%d %H:%M"),
                    missing
                );
                println!("    {}", bookmark.excerpt);
            }
        }
    }
    Ok(())
}

fn print_chapters(book: &Book, path: &Path, format: OutputFormat) -> Result<()> {
    let output = BookOutput::from_book(book, Some(path.display().to_string()));

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Plain => {
            for chapter in &output.chapters {
                let start = chapter
                    .first_page_id
                    .map_or_else(|| "-".to_string(), |id| id.to_string());
                println!(
                    "{:>3}. {}  (page {}, {} pages)",
                    chapter.id, chapter.title, start, chapter.page_count
                );
            }
            println!(
                "\n{} chapters, {} pages, {} illustrations",
                output.metadata.chapter_count,
                output.metadata.page_count,
                output.metadata.illustration_count
            );
        }
    }
    Ok(())
}

fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, contents)
            .wrap_err_with(|| format!("failed to write {}", path.display())),
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}
