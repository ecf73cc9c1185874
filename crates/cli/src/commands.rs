// FILE: crates/cli/src/commands.rs

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::ArgMatches;
use console::style;
use smartbook_config::{Config, ConfigManager, FileSessionStore};
use smartbook_core::{format_time, BookKey, Clip, EntryId, SessionSnapshot, SessionStore};
use smartbook_library::{BookImporter, BookRecord, FsLibrary, LibraryStore};
use smartbook_session::{ChannelLayout, ClipExporter};
use std::path::{Path, PathBuf};

/// Loaded configuration plus the paths derived from it
pub struct Workspace {
    manager: ConfigManager,
    config: Config,
}

impl Workspace {
    pub fn open(config_dir: Option<&str>) -> Result<Self> {
        let manager = match config_dir {
            Some(dir) => ConfigManager::with_directory(PathBuf::from(dir)),
            None => ConfigManager::new(),
        }
        .context("Failed to locate the config directory")?;

        let config = manager
            .load_with_env_overrides()
            .with_context(|| format!("Failed to load {}", manager.config_path().display()))?;

        Ok(Self { manager, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn library(&self) -> Result<FsLibrary> {
        let path = self.manager.library_path(&self.config);
        FsLibrary::open(&path)
            .with_context(|| format!("Failed to open library at {}", path.display()))
    }

    fn session(&self) -> Result<SessionSnapshot> {
        let store = FileSessionStore::new(self.manager.session_path(&self.config));
        store
            .load()
            .with_context(|| format!("Failed to read session file {}", store.path().display()))
    }
}

/// Import a file or a directory into the library
pub fn import(workspace: &Workspace, matches: &ArgMatches) -> Result<()> {
    let path = matches
        .get_one::<String>("path")
        .ok_or_else(|| anyhow!("Path is required"))?;

    let mut library = workspace.library()?;
    let importer = BookImporter::new(&workspace.config().library);
    let report = importer.import_path(&mut library, Path::new(path));

    for record in &report.imported {
        println!(
            "{} {} ({} chapters) as {}",
            style("✓").green().bold(),
            style(&record.title).bold(),
            record.chapters.len(),
            record.key
        );
    }
    for (file, error) in &report.failed {
        println!("{} {}: {}", style("✗").red().bold(), file.display(), error);
    }

    if report.imported.is_empty() {
        if report.failed.is_empty() {
            println!("No supported audio files found in {}", path);
            return Ok(());
        }
        bail!("Nothing was imported from {}", path);
    }

    println!(
        "\nImported {} of {} files",
        report.imported.len(),
        report.imported.len() + report.failed.len()
    );
    Ok(())
}

/// List all books in the library
pub fn list_books(workspace: &Workspace) -> Result<()> {
    let books = workspace
        .library()?
        .list()
        .context("Failed to list books")?;

    if books.is_empty() {
        println!("No books in library. Use 'import' to add audiobooks.");
        return Ok(());
    }

    let snapshot = workspace.session()?;

    println!("\n{} Books in Library", style(books.len()).bold().cyan());
    println!("{}", "=".repeat(80));
    for book in &books {
        println!("{}", render_book_summary(book, &snapshot));
    }
    Ok(())
}

/// Show the bookmarks of one book
pub fn show_bookmarks(workspace: &Workspace, matches: &ArgMatches) -> Result<()> {
    let key = book_key(matches)?;
    let snapshot = workspace.session()?;

    let bookmarks = snapshot
        .book(&key)
        .map(|b| b.bookmarks.as_slice())
        .unwrap_or_default();
    if bookmarks.is_empty() {
        println!("No bookmarks for {}", key);
        return Ok(());
    }

    println!("\n{} Bookmarks for {}", style(bookmarks.len()).bold().cyan(), key);
    println!("{}", "=".repeat(80));
    for bookmark in bookmarks {
        println!(
            "  [{}] {:>9}  {}  (chapter {})",
            bookmark.id,
            format_time(bookmark.time),
            bookmark.title,
            bookmark.chapter + 1
        );
    }
    Ok(())
}

/// Show the clips of one book, newest first
pub fn show_clips(workspace: &Workspace, matches: &ArgMatches) -> Result<()> {
    let key = book_key(matches)?;
    let snapshot = workspace.session()?;

    let clips = snapshot
        .book(&key)
        .map(|b| b.clips.as_slice())
        .unwrap_or_default();
    if clips.is_empty() {
        println!("No clips for {}", key);
        return Ok(());
    }

    println!("\n{} Clips for {}", style(clips.len()).bold().cyan(), key);
    println!("{}", "=".repeat(80));
    for clip in clips {
        println!("{}", render_clip(clip));
    }
    Ok(())
}

/// Show listening minutes per day
pub fn listening_report(workspace: &Workspace, matches: &ArgMatches) -> Result<()> {
    let days = matches.get_one::<u32>("days").copied().unwrap_or(7);
    let snapshot = workspace.session()?;
    let today = chrono::Local::now().date_naive();

    println!("\n{}", style("Listening Report").bold().cyan());
    println!("{}", "=".repeat(80));
    print!("{}", render_report(&snapshot, today, days));
    Ok(())
}

/// Export a saved clip to WAV
pub async fn export_clip(workspace: &Workspace, matches: &ArgMatches) -> Result<()> {
    let key = book_key(matches)?;
    let clip_id: EntryId = matches
        .get_one::<String>("clip")
        .ok_or_else(|| anyhow!("Clip id is required"))?
        .parse()
        .context("Clip id must be a number")?;

    let snapshot = workspace.session()?;
    let clip = find_clip(&snapshot, &key, clip_id)?;

    let library = workspace.library()?;
    let audio_path = library.audio_path(&key)?;
    if !audio_path.is_file() {
        bail!("{} is not in the library", key);
    }

    let dest = matches
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| default_export_path(clip_id));
    let layout = if matches.get_flag("mono") {
        ChannelLayout::Mono
    } else {
        ChannelLayout::Preserve
    };

    let summary = ClipExporter::new()
        .export_file(audio_path, clip, dest, layout)
        .await
        .context("Failed to export clip")?;

    println!(
        "{} Wrote {:.1}s ({} Hz, {} ch) to {}",
        style("✓").green().bold(),
        summary.duration,
        summary.sample_rate,
        summary.channels,
        summary.path.display()
    );
    if summary.truncated {
        println!(
            "  {}",
            style("The audio ended before the clip did; the file is shorter").yellow()
        );
    }
    Ok(())
}

/// `config init|show|path`
pub fn config(workspace: &Workspace, matches: &ArgMatches) -> Result<()> {
    let manager = &workspace.manager;
    match matches.subcommand() {
        Some(("init", _)) => {
            if manager.initialize().context("Failed to write config file")? {
                println!(
                    "{} Created {}",
                    style("✓").green().bold(),
                    manager.config_path().display()
                );
            } else {
                println!("Config already exists at {}", manager.config_path().display());
            }
        }
        Some(("show", _)) => {
            let text = toml::to_string_pretty(workspace.config())
                .context("Failed to serialize configuration")?;
            print!("{}", text);
        }
        Some(("path", _)) => {
            println!("Config:  {}", manager.config_path().display());
            println!("Session: {}", manager.session_path(workspace.config()).display());
            println!("Library: {}", manager.library_path(workspace.config()).display());
        }
        _ => bail!("Unknown config command"),
    }
    Ok(())
}

fn book_key(matches: &ArgMatches) -> Result<BookKey> {
    matches
        .get_one::<String>("key")
        .map(|k| BookKey::new(k.as_str()))
        .ok_or_else(|| anyhow!("Book key is required"))
}

fn find_clip(snapshot: &SessionSnapshot, key: &BookKey, id: EntryId) -> Result<Clip> {
    let session = snapshot
        .book(key)
        .ok_or_else(|| anyhow!("No saved session for {}", key))?;
    session
        .clips
        .iter()
        .find(|c| c.id == id)
        .cloned()
        .ok_or_else(|| anyhow!("{} has no clip with id {}", key, id))
}

fn default_export_path(id: EntryId) -> PathBuf {
    PathBuf::from(format!("clip-{}.wav", id))
}

fn render_book_summary(book: &BookRecord, snapshot: &SessionSnapshot) -> String {
    let mut out = format!("\n{}\n  by {}", style(&book.title).bold(), book.author);
    if book.narrator != "Unknown Narrator" {
        out.push_str(&format!(", read by {}", book.narrator));
    }
    out.push_str(&format!(
        "\n  Key: {} | Chapters: {} | Size: {}",
        book.key,
        book.chapters.len(),
        format_size(book.size_bytes)
    ));
    if let Some(genre) = &book.genre {
        out.push_str(&format!(" | {}", genre));
    }

    if let Some(session) = snapshot.book(&book.key) {
        out.push_str(&format!(
            "\n  Resume at {} | {} bookmarks | {} clips",
            format_time(session.current_time),
            session.bookmarks.len(),
            session.clips.len()
        ));
    }
    if let Some(stats) = snapshot.stats.books.get(&book.key) {
        out.push_str(&format!(" | Length {}", format_time(stats.duration)));
    }
    out
}

fn render_clip(clip: &Clip) -> String {
    format!(
        "  [{}] {}  {:.0}s  chapter {}  created {}",
        clip.id,
        clip.title,
        clip.duration,
        clip.chapter + 1,
        clip.created_at
    )
}

fn render_report(snapshot: &SessionSnapshot, today: NaiveDate, days: u32) -> String {
    let stats = &snapshot.stats;
    let recent = stats.recent_days(today, days);
    let period: u64 = recent.iter().map(|(_, secs)| secs).sum();

    let mut out = String::new();
    for (day, seconds) in &recent {
        out.push_str(&format!(
            "  {}  {:>4} min\n",
            day.format("%Y-%m-%d"),
            seconds / 60
        ));
    }
    out.push_str(&format!(
        "\nLast {} days: {}\n",
        days,
        format_duration(period)
    ));
    out.push_str(&format!(
        "All time: {} over {} days\n",
        format_duration(stats.total_seconds()),
        stats.active_days()
    ));
    out
}

fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
