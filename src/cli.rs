//! Command-line surface. Without a subcommand the terminal UI starts; each
//! subcommand runs one library operation against the library file and saves
//! it back when something changed.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::library::{LoadMode, LoadOptions, MalformedLines};
use crate::repository::Repository;

#[derive(Parser, Debug)]
#[command(name = "musify")]
#[command(about = "Keep a song library and count how often each song is played")]
#[command(version)]
pub struct Args {
    /// Directory holding the library file, playlist database and log
    #[arg(long, env = "MUSIFY_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Library file to read at startup and write on save
    #[arg(short, long, env = "MUSIFY_LIBRARY")]
    pub library: Option<PathBuf>,

    /// Profile whose playlist the UI opens with
    #[arg(short, long, env = "MUSIFY_PROFILE")]
    pub profile: Option<String>,

    /// Save over the library file even when malformed lines in it would be
    /// dropped
    #[arg(long, global = true)]
    pub force: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print every song with its play count
    List,
    /// Add a song to the library
    Add { name: String },
    /// Check whether a song is in the library (exact name)
    Search { name: String },
    /// Record one play of a song
    Play { name: String },
    /// Print the most played song
    Top,
    /// Read songs from another library file
    Import {
        path: PathBuf,
        /// Keep current songs instead of replacing them
        #[arg(long)]
        merge: bool,
        /// Fail on the first malformed line instead of skipping it
        #[arg(long)]
        strict: bool,
    },
    /// Write the library to another file
    Export { path: PathBuf },
}

impl Command {
    /// Whether the command may save over the library file.
    fn writes_library(&self) -> bool {
        matches!(
            self,
            Command::Add { .. } | Command::Play { .. } | Command::Import { .. }
        )
    }
}

/// Run one subcommand, writing human-readable output to `out`.
///
/// Commands that would save over a library file holding malformed lines are
/// refused before they run; see [`Repository::discard_skipped_lines`].
pub fn run_command<W: Write>(repo: &mut Repository, command: Command, out: &mut W) -> Result<()> {
    let held = repo.skipped_lines().len();
    if held > 0 {
        let path = repo.library_path().display().to_string();
        for skipped in repo.skipped_lines() {
            writeln!(out, "warning: {path}:{}: {}", skipped.line, skipped.reason)?;
        }
        if command.writes_library() {
            let noun = if held == 1 { "line" } else { "lines" };
            bail!("not saving {path}: {held} malformed {noun} would be lost; fix the file or pass --force");
        }
    }

    let changed = match command {
        Command::List => {
            if repo.library().is_empty() {
                writeln!(out, "Library is empty.")?;
            }
            for (idx, entry) in repo.library().iter().enumerate() {
                writeln!(out, "{}. {}", idx + 1, entry.display_line())?;
            }
            false
        }
        Command::Add { name } => {
            let name = name.trim();
            if repo.add_song(name)? {
                writeln!(out, "Added '{name}' to library.")?;
                true
            } else {
                writeln!(out, "'{name}' is already in the library.")?;
                false
            }
        }
        Command::Search { name } => {
            let name = name.trim();
            if repo.search(name) {
                writeln!(out, "'{name}' exists in library.")?;
            } else {
                writeln!(out, "'{name}' not found in library.")?;
            }
            false
        }
        Command::Play { name } => {
            let name = name.trim();
            match repo.play(name) {
                Some(count) => {
                    writeln!(out, "Played '{name}' ({count} total).")?;
                    true
                }
                None => {
                    writeln!(out, "'{name}' not found in library.")?;
                    false
                }
            }
        }
        Command::Top => {
            let top = repo.most_played();
            writeln!(out, "Most Played: {}", top.as_deref().unwrap_or("-"))?;
            false
        }
        Command::Import {
            path,
            merge,
            strict,
        } => {
            let options = LoadOptions {
                mode: if merge { LoadMode::Merge } else { LoadMode::Replace },
                malformed: if strict {
                    MalformedLines::Abort
                } else {
                    MalformedLines::Skip
                },
            };
            let report = repo
                .load_from(&path, options)
                .with_context(|| format!("failed to import {}", path.display()))?;
            writeln!(out, "Loaded {} songs from {}.", report.loaded, path.display())?;
            for skipped in &report.skipped {
                writeln!(out, "  skipped line {}: {}", skipped.line, skipped.reason)?;
            }
            true
        }
        Command::Export { path } => {
            repo.save_to(&path)?;
            writeln!(out, "Library saved to {}.", path.display())?;
            false
        }
    };

    if changed {
        repo.save()?;
    }
    Ok(())
}
