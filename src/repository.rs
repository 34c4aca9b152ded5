//! One typed entry point over the song library and the per-profile playlists.
//!
//! The library lives in memory and is persisted to its text file on request;
//! playlists are written straight to SQLite. The repository keeps the two
//! consistent: a playlist can only gain songs the library knows about.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::db;
use crate::error::LibraryError;
use crate::library::{Library, LoadOptions, LoadReport, SkippedLine};
use crate::models::{PlaylistEntry, PlaylistItem, Profile};

pub struct Repository {
    library: Library,
    conn: Connection,
    library_path: PathBuf,
    /// Malformed lines of the library file. Saving over that file would drop
    /// them, so it is refused until they are discarded.
    skipped_lines: Vec<SkippedLine>,
}

impl Repository {
    /// Open the playlist database and hydrate the library from its file. A
    /// missing library file starts an empty library.
    pub fn open(config: &AppConfig) -> Result<Self> {
        let conn = db::ensure_schema(&config.db_path)?;
        let mut repo = Self::new(conn, config.library_path.clone());
        repo.load_startup_library()?;
        Ok(repo)
    }

    pub fn new(conn: Connection, library_path: PathBuf) -> Self {
        Self {
            library: Library::new(),
            conn,
            library_path,
            skipped_lines: Vec::new(),
        }
    }

    fn load_startup_library(&mut self) -> Result<()> {
        match self.library.load(&self.library_path) {
            Ok(report) => {
                log_load(&self.library_path, &report);
                self.skipped_lines = report.skipped;
                Ok(())
            }
            Err(LibraryError::NotFound { path }) => {
                info!(path = %path.display(), "no library file yet, starting empty");
                Ok(())
            }
            Err(err) => Err(err).context("failed to load library at startup"),
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Default file used by [`Repository::save`].
    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    pub fn add_song(&mut self, name: &str) -> Result<bool> {
        let added = self.library.add(name)?;
        if added {
            debug!(song = name, "added song");
        }
        Ok(added)
    }

    pub fn search(&self, name: &str) -> bool {
        self.library.search(name)
    }

    pub fn play(&mut self, name: &str) -> Option<u64> {
        let count = self.library.play(name);
        match count {
            Some(count) => debug!(song = name, count, "recorded play"),
            None => debug!(song = name, "ignored play for unknown song"),
        }
        count
    }

    pub fn most_played(&self) -> Option<String> {
        self.library.most_played()
    }

    /// Lines of the library file that were skipped when it was read.
    pub fn skipped_lines(&self) -> &[SkippedLine] {
        &self.skipped_lines
    }

    /// Accept that the next save over the library file drops its skipped
    /// lines.
    pub fn discard_skipped_lines(&mut self) {
        if !self.skipped_lines.is_empty() {
            warn!(
                path = %self.library_path.display(),
                lines = self.skipped_lines.len(),
                "malformed lines will be dropped on save"
            );
        }
        self.skipped_lines.clear();
    }

    /// Save the library to its default file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&self.library_path)
    }

    /// Write the library to `path`. Refuses to overwrite the library file
    /// while it holds lines that were skipped on load.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if path == self.library_path && !self.skipped_lines.is_empty() {
            let count = self.skipped_lines.len();
            let noun = if count == 1 { "line" } else { "lines" };
            bail!(
                "{} has {count} malformed {noun} that saving would drop",
                path.display()
            );
        }
        self.library.save(path)?;
        info!(path = %path.display(), songs = self.library.len(), "saved library");
        Ok(())
    }

    pub fn load_from(&mut self, path: &Path, options: LoadOptions) -> Result<LoadReport> {
        let report = self.library.load_with(path, options)?;
        log_load(path, &report);
        if path == self.library_path {
            self.skipped_lines = report.skipped.clone();
        }
        Ok(report)
    }

    pub fn profiles(&self) -> Result<Vec<Profile>> {
        db::fetch_profiles(&self.conn)
    }

    pub fn find_profile(&self, name: &str) -> Result<Option<Profile>> {
        db::find_profile(&self.conn, name)
    }

    /// Return the named profile, creating it on first use.
    pub fn ensure_profile(&self, name: &str) -> Result<Profile> {
        let name = name.trim();
        if name.is_empty() {
            return Err(anyhow!("Profile name is required."));
        }
        if let Some(profile) = db::find_profile(&self.conn, name)? {
            return Ok(profile);
        }
        let profile = db::create_profile(&self.conn, name)?;
        info!(profile = name, "created profile");
        Ok(profile)
    }

    pub fn delete_profile(&self, profile: &Profile) -> Result<()> {
        db::delete_profile(&self.conn, profile.id)?;
        info!(profile = %profile.name, "deleted profile");
        Ok(())
    }

    /// The profile's playlist, each entry flagged with whether the library
    /// still holds its song.
    pub fn playlist(&self, profile: &Profile) -> Result<Vec<PlaylistItem>> {
        let entries = db::fetch_playlist(&self.conn, profile.id)?;
        Ok(entries
            .into_iter()
            .map(|entry| PlaylistItem {
                in_library: self.library.search(&entry.song),
                entry,
            })
            .collect())
    }

    /// Append a song the library already knows to a playlist.
    pub fn add_to_playlist(&self, profile: &Profile, song: &str) -> Result<PlaylistEntry> {
        if !self.library.search(song) {
            return Err(anyhow!("'{song}' is not in the library."));
        }
        let entry = db::append_to_playlist(&self.conn, profile.id, song)?;
        debug!(profile = %profile.name, song, "appended to playlist");
        Ok(entry)
    }

    /// Add a song to the library (if new) and append it to the playlist.
    pub fn add_song_for(&mut self, profile: &Profile, song: &str) -> Result<PlaylistEntry> {
        self.add_song(song)?;
        self.add_to_playlist(profile, song)
    }

    pub fn remove_from_playlist(&self, profile: &Profile, entry_id: i64) -> Result<()> {
        db::remove_playlist_entry(&self.conn, profile.id, entry_id)
    }

    /// Drop playlist entries whose song left the library. Returns how many
    /// were removed.
    pub fn prune_playlist(&self, profile: &Profile) -> Result<usize> {
        let mut removed = 0;
        for item in self.playlist(profile)? {
            if !item.in_library {
                db::remove_playlist_entry(&self.conn, profile.id, item.entry.id)?;
                removed += 1;
            }
        }
        if removed > 0 {
            info!(profile = %profile.name, removed, "pruned playlist");
        }
        Ok(removed)
    }
}

fn log_load(path: &Path, report: &LoadReport) {
    info!(
        path = %path.display(),
        loaded = report.loaded,
        duplicates = report.duplicates,
        "loaded library"
    );
    for skipped in &report.skipped {
        warn!(path = %path.display(), line = skipped.line, reason = %skipped.reason, "skipped malformed line");
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::library::LoadMode;

    fn repo_in(dir: &TempDir) -> Repository {
        Repository::new(db::in_memory(), dir.path().join("library.txt"))
    }

    #[test]
    fn playlist_rejects_unknown_songs() {
        let dir = TempDir::new().unwrap();
        let mut repo = repo_in(&dir);
        let ana = repo.ensure_profile("ana").unwrap();

        assert!(repo.add_to_playlist(&ana, "Ghost").is_err());
        repo.add_song("Ghost").unwrap();
        repo.add_to_playlist(&ana, "Ghost").unwrap();
        assert_eq!(repo.playlist(&ana).unwrap().len(), 1);
    }

    #[test]
    fn add_song_for_updates_library_and_playlist() {
        let dir = TempDir::new().unwrap();
        let mut repo = repo_in(&dir);
        let ana = repo.ensure_profile("ana").unwrap();

        repo.add_song_for(&ana, "Imagine").unwrap();
        assert!(repo.search("Imagine"));
        let songs: Vec<String> = repo
            .playlist(&ana)
            .unwrap()
            .into_iter()
            .map(|item| item.entry.song)
            .collect();
        assert_eq!(songs, vec!["Imagine"]);
    }

    #[test]
    fn ensure_profile_reuses_existing() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir);
        let first = repo.ensure_profile("ana").unwrap();
        let second = repo.ensure_profile(" ana ").unwrap();
        assert_eq!(first, second);
        assert!(repo.ensure_profile("   ").is_err());
    }

    #[test]
    fn deleting_profile_drops_its_playlist() {
        let dir = TempDir::new().unwrap();
        let mut repo = repo_in(&dir);
        let ana = repo.ensure_profile("ana").unwrap();
        repo.add_song_for(&ana, "Song").unwrap();

        repo.delete_profile(&ana).unwrap();
        assert!(repo.profiles().unwrap().is_empty());
        assert_eq!(repo.find_profile("ana").unwrap(), None);
        assert!(repo.playlist(&ana).unwrap().is_empty());
        assert!(repo.search("Song"));
    }

    #[test]
    fn replacing_load_marks_and_prunes_dangling_entries() {
        let dir = TempDir::new().unwrap();
        let other = dir.path().join("other.txt");
        fs::write(&other, "Kept\n").unwrap();

        let mut repo = repo_in(&dir);
        let ana = repo.ensure_profile("ana").unwrap();
        repo.add_song_for(&ana, "Kept").unwrap();
        repo.add_song_for(&ana, "Dropped").unwrap();

        repo.load_from(&other, LoadOptions::default()).unwrap();
        let flags: Vec<bool> = repo
            .playlist(&ana)
            .unwrap()
            .iter()
            .map(|item| item.in_library)
            .collect();
        assert_eq!(flags, vec![true, false]);

        assert_eq!(repo.prune_playlist(&ana).unwrap(), 1);
        assert_eq!(repo.playlist(&ana).unwrap().len(), 1);
    }

    #[test]
    fn merge_load_keeps_session_songs() {
        let dir = TempDir::new().unwrap();
        let other = dir.path().join("other.txt");
        fs::write(&other, "Imported\t2\n").unwrap();

        let mut repo = repo_in(&dir);
        repo.add_song("Session").unwrap();
        let options = LoadOptions {
            mode: LoadMode::Merge,
            ..LoadOptions::default()
        };
        repo.load_from(&other, options).unwrap();
        assert_eq!(repo.library().names(), vec!["Session", "Imported"]);
    }

    #[test]
    fn startup_tolerates_missing_library_file() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::in_dir(dir.path().to_path_buf(), None, None);
        let repo = Repository::open(&config).unwrap();
        assert!(repo.library().is_empty());
    }

    #[test]
    fn startup_keeps_malformed_lines_from_being_overwritten() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::in_dir(dir.path().to_path_buf(), None, None);
        let contents = "Keep\t1\nHand Edited\tlots\nOther\t0\n";
        fs::write(&config.library_path, contents).unwrap();

        let mut repo = Repository::open(&config).unwrap();
        assert_eq!(repo.library().names(), vec!["Keep", "Other"]);
        assert_eq!(repo.skipped_lines().len(), 1);
        assert_eq!(repo.skipped_lines()[0].line, 2);

        repo.add_song("New").unwrap();
        assert!(repo.save().is_err());
        assert_eq!(fs::read_to_string(&config.library_path).unwrap(), contents);

        let elsewhere = dir.path().join("copy.txt");
        repo.save_to(&elsewhere).unwrap();

        repo.discard_skipped_lines();
        repo.save().unwrap();
        assert_eq!(
            fs::read_to_string(&config.library_path).unwrap(),
            "Keep\t1\nOther\t0\nNew\t0\n"
        );
    }

    #[test]
    fn reloading_library_file_refreshes_skipped_lines() {
        let dir = TempDir::new().unwrap();
        let mut repo = repo_in(&dir);
        let path = repo.library_path().to_path_buf();
        fs::write(&path, "Fine\t1\nBad\t?\n").unwrap();

        repo.load_from(&path, LoadOptions::default()).unwrap();
        assert_eq!(repo.skipped_lines().len(), 1);

        fs::write(&path, "Fine\t1\n").unwrap();
        repo.load_from(&path, LoadOptions::default()).unwrap();
        assert!(repo.skipped_lines().is_empty());
        repo.save().unwrap();
    }

    #[test]
    fn startup_loads_saved_library() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::in_dir(dir.path().to_path_buf(), None, None);
        {
            let mut repo = Repository::open(&config).unwrap();
            repo.add_song("Wonderwall").unwrap();
            repo.play("Wonderwall");
            repo.save().unwrap();
        }
        let repo = Repository::open(&config).unwrap();
        assert_eq!(repo.library().play_count("Wonderwall"), Some(1));
        assert_eq!(repo.most_played().as_deref(), Some("Wonderwall"));
    }
}
