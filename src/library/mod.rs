//! In-memory song library with play counts, plus its text-file persistence.
//!
//! The library is an explicit value owned by whoever drives it (the
//! repository, the CLI, tests). It performs I/O only inside `save` and the
//! `load` family, and it never logs: failures come back as [`LibraryError`].

mod format;

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{LibraryError, Result};
use crate::models::SongEntry;

use format::ParsedLine;

/// How a loaded file combines with the songs already in memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadMode {
    /// Discard the current library and keep only what the file holds.
    #[default]
    Replace,
    /// Keep current songs; append unknown names in file order and keep the
    /// larger play count for names present in both.
    Merge,
}

/// What to do with a line that cannot be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedLines {
    /// Skip it and record it in the [`LoadReport`].
    #[default]
    Skip,
    /// Fail the whole load with [`LibraryError::Parse`].
    Abort,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub mode: LoadMode,
    pub malformed: MalformedLines,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line: usize,
    pub reason: String,
}

/// Summary of a successful load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Distinct songs read from the file.
    pub loaded: usize,
    /// Lines naming a song already seen earlier in the same file.
    pub duplicates: usize,
    pub skipped: Vec<SkippedLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Library {
    entries: Vec<SongEntry>,
    index: HashMap<String, usize>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry, leaving an empty library.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[SongEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &SongEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    /// Add a song by exact name. Returns `false` when the name was already
    /// tracked, in which case nothing changes.
    ///
    /// The name is stored as given; trimming is the caller's job.
    pub fn add(&mut self, name: &str) -> Result<bool> {
        format::validate_name(name).map_err(|reason| LibraryError::InvalidArgument {
            name: name.to_string(),
            reason,
        })?;
        Ok(self.insert(SongEntry::new(name)))
    }

    pub fn search(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn play_count(&self, name: &str) -> Option<u64> {
        self.index.get(name).map(|&i| self.entries[i].play_count)
    }

    /// Record one play and return the new count. Unknown names are ignored
    /// and yield `None`; playing never adds a song.
    pub fn play(&mut self, name: &str) -> Option<u64> {
        let &i = self.index.get(name)?;
        let entry = &mut self.entries[i];
        entry.play_count = entry.play_count.saturating_add(1);
        Some(entry.play_count)
    }

    /// Name of the song with the highest play count. Ties go to the song
    /// added first, so an untouched library reports its first song.
    pub fn most_played(&self) -> Option<String> {
        let mut best: Option<&SongEntry> = None;
        for entry in &self.entries {
            match best {
                Some(current) if entry.play_count <= current.play_count => {}
                _ => best = Some(entry),
            }
        }
        best.map(|e| e.name.clone())
    }

    /// Write every entry to `path`, one per line in insertion order.
    ///
    /// The data goes to a temporary file beside `path` which is synced and
    /// then renamed over it, so readers see either the old file or the
    /// complete new one.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut staged = NamedTempFile::new_in(dir).map_err(|err| LibraryError::io(path, err))?;
        self.write_entries(&mut staged)
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|err| LibraryError::io(path, err))?;
        staged
            .persist(path)
            .map_err(|err| LibraryError::io(path, err.error))?;
        Ok(())
    }

    fn write_entries<W: Write>(&self, out: W) -> io::Result<()> {
        let mut writer = BufWriter::new(out);
        for entry in &self.entries {
            format::write_entry(&mut writer, entry)?;
        }
        writer.flush()
    }

    /// Replace the library with the contents of `path`, skipping malformed
    /// lines. See [`Library::load_with`].
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<LoadReport> {
        self.load_with(path, LoadOptions::default())
    }

    /// Read `path` and combine it with the current library per `options`.
    ///
    /// The whole file is decoded before anything changes; on error the
    /// library is left exactly as it was.
    pub fn load_with(&mut self, path: impl AsRef<Path>, options: LoadOptions) -> Result<LoadReport> {
        let path = path.as_ref();
        let (staged, report) = read_library_file(path, options.malformed)?;

        match options.mode {
            LoadMode::Replace => *self = staged,
            LoadMode::Merge => self.merge(staged),
        }
        Ok(report)
    }

    fn merge(&mut self, other: Library) {
        for entry in other.entries {
            match self.index.get(&entry.name) {
                Some(&i) => {
                    let existing = &mut self.entries[i];
                    existing.play_count = existing.play_count.max(entry.play_count);
                }
                None => {
                    self.insert(entry);
                }
            }
        }
    }

    fn insert(&mut self, entry: SongEntry) -> bool {
        if self.index.contains_key(&entry.name) {
            return false;
        }
        self.index.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }
}

fn read_library_file(path: &Path, malformed: MalformedLines) -> Result<(Library, LoadReport)> {
    let file = File::open(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => LibraryError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LibraryError::io(path, err),
    })?;

    let mut staged = Library::new();
    let mut report = LoadReport::default();

    for (idx, raw) in BufReader::new(file).split(b'\n').enumerate() {
        let raw = raw.map_err(|err| LibraryError::io(path, err))?;
        let line = idx + 1;
        match format::parse_line(&raw) {
            Ok(ParsedLine::Blank) => {}
            Ok(ParsedLine::Entry(entry)) => {
                if staged.insert(entry) {
                    report.loaded += 1;
                } else {
                    report.duplicates += 1;
                }
            }
            Err(reason) => match malformed {
                MalformedLines::Skip => report.skipped.push(SkippedLine { line, reason }),
                MalformedLines::Abort => {
                    return Err(LibraryError::Parse {
                        path: path.to_path_buf(),
                        line,
                        reason,
                    })
                }
            },
        }
    }

    Ok((staged, report))
}
