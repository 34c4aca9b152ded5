//! Domain models shared by the engine, the playlist store and the front ends.
//! These stay plain data holders; behavior lives in `library` and `repository`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
/// One tracked song. The name is the identity key and is matched exactly,
/// case included.
pub struct SongEntry {
    pub name: String,
    /// Number of recorded plays. Starts at zero when the song is added.
    pub play_count: u64,
}

impl SongEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            play_count: 0,
        }
    }

    /// `Name (3 plays)` style label used by list views and the CLI.
    pub fn display_line(&self) -> String {
        match self.play_count {
            1 => format!("{} (1 play)", self.name),
            n => format!("{} ({n} plays)", self.name),
        }
    }
}

impl fmt::Display for SongEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A named listener who owns one playlist. Profiles carry no credentials.
pub struct Profile {
    /// Primary key from the SQLite store.
    pub id: i64,
    pub name: String,
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A row of a profile's playlist. The same song may appear more than once, so
/// entries are addressed by `id` rather than by song name.
pub struct PlaylistEntry {
    pub id: i64,
    pub song: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Playlist entry annotated with whether its song is still in the library.
/// Replacing the library from a file can leave entries behind.
pub struct PlaylistItem {
    pub entry: PlaylistEntry,
    pub in_library: bool,
}
