//! Runtime configuration: where the library file, playlist database and log
//! live. Command-line flags and `MUSIFY_*` variables override the defaults.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::BaseDirs;

use crate::cli::Args;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".musify";
const LIBRARY_FILE_NAME: &str = "library.txt";
const DB_FILE_NAME: &str = "playlists.sqlite";
const LOG_FILE_NAME: &str = "musify.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Library file read at startup and written by a plain save.
    pub library_path: PathBuf,
    pub db_path: PathBuf,
    pub log_path: PathBuf,
    /// Profile to select on startup, if any.
    pub profile: Option<String>,
}

impl AppConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        let data_dir = match &args.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };
        Ok(Self::in_dir(data_dir, args.library.clone(), args.profile.clone()))
    }

    /// Lay every file out under `data_dir`, unless a library path is given.
    pub fn in_dir(data_dir: PathBuf, library: Option<PathBuf>, profile: Option<String>) -> Self {
        Self {
            library_path: library.unwrap_or_else(|| data_dir.join(LIBRARY_FILE_NAME)),
            db_path: data_dir.join(DB_FILE_NAME),
            log_path: data_dir.join(LOG_FILE_NAME),
            data_dir,
            profile,
        }
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn files_default_into_data_dir() {
        let config = AppConfig::in_dir(PathBuf::from("/tmp/m"), None, None);
        assert_eq!(config.library_path, Path::new("/tmp/m/library.txt"));
        assert_eq!(config.db_path, Path::new("/tmp/m/playlists.sqlite"));
        assert_eq!(config.log_path, Path::new("/tmp/m/musify.log"));
    }

    #[test]
    fn explicit_library_path_wins() {
        let config = AppConfig::in_dir(
            PathBuf::from("/tmp/m"),
            Some(PathBuf::from("songs.txt")),
            Some("ana".into()),
        );
        assert_eq!(config.library_path, Path::new("songs.txt"));
        assert_eq!(config.profile.as_deref(), Some("ana"));
    }
}
