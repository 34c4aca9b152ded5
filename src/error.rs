//! Error taxonomy for the library engine. Callers match on the variant to pick
//! a message; the engine itself never prints or logs.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    /// Rejected song name (empty, or containing a tab or line break).
    #[error("invalid song name {name:?}: {reason}")]
    InvalidArgument { name: String, reason: &'static str },

    /// The library file to load does not exist.
    #[error("library file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Malformed line in a library file, 1-based.
    #[error("{}:{line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

impl LibraryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LibraryError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
