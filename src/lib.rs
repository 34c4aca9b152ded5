//! Song library with play counts, per-profile playlists, and a terminal UI.
//!
//! The engine lives in [`library`] and has no dependencies on the rest of the
//! crate beyond its models and error type. [`repository::Repository`] pairs it
//! with the SQLite playlist store, and the `ui` and `cli` modules drive it.
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod library;
pub mod logging;
pub mod models;
pub mod repository;
pub mod ui;

pub use config::AppConfig;
pub use error::LibraryError;
pub use library::{Library, LoadMode, LoadOptions, LoadReport, MalformedLines, SkippedLine};
pub use models::{PlaylistEntry, PlaylistItem, Profile, SongEntry};
pub use repository::Repository;
pub use ui::{run_app, App};
