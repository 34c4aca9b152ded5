use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Open (or create) the playlist database at `path` and run lazy migrations.
/// The parent directory is created on first use.
pub fn ensure_schema(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let conn = Connection::open(path).context("failed to open SQLite database")?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Create the tables on an already open connection. Split out so tests can
/// run against `Connection::open_in_memory`.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign keys")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )",
        [],
    )
    .context("failed to create profiles table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS playlist_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            profile_id INTEGER NOT NULL,
            song TEXT NOT NULL,
            FOREIGN KEY(profile_id) REFERENCES profiles(id) ON DELETE CASCADE
        )",
        [],
    )
    .context("failed to create playlist_entries table")?;

    Ok(())
}
