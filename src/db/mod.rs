//! SQLite persistence for listener profiles and their playlists.

mod connection;
mod playlists;
mod profiles;

pub use connection::{ensure_schema, init_schema};
pub use playlists::{append_to_playlist, fetch_playlist, remove_playlist_entry};
pub use profiles::{create_profile, delete_profile, fetch_profiles, find_profile};

#[cfg(test)]
pub(crate) fn in_memory() -> rusqlite::Connection {
    let conn = rusqlite::Connection::open_in_memory().expect("in-memory database");
    init_schema(&conn).expect("schema");
    conn
}
