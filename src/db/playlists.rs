use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection};

use crate::models::PlaylistEntry;

/// A profile's playlist in the order songs were appended.
pub fn fetch_playlist(conn: &Connection, profile_id: i64) -> Result<Vec<PlaylistEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, song FROM playlist_entries
             WHERE profile_id = ?1
             ORDER BY id",
        )
        .context("failed to prepare playlist query")?;

    let entries = stmt
        .query_map([profile_id], |row| {
            Ok(PlaylistEntry {
                id: row.get(0)?,
                song: row.get(1)?,
            })
        })
        .context("failed to iterate playlist")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect playlist")?;

    Ok(entries)
}

/// Append a song to the end of a playlist. No check against the library is
/// made here; `Repository` owns that rule.
pub fn append_to_playlist(conn: &Connection, profile_id: i64, song: &str) -> Result<PlaylistEntry> {
    conn.execute(
        "INSERT INTO playlist_entries (profile_id, song) VALUES (?1, ?2)",
        params![profile_id, song],
    )
    .context("failed to append to playlist")?;

    Ok(PlaylistEntry {
        id: conn.last_insert_rowid(),
        song: song.to_string(),
    })
}

pub fn remove_playlist_entry(conn: &Connection, profile_id: i64, entry_id: i64) -> Result<()> {
    let deleted = conn
        .execute(
            "DELETE FROM playlist_entries WHERE profile_id = ?1 AND id = ?2",
            params![profile_id, entry_id],
        )
        .context("failed to remove playlist entry")?;

    if deleted == 0 {
        Err(anyhow!("Song is not in this playlist"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_profile, delete_profile, in_memory};

    #[test]
    fn playlist_keeps_append_order_and_duplicates() {
        let conn = in_memory();
        let ana = create_profile(&conn, "ana").unwrap();
        for song in ["B", "A", "B"] {
            append_to_playlist(&conn, ana.id, song).unwrap();
        }
        let songs: Vec<String> = fetch_playlist(&conn, ana.id)
            .unwrap()
            .into_iter()
            .map(|e| e.song)
            .collect();
        assert_eq!(songs, vec!["B", "A", "B"]);
    }

    #[test]
    fn remove_only_touches_own_playlist() {
        let conn = in_memory();
        let ana = create_profile(&conn, "ana").unwrap();
        let bob = create_profile(&conn, "bob").unwrap();
        let entry = append_to_playlist(&conn, ana.id, "Song").unwrap();

        assert!(remove_playlist_entry(&conn, bob.id, entry.id).is_err());
        remove_playlist_entry(&conn, ana.id, entry.id).unwrap();
        assert!(fetch_playlist(&conn, ana.id).unwrap().is_empty());
    }

    #[test]
    fn deleting_profile_cascades_to_playlist() {
        let conn = in_memory();
        let ana = create_profile(&conn, "ana").unwrap();
        append_to_playlist(&conn, ana.id, "Song").unwrap();
        delete_profile(&conn, ana.id).unwrap();

        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM playlist_entries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
