use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, Error as SqlError, ErrorCode, OptionalExtension};

use crate::models::Profile;

/// Every profile, alphabetical by name.
pub fn fetch_profiles(conn: &Connection) -> Result<Vec<Profile>> {
    let mut stmt = conn
        .prepare("SELECT id, name FROM profiles ORDER BY name COLLATE NOCASE, name")
        .context("failed to prepare profile query")?;

    let profiles = stmt
        .query_map([], |row| {
            Ok(Profile {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .context("failed to load profiles")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect profiles")?;

    Ok(profiles)
}

/// Look a profile up by its exact name.
pub fn find_profile(conn: &Connection, name: &str) -> Result<Option<Profile>> {
    conn.query_row(
        "SELECT id, name FROM profiles WHERE name = ?1",
        params![name],
        |row| {
            Ok(Profile {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    )
    .optional()
    .context("failed to look up profile")
}

pub fn create_profile(conn: &Connection, name: &str) -> Result<Profile> {
    conn.execute("INSERT INTO profiles (name) VALUES (?1)", params![name])
        .map_err(|err| map_unique_constraint(err, name))
        .context("failed to insert profile")?;

    Ok(Profile {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
    })
}

/// Remove a profile. Its playlist entries go with it through the cascade.
pub fn delete_profile(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM profiles WHERE id = ?1", params![id])
        .context("failed to delete profile")?;

    if deleted == 0 {
        Err(anyhow!("Profile not found"))
    } else {
        Ok(())
    }
}

fn map_unique_constraint(err: SqlError, name: &str) -> anyhow::Error {
    if matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::ConstraintViolation)
    ) {
        anyhow!("Profile {name:?} already exists.")
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::in_memory;

    #[test]
    fn create_and_find_profile() {
        let conn = in_memory();
        let created = create_profile(&conn, "ana").unwrap();
        let found = find_profile(&conn, "ana").unwrap();
        assert_eq!(found, Some(created));
        assert_eq!(find_profile(&conn, "Ana").unwrap(), None);
    }

    #[test]
    fn duplicate_profile_is_rejected() {
        let conn = in_memory();
        create_profile(&conn, "ana").unwrap();
        let err = create_profile(&conn, "ana").unwrap_err();
        assert!(format!("{err:#}").contains("already exists"));
    }

    #[test]
    fn profiles_sorted_case_insensitively() {
        let conn = in_memory();
        for name in ["zoe", "Bob", "amy"] {
            create_profile(&conn, name).unwrap();
        }
        let names: Vec<String> = fetch_profiles(&conn)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["amy", "Bob", "zoe"]);
    }

    #[test]
    fn delete_missing_profile_errors() {
        let conn = in_memory();
        assert!(delete_profile(&conn, 42).is_err());
    }
}
