//! Line codec for the library text file.
//!
//! Each entry is written as `name<TAB>play_count`. Reading also accepts a bare
//! `name` line (count 0), which is how older library files were written.

use std::io::{self, Write};

use crate::models::SongEntry;

pub(crate) const DELIMITER: char = '\t';

/// Check that a name can be stored and read back unchanged.
pub(crate) fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("song name must not be blank");
    }
    if name.contains(DELIMITER) {
        return Err("song name must not contain a tab");
    }
    if name.contains(['\n', '\r']) {
        return Err("song name must not contain a line break");
    }
    Ok(())
}

pub(crate) fn write_entry<W: Write>(out: &mut W, entry: &SongEntry) -> io::Result<()> {
    writeln!(out, "{}{DELIMITER}{}", entry.name, entry.play_count)
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ParsedLine {
    Blank,
    Entry(SongEntry),
}

/// Decode one raw line (without its `\n`). A trailing `\r` is tolerated so
/// files edited on Windows still load.
pub(crate) fn parse_line(raw: &[u8]) -> Result<ParsedLine, String> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    let text = std::str::from_utf8(raw).map_err(|_| "line is not valid UTF-8".to_string())?;

    if text.trim().is_empty() {
        return Ok(ParsedLine::Blank);
    }

    let (name, play_count) = match text.split_once(DELIMITER) {
        None => (text, 0),
        Some((name, count)) => {
            let count = count
                .parse::<u64>()
                .map_err(|_| format!("invalid play count {count:?}"))?;
            (name, count)
        }
    };

    validate_name(name).map_err(str::to_string)?;

    Ok(ParsedLine::Entry(SongEntry {
        name: name.to_string(),
        play_count,
    }))
}
