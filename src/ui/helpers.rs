use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::error::LibraryError;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Pick the message worth showing in the footer. Library errors already name
/// the file involved, so they win over their own I/O source.
pub(crate) fn surface_error(err: &Error) -> String {
    if let Some(library_err) = err.chain().find_map(|cause| cause.downcast_ref::<LibraryError>()) {
        return library_err.to_string();
    }
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Terminal column for a cursor `offset` characters into `inner`, kept inside
/// its right edge however long the text gets.
pub(crate) fn cursor_column(inner: Rect, offset: usize) -> u16 {
    let offset = u16::try_from(offset).unwrap_or(u16::MAX);
    inner
        .x
        .saturating_add(offset)
        .min(inner.right().saturating_sub(1))
}

/// `1 song`, `3 songs`.
pub(crate) fn plural(count: u64, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use anyhow::Context;

    use super::*;

    #[test]
    fn library_error_wins_over_context() {
        let err = Err::<(), _>(LibraryError::NotFound {
            path: PathBuf::from("missing.txt"),
        })
        .context("failed to load")
        .unwrap_err();
        assert_eq!(surface_error(&err), "library file not found: missing.txt");
    }

    #[test]
    fn other_errors_use_innermost_cause() {
        let err = Err::<(), _>(anyhow::anyhow!("disk on fire"))
            .context("outer")
            .unwrap_err();
        assert_eq!(surface_error(&err), "disk on fire");
    }

    #[test]
    fn cursor_stays_inside_the_box() {
        let inner = Rect::new(10, 2, 20, 1);
        assert_eq!(cursor_column(inner, 5), 15);
        assert_eq!(cursor_column(inner, 400), 29);
        assert_eq!(cursor_column(inner, usize::MAX), 29);

        let far_right = Rect::new(u16::MAX - 4, 0, 4, 1);
        assert_eq!(cursor_column(far_right, 70_000), u16::MAX - 1);
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "song"), "1 song");
        assert_eq!(plural(0, "song"), "0 songs");
    }
}
