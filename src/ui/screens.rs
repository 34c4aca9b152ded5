use crate::models::{PlaylistItem, Profile};

/// Clamp `selected + offset` into `0..len`.
fn offset_selection(selected: usize, offset: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let moved = selected as isize + offset;
    moved.clamp(0, len as isize - 1) as usize
}

/// Cursor over the library list. The songs themselves are read from the
/// repository at draw time so the view never holds a stale copy.
#[derive(Default)]
pub(crate) struct LibraryScreen {
    pub(crate) selected: usize,
}

impl LibraryScreen {
    pub(crate) fn move_selection(&mut self, offset: isize, len: usize) {
        self.selected = offset_selection(self.selected, offset, len);
    }

    pub(crate) fn select_last(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
    }

    pub(crate) fn ensure_in_bounds(&mut self, len: usize) {
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}

/// The active profile's playlist.
pub(crate) struct PlaylistScreen {
    pub(crate) profile: Profile,
    pub(crate) items: Vec<PlaylistItem>,
    pub(crate) selected: usize,
}

impl PlaylistScreen {
    pub(crate) fn new(profile: Profile, items: Vec<PlaylistItem>) -> Self {
        Self {
            profile,
            items,
            selected: 0,
        }
    }

    pub(crate) fn current_item(&self) -> Option<&PlaylistItem> {
        self.items.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = offset_selection(self.selected, offset, self.items.len());
    }

    pub(crate) fn set_items(&mut self, items: Vec<PlaylistItem>) {
        self.items = items;
        if self.selected >= self.items.len() {
            self.selected = self.items.len().saturating_sub(1);
        }
    }

    pub(crate) fn dangling_count(&self) -> usize {
        self.items.iter().filter(|item| !item.in_library).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_is_clamped() {
        let mut screen = LibraryScreen::default();
        screen.move_selection(5, 3);
        assert_eq!(screen.selected, 2);
        screen.move_selection(-10, 3);
        assert_eq!(screen.selected, 0);
        screen.move_selection(1, 0);
        assert_eq!(screen.selected, 0);
    }

    #[test]
    fn bounds_follow_shrinking_list() {
        let mut screen = LibraryScreen { selected: 4 };
        screen.ensure_in_bounds(2);
        assert_eq!(screen.selected, 1);
    }
}
