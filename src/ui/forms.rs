use std::path::PathBuf;

use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

/// What a single-line prompt is collecting.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum PromptKind {
    AddSong,
    Search,
    Play,
    SaveAs,
    LoadFrom,
    Profile,
    AddToPlaylist,
}

impl PromptKind {
    pub(crate) fn title(self) -> &'static str {
        match self {
            PromptKind::AddSong => "Add Song",
            PromptKind::Search => "Search Library",
            PromptKind::Play => "Play Song",
            PromptKind::SaveAs => "Save Library As",
            PromptKind::LoadFrom => "Load Library",
            PromptKind::Profile => "Switch Profile",
            PromptKind::AddToPlaylist => "Add Song to Playlist",
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            PromptKind::SaveAs | PromptKind::LoadFrom => "File",
            PromptKind::Profile => "Name",
            _ => "Song",
        }
    }

    fn missing_message(self) -> &'static str {
        match self {
            PromptKind::SaveAs | PromptKind::LoadFrom => "Enter a file path.",
            PromptKind::Profile => "Enter a profile name.",
            _ => "Enter a song name.",
        }
    }
}

/// Single-field text prompt shown as a modal.
#[derive(Clone, Debug)]
pub(crate) struct PromptForm {
    pub(crate) kind: PromptKind,
    pub(crate) value: String,
    pub(crate) error: Option<String>,
}

impl PromptForm {
    pub(crate) fn new(kind: PromptKind) -> Self {
        Self {
            kind,
            value: String::new(),
            error: None,
        }
    }

    pub(crate) fn with_value(kind: PromptKind, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::new(kind)
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.value.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.value.pop();
    }

    /// The trimmed input, or an error when nothing was typed.
    pub(crate) fn parse_input(&self) -> Result<String> {
        let value = self.value.trim();
        if value.is_empty() {
            return Err(anyhow!(self.kind.missing_message()));
        }
        Ok(value.to_string())
    }

    pub(crate) fn prefix(&self) -> String {
        format!("{}: ", self.kind.label())
    }

    pub(crate) fn build_line(&self) -> Line<'static> {
        Line::from(vec![
            Span::raw(self.prefix()),
            Span::styled(self.value.clone(), Style::default().fg(Color::Yellow)),
        ])
    }

    pub(crate) fn value_len(&self) -> usize {
        self.value.chars().count()
    }
}

/// Pending load that would discard songs currently in memory.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmLoad {
    pub(crate) path: PathBuf,
    pub(crate) current_songs: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_input_trims_and_requires_text() {
        let mut form = PromptForm::new(PromptKind::AddSong);
        assert!(form.parse_input().is_err());
        for ch in "  Hey Jude ".chars() {
            form.push_char(ch);
        }
        assert_eq!(form.parse_input().unwrap(), "Hey Jude");
    }

    #[test]
    fn control_characters_are_ignored() {
        let mut form = PromptForm::new(PromptKind::Search);
        assert!(!form.push_char('\t'));
        assert!(form.push_char('a'));
        form.backspace();
        assert!(form.value.is_empty());
    }
}
