use std::mem;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::warn;

use crate::library::{LoadMode, LoadOptions};
use crate::models::Profile;
use crate::repository::Repository;

use super::forms::{ConfirmLoad, PromptForm, PromptKind};
use super::helpers::{centered_rect, cursor_column, plural, surface_error};
use super::screens::{LibraryScreen, PlaylistScreen};

const HEADER_HEIGHT: u16 = 4;
/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
const PAGE: isize = 5;

enum Screen {
    Library,
    Playlist(PlaylistScreen),
}

/// Fine-grained modes layered over the current screen.
enum Mode {
    Normal,
    Prompt(PromptForm),
    ConfirmLoad(ConfirmLoad),
    ConfirmQuit,
    /// Saving would drop lines of the library file that failed to parse.
    ConfirmOverwrite { then_quit: bool },
}

struct StatusMessage {
    text: String,
    kind: StatusKind,
}

enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    repo: Repository,
    library_view: LibraryScreen,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
    profile: Option<Profile>,
    /// The in-memory library differs from the default library file.
    dirty: bool,
}

impl App {
    pub fn new(repo: Repository, profile: Option<Profile>) -> Self {
        let mut app = Self {
            repo,
            library_view: LibraryScreen::default(),
            screen: Screen::Library,
            mode: Mode::Normal,
            status: None,
            profile,
            dirty: false,
        };
        let skipped = app.repo.skipped_lines().len();
        if skipped > 0 {
            let message = format!(
                "Skipped {} in {}.",
                plural(skipped as u64, "malformed line"),
                app.repo.library_path().display()
            );
            app.set_status(message, StatusKind::Error);
        }
        app
    }

    /// Feed one key press through the current mode. Returns `true` when the
    /// app should exit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal if matches!(self.screen, Screen::Library) => {
                self.handle_library_key(code, &mut exit)?
            }
            Mode::Normal => self.handle_playlist_key(code, &mut exit)?,
            Mode::Prompt(form) => self.handle_prompt(code, form)?,
            Mode::ConfirmLoad(confirm) => self.handle_confirm_load(code, confirm)?,
            Mode::ConfirmQuit => self.handle_confirm_quit(code, &mut exit)?,
            Mode::ConfirmOverwrite { then_quit } => {
                self.handle_confirm_overwrite(code, then_quit, &mut exit)
            }
        };

        Ok(exit)
    }

    fn handle_library_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let len = self.repo.library().len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(self.request_quit(exit)),
            KeyCode::Up => self.library_view.move_selection(-1, len),
            KeyCode::Down => self.library_view.move_selection(1, len),
            KeyCode::PageUp => self.library_view.move_selection(-PAGE, len),
            KeyCode::PageDown => self.library_view.move_selection(PAGE, len),
            KeyCode::Home => self.library_view.selected = 0,
            KeyCode::End => self.library_view.select_last(len),
            KeyCode::Char('+') | KeyCode::Char('a') => {
                self.clear_status();
                return Ok(Mode::Prompt(PromptForm::new(PromptKind::AddSong)));
            }
            KeyCode::Char('/') => {
                self.clear_status();
                return Ok(Mode::Prompt(PromptForm::new(PromptKind::Search)));
            }
            KeyCode::Char('P') => {
                self.clear_status();
                return Ok(Mode::Prompt(PromptForm::new(PromptKind::Play)));
            }
            KeyCode::Enter | KeyCode::Char('p') => match self.selected_song() {
                Some(name) => self.play_song(&name),
                None => self.set_status("No song selected.", StatusKind::Error),
            },
            KeyCode::Char('s') => return Ok(self.request_save(false, exit)),
            KeyCode::Char('S') => {
                self.clear_status();
                let current = self.repo.library_path().display().to_string();
                return Ok(Mode::Prompt(PromptForm::with_value(PromptKind::SaveAs, current)));
            }
            KeyCode::Char('l') => {
                self.clear_status();
                let current = self.repo.library_path().display().to_string();
                return Ok(Mode::Prompt(PromptForm::with_value(PromptKind::LoadFrom, current)));
            }
            KeyCode::Char('u') => {
                self.clear_status();
                let current = self.profile.as_ref().map(|p| p.name.clone()).unwrap_or_default();
                return Ok(Mode::Prompt(PromptForm::with_value(PromptKind::Profile, current)));
            }
            KeyCode::Char('y') => {
                let result = self.add_selected_to_playlist();
                self.report(result);
            }
            KeyCode::Tab => {
                let result = self.open_playlist();
                self.report(result);
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_playlist_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') => return Ok(self.request_quit(exit)),
            KeyCode::Esc | KeyCode::Tab => {
                self.clear_status();
                self.screen = Screen::Library;
            }
            KeyCode::Up => self.with_playlist(|p| p.move_selection(-1)),
            KeyCode::Down => self.with_playlist(|p| p.move_selection(1)),
            KeyCode::PageUp => self.with_playlist(|p| p.move_selection(-PAGE)),
            KeyCode::PageDown => self.with_playlist(|p| p.move_selection(PAGE)),
            KeyCode::Enter | KeyCode::Char('p') => {
                let song = match &self.screen {
                    Screen::Playlist(p) => p.current_item().map(|item| item.entry.song.clone()),
                    Screen::Library => None,
                };
                match song {
                    Some(song) => self.play_song(&song),
                    None => self.set_status("Playlist is empty.", StatusKind::Error),
                }
            }
            KeyCode::Char('+') | KeyCode::Char('a') => {
                self.clear_status();
                return Ok(Mode::Prompt(PromptForm::new(PromptKind::AddToPlaylist)));
            }
            KeyCode::Char('-') | KeyCode::Delete => {
                let result = self.remove_selected_entry();
                self.report(result);
            }
            KeyCode::Char('x') => {
                let result = self.prune_playlist();
                self.report(result);
            }
            KeyCode::Char('u') => {
                self.clear_status();
                let current = self.profile.as_ref().map(|p| p.name.clone()).unwrap_or_default();
                return Ok(Mode::Prompt(PromptForm::with_value(PromptKind::Profile, current)));
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_prompt(&mut self, code: KeyCode, mut form: PromptForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status(format!("{} cancelled.", form.kind.title()), StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Backspace => {
                form.backspace();
                Ok(Mode::Prompt(form))
            }
            KeyCode::Enter => match self.submit_prompt(&form) {
                Ok(next) => Ok(next),
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                    Ok(Mode::Prompt(form))
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
                Ok(Mode::Prompt(form))
            }
            _ => Ok(Mode::Prompt(form)),
        }
    }

    fn submit_prompt(&mut self, form: &PromptForm) -> Result<Mode> {
        let value = form.parse_input()?;
        match form.kind {
            PromptKind::AddSong => {
                if self.repo.add_song(&value)? {
                    self.dirty = true;
                    self.set_status(format!("Added '{value}' to library."), StatusKind::Info);
                } else {
                    self.set_status(format!("'{value}' is already in the library."), StatusKind::Info);
                }
                self.select_song(&value);
            }
            PromptKind::Search => {
                if self.repo.search(&value) {
                    self.select_song(&value);
                    self.set_status(format!("'{value}' exists in library."), StatusKind::Info);
                } else {
                    self.set_status(format!("'{value}' not found in library."), StatusKind::Error);
                }
            }
            PromptKind::Play => self.play_song(&value),
            PromptKind::SaveAs => {
                let path = PathBuf::from(&value);
                self.repo.save_to(&path)?;
                if path == self.repo.library_path() {
                    self.dirty = false;
                }
                self.set_status(format!("Library saved to {value}."), StatusKind::Info);
            }
            PromptKind::LoadFrom => {
                let path = PathBuf::from(&value);
                let current_songs = self.repo.library().len();
                if current_songs > 0 {
                    return Ok(Mode::ConfirmLoad(ConfirmLoad {
                        path,
                        current_songs,
                    }));
                }
                self.load_library(&path, LoadMode::Replace)?;
            }
            PromptKind::Profile => {
                let profile = self.repo.ensure_profile(&value)?;
                self.set_status(format!("Switched to profile '{}'.", profile.name), StatusKind::Info);
                self.profile = Some(profile);
                if matches!(self.screen, Screen::Playlist(_)) {
                    self.open_playlist()?;
                }
            }
            PromptKind::AddToPlaylist => {
                let profile = self.require_profile()?;
                let library_before = self.repo.library().len();
                self.repo.add_song_for(&profile, &value)?;
                if self.repo.library().len() != library_before {
                    self.dirty = true;
                }
                self.refresh_playlist()?;
                self.with_playlist(|p| p.selected = p.items.len().saturating_sub(1));
                self.set_status(format!("Added '{value}' to the playlist."), StatusKind::Info);
            }
        }
        Ok(Mode::Normal)
    }

    fn handle_confirm_load(&mut self, code: KeyCode, confirm: ConfirmLoad) -> Result<Mode> {
        let mode = match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Load cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Enter | KeyCode::Char('r') | KeyCode::Char('R') => LoadMode::Replace,
            KeyCode::Char('m') | KeyCode::Char('M') => LoadMode::Merge,
            _ => return Ok(Mode::ConfirmLoad(confirm)),
        };
        let result = self.load_library(&confirm.path, mode);
        self.report(result);
        Ok(Mode::Normal)
    }

    fn handle_confirm_quit(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('s') | KeyCode::Char('S') => Ok(self.request_save(true, exit)),
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Char('y') => {
                *exit = true;
                Ok(Mode::Normal)
            }
            KeyCode::Esc | KeyCode::Char('n') => Ok(Mode::Normal),
            _ => Ok(Mode::ConfirmQuit),
        }
    }

    fn handle_confirm_overwrite(&mut self, code: KeyCode, then_quit: bool, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.repo.discard_skipped_lines();
                self.request_save(then_quit, exit)
            }
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Save cancelled. The library file was left unchanged.", StatusKind::Info);
                Mode::Normal
            }
            _ => Mode::ConfirmOverwrite { then_quit },
        }
    }

    /// Save to the library file, first asking when that would drop lines
    /// which failed to parse.
    fn request_save(&mut self, then_quit: bool, exit: &mut bool) -> Mode {
        if !self.repo.skipped_lines().is_empty() {
            return Mode::ConfirmOverwrite { then_quit };
        }
        self.save_library();
        *exit = then_quit && !self.dirty;
        Mode::Normal
    }

    fn request_quit(&mut self, exit: &mut bool) -> Mode {
        if self.dirty {
            Mode::ConfirmQuit
        } else {
            *exit = true;
            Mode::Normal
        }
    }

    fn play_song(&mut self, name: &str) {
        match self.repo.play(name) {
            Some(count) => {
                self.dirty = true;
                self.set_status(
                    format!("Playing '{name}' ({}).", plural(count, "play")),
                    StatusKind::Info,
                );
            }
            None => self.set_status(format!("'{name}' not found in library."), StatusKind::Error),
        }
    }

    fn save_library(&mut self) {
        match self.repo.save() {
            Ok(()) => {
                self.dirty = false;
                let path = self.repo.library_path().display().to_string();
                self.set_status(format!("Library saved to {path}."), StatusKind::Info);
            }
            Err(err) => {
                warn!(error = %err, "save failed");
                self.set_status(surface_error(&err), StatusKind::Error);
            }
        }
    }

    fn load_library(&mut self, path: &Path, mode: LoadMode) -> Result<()> {
        let options = LoadOptions {
            mode,
            ..LoadOptions::default()
        };
        let report = self.repo.load_from(path, options)?;
        self.dirty = mode == LoadMode::Merge || path != self.repo.library_path();
        self.library_view.ensure_in_bounds(self.repo.library().len());
        self.refresh_playlist()?;

        let mut message = format!(
            "Loaded {} from {}.",
            plural(report.loaded as u64, "song"),
            path.display()
        );
        if !report.skipped.is_empty() {
            message.push_str(&format!(
                " Skipped {}.",
                plural(report.skipped.len() as u64, "malformed line")
            ));
        }
        self.set_status(message, StatusKind::Info);
        Ok(())
    }

    fn add_selected_to_playlist(&mut self) -> Result<()> {
        let profile = self.require_profile()?;
        let song = self
            .selected_song()
            .ok_or_else(|| anyhow!("No song selected."))?;
        self.repo.add_to_playlist(&profile, &song)?;
        self.set_status(
            format!("Added '{song}' to {}'s playlist.", profile.name),
            StatusKind::Info,
        );
        Ok(())
    }

    fn remove_selected_entry(&mut self) -> Result<()> {
        let Screen::Playlist(playlist) = &self.screen else {
            return Ok(());
        };
        let item = playlist
            .current_item()
            .cloned()
            .ok_or_else(|| anyhow!("Playlist is empty."))?;
        let profile = playlist.profile.clone();
        self.repo.remove_from_playlist(&profile, item.entry.id)?;
        self.refresh_playlist()?;
        self.set_status(
            format!("Removed '{}' from playlist.", item.entry.song),
            StatusKind::Info,
        );
        Ok(())
    }

    fn prune_playlist(&mut self) -> Result<()> {
        let Screen::Playlist(playlist) = &self.screen else {
            return Ok(());
        };
        let profile = playlist.profile.clone();
        let removed = self.repo.prune_playlist(&profile)?;
        self.refresh_playlist()?;
        let message = if removed == 0 {
            "Every playlist song is in the library.".to_string()
        } else {
            format!("Removed {} no longer in the library.", plural(removed as u64, "song"))
        };
        self.set_status(message, StatusKind::Info);
        Ok(())
    }

    fn open_playlist(&mut self) -> Result<()> {
        let profile = self.require_profile()?;
        let items = self.repo.playlist(&profile)?;
        self.screen = Screen::Playlist(PlaylistScreen::new(profile, items));
        self.clear_status();
        Ok(())
    }

    fn refresh_playlist(&mut self) -> Result<()> {
        if let Screen::Playlist(playlist) = &mut self.screen {
            let items = self.repo.playlist(&playlist.profile)?;
            playlist.set_items(items);
        }
        Ok(())
    }

    fn with_playlist(&mut self, f: impl FnOnce(&mut PlaylistScreen)) {
        if let Screen::Playlist(playlist) = &mut self.screen {
            f(playlist);
        }
    }

    fn require_profile(&self) -> Result<Profile> {
        self.profile
            .clone()
            .ok_or_else(|| anyhow!("Choose a profile first (press 'u')."))
    }

    fn selected_song(&self) -> Option<String> {
        self.repo
            .library()
            .entries()
            .get(self.library_view.selected)
            .map(|entry| entry.name.clone())
    }

    fn select_song(&mut self, name: &str) {
        if let Some(idx) = self.repo.library().iter().position(|e| e.name == name) {
            self.library_view.selected = idx;
        }
    }

    fn report(&mut self, result: Result<()>) {
        if let Err(err) = result {
            self.set_status(surface_error(&err), StatusKind::Error);
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_header(frame, chunks[0]);
        match &self.screen {
            Screen::Library => self.draw_library(frame, chunks[1]),
            Screen::Playlist(playlist) => self.draw_playlist(frame, chunks[1], playlist),
        }
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::Prompt(form) => self.draw_prompt(frame, area, form),
            Mode::ConfirmLoad(confirm) => self.draw_confirm_load(frame, area, confirm),
            Mode::ConfirmQuit => self.draw_confirm_quit(frame, area),
            Mode::ConfirmOverwrite { .. } => self.draw_confirm_overwrite(frame, area),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let library = self.repo.library();
        let most_played = library.most_played().unwrap_or_else(|| "-".to_string());
        let profile = self
            .profile
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "none".to_string());

        let mut details = vec![
            Span::raw(format!("Profile: {profile}")),
            Span::raw(format!("  •  {}", plural(library.len() as u64, "song"))),
        ];
        if self.dirty {
            details.push(Span::styled(
                "  •  unsaved changes",
                Style::default().fg(Color::Yellow),
            ));
        }

        let header = Paragraph::new(vec![
            Line::from(vec![
                Span::raw("Most Played: "),
                Span::styled(most_played, Style::default().add_modifier(Modifier::BOLD)),
            ]),
            Line::from(details),
        ])
        .block(Block::default().borders(Borders::ALL).title("Musify"));
        frame.render_widget(header, area);
    }

    fn draw_library(&self, frame: &mut Frame, area: Rect) {
        let library = self.repo.library();
        let block = Block::default().borders(Borders::ALL).title("Library");
        if library.is_empty() {
            let message = Paragraph::new("Library is empty. Press '+' to add a song.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = library
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                ListItem::new(Line::from(vec![
                    Span::raw(format!("{:>3}. {}", idx + 1, entry.name)),
                    Span::styled(
                        format!("  {}", plural(entry.play_count, "play")),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(self.library_view.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_playlist(&self, frame: &mut Frame, area: Rect, playlist: &PlaylistScreen) {
        let mut title = format!("Playlist • {}", playlist.profile.name);
        let dangling = playlist.dangling_count();
        if dangling > 0 {
            title.push_str(&format!(" ({dangling} not in library)"));
        }
        let block = Block::default().borders(Borders::ALL).title(title);

        if playlist.items.is_empty() {
            let message = Paragraph::new("Playlist is empty. Press '+' to add a song.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = playlist
            .items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let label = format!("{:>3}. {}", idx + 1, item.entry.song);
                if item.in_library {
                    ListItem::new(Line::from(label))
                } else {
                    ListItem::new(Line::from(vec![
                        Span::styled(label, Style::default().fg(Color::DarkGray)),
                        Span::styled(
                            "  (not in library)",
                            Style::default()
                                .fg(Color::DarkGray)
                                .add_modifier(Modifier::ITALIC),
                        ),
                    ]))
                }
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(playlist.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&str, &str)] = match (&self.screen, &self.mode) {
            (_, Mode::Prompt(_)) => &[("[Enter]", " Confirm   "), ("[Esc]", " Cancel")],
            (_, Mode::ConfirmLoad(_)) => &[
                ("[r]", " Replace   "),
                ("[m]", " Merge   "),
                ("[Esc]", " Cancel"),
            ],
            (_, Mode::ConfirmOverwrite { .. }) => &[("[y]", " Save anyway   "), ("[Esc]", " Cancel")],
            (_, Mode::ConfirmQuit) => &[
                ("[s]", " Save & Quit   "),
                ("[q]", " Quit   "),
                ("[Esc]", " Cancel"),
            ],
            (Screen::Library, Mode::Normal) => &[
                ("[+]", " Add   "),
                ("[/]", " Search   "),
                ("[Enter]", " Play   "),
                ("[y]", " To Playlist   "),
                ("[s/S]", " Save   "),
                ("[l]", " Load   "),
                ("[u]", " Profile   "),
                ("[Tab]", " Playlist   "),
                ("[q]", " Quit"),
            ],
            (Screen::Playlist(_), Mode::Normal) => &[
                ("[+]", " Add   "),
                ("[-]", " Remove   "),
                ("[Enter]", " Play   "),
                ("[x]", " Prune   "),
                ("[u]", " Profile   "),
                ("[Tab]", " Library   "),
                ("[q]", " Quit"),
            ],
        };

        let spans: Vec<Span<'static>> = keys
            .iter()
            .flat_map(|(key, action)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(action.to_string()),
                ]
            })
            .collect();
        Line::from(spans)
    }

    fn draw_prompt(&self, frame: &mut Frame, area: Rect, form: &PromptForm) {
        let popup_area = centered_rect(60, 25, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(form.kind.title()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![form.build_line(), Line::from("")];
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to confirm • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let cursor_x = cursor_column(inner, form.prefix().chars().count() + form.value_len());
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_confirm_load(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmLoad) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let lines = vec![
            Line::from(format!("Load {}?", confirm.path.display())),
            Line::from(""),
            Line::from(format!(
                "Replacing discards the {} currently in the library.",
                plural(confirm.current_songs as u64, "song")
            )),
            Line::from("Merging keeps them and adds the file's songs."),
            Line::from(""),
            Line::from(Span::styled(
                "r Replace • m Merge • Esc Cancel",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Load Library").borders(Borders::ALL));
        frame.render_widget(paragraph, popup_area);
    }

    fn draw_confirm_quit(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(50, 25, area);
        frame.render_widget(Clear, popup_area);

        let lines = vec![
            Line::from("The library has unsaved changes."),
            Line::from(""),
            Line::from(Span::styled(
                "s Save & Quit • q Quit without saving • Esc Cancel",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Quit").borders(Borders::ALL));
        frame.render_widget(paragraph, popup_area);
    }

    fn draw_confirm_overwrite(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let skipped = self.repo.skipped_lines();
        let mut lines = vec![
            Line::from(format!(
                "{} has {} that could not be read.",
                self.repo.library_path().display(),
                plural(skipped.len() as u64, "malformed line")
            )),
            Line::from("Saving over it drops them for good."),
            Line::from(""),
        ];
        for line in skipped.iter().take(3) {
            lines.push(Line::from(Span::styled(
                format!("line {}: {}", line.line, line.reason),
                Style::default().fg(Color::Yellow),
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "y Save anyway • Esc Cancel",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Overwrite Library").borders(Borders::ALL));
        frame.render_widget(paragraph, popup_area);
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::config::AppConfig;
    use crate::db;

    fn app_in(dir: &TempDir) -> App {
        let repo = Repository::new(db::in_memory(), dir.path().join("library.txt"));
        App::new(repo, None)
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    fn submit(app: &mut App, opener: char, text: &str) {
        app.handle_key(KeyCode::Char(opener)).unwrap();
        type_text(app, text);
        app.handle_key(KeyCode::Enter).unwrap();
    }

    #[test]
    fn add_and_play_through_keys() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);

        submit(&mut app, '+', "Africa");
        submit(&mut app, '+', "Toto");
        app.handle_key(KeyCode::Up).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();

        assert_eq!(app.repo.library().play_count("Africa"), Some(1));
        assert_eq!(app.repo.most_played().as_deref(), Some("Africa"));
        assert!(app.dirty);
    }

    #[test]
    fn quitting_with_changes_asks_first() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);
        submit(&mut app, '+', "Africa");

        assert!(!app.handle_key(KeyCode::Char('q')).unwrap());
        assert!(matches!(app.mode, Mode::ConfirmQuit));
        assert!(app.handle_key(KeyCode::Char('s')).unwrap());
        assert_eq!(
            fs::read_to_string(dir.path().join("library.txt")).unwrap(),
            "Africa\t0\n"
        );
    }

    #[test]
    fn saving_over_malformed_lines_asks_first() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::in_dir(dir.path().to_path_buf(), None, None);
        let contents = "Keep\t1\nHand Edited\tlots\n";
        fs::write(&config.library_path, contents).unwrap();
        let mut app = App::new(Repository::open(&config).unwrap(), None);

        let status = app.status.as_ref().map(|s| s.text.clone()).unwrap_or_default();
        assert!(status.starts_with("Skipped 1 malformed line"), "{status}");

        submit(&mut app, '+', "New");
        app.handle_key(KeyCode::Char('s')).unwrap();
        assert!(matches!(app.mode, Mode::ConfirmOverwrite { then_quit: false }));
        app.handle_key(KeyCode::Esc).unwrap();
        assert_eq!(fs::read_to_string(&config.library_path).unwrap(), contents);
        assert!(app.dirty);

        assert!(!app.handle_key(KeyCode::Char('q')).unwrap());
        assert!(!app.handle_key(KeyCode::Char('s')).unwrap());
        assert!(matches!(app.mode, Mode::ConfirmOverwrite { then_quit: true }));
        assert!(app.handle_key(KeyCode::Char('y')).unwrap());
        assert_eq!(
            fs::read_to_string(&config.library_path).unwrap(),
            "Keep\t1\nNew\t0\n"
        );
    }

    #[test]
    fn failed_load_keeps_library_and_prompt_open() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);
        submit(&mut app, '+', "Keep Me");

        app.handle_key(KeyCode::Char('l')).unwrap();
        for _ in 0..200 {
            app.handle_key(KeyCode::Backspace).unwrap();
        }
        type_text(&mut app, "nowhere.txt");
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(matches!(app.mode, Mode::ConfirmLoad(_)));
        app.handle_key(KeyCode::Char('r')).unwrap();

        assert!(app.repo.search("Keep Me"));
        let status = app.status.as_ref().map(|s| s.text.clone()).unwrap_or_default();
        assert!(status.contains("not found"), "{status}");
    }

    #[test]
    fn playlist_needs_profile() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir);
        app.handle_key(KeyCode::Tab).unwrap();
        assert!(matches!(app.screen, Screen::Library));

        app.handle_key(KeyCode::Char('u')).unwrap();
        type_text(&mut app, "ana");
        app.handle_key(KeyCode::Enter).unwrap();
        app.handle_key(KeyCode::Tab).unwrap();
        assert!(matches!(app.screen, Screen::Playlist(_)));

        submit(&mut app, '+', "Dancing Queen");
        assert!(app.repo.search("Dancing Queen"));
        match &app.screen {
            Screen::Playlist(p) => assert_eq!(p.items.len(), 1),
            Screen::Library => panic!("expected playlist screen"),
        }
    }
}
