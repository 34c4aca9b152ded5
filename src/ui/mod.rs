//! Ratatui front end: the library list, the active profile's playlist, and
//! the prompts that drive every library operation.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
