//! Ratatui front-end. `app` holds the screen/mode state machine, `forms` and
//! `screens` hold per-dialog state, and `terminal` owns the raw-mode loop.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
