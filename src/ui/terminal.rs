use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;

use super::app::App;

/// Spin up the terminal backend, enter the draw loop, and keep processing input
/// until the user quits.
pub fn run_app(app: &mut App) -> Result<()> {
    let mut stdout = io::stdout();
    enable_raw_mode().context("failed to enable raw mode")?;
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    info!("terminal session started");

    let result = loop {
        if let Err(err) = terminal.draw(|frame| app.draw(frame)) {
            break Err(err).context("failed to draw frame");
        }

        match poll_key(app) {
            Ok(true) => break Ok(()),
            Ok(false) => {}
            Err(err) => break Err(err),
        }
    };

    cleanup_terminal(&mut terminal)?;
    info!("terminal session ended");
    result
}

/// Wait briefly for a key press and hand it to the app. Returns `true` when
/// the app asked to exit.
fn poll_key(app: &mut App) -> Result<bool> {
    if !event::poll(Duration::from_millis(250)).context("event polling failed")? {
        return Ok(false);
    }
    match event::read().context("failed to read event")? {
        Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
            app.handle_key(key_event.code)
        }
        _ => Ok(false),
    }
}

fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal
        .show_cursor()
        .context("failed to restore cursor visibility")
}
