//! Terminal User Interface (TUI) for the Envoy admin stats
//!
//! Shows server gauges, per-cluster host charts and a searchable stats table,
//! refreshed whenever a poller completes a cycle.

mod app;
mod constants;
mod helpers;
pub mod log_capture;
mod types;
mod ui;

pub use app::{ClustersPanel, ServerPanel, StatsPanel, TuiApp, TuiAppBuilder};
pub use log_capture::{LogBuffer, LogMakeWriter};
pub use types::{InputMode, KeyAction, ViewMode};
pub use ui::render_ui;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

/// How often the keyboard is checked
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Setup the terminal for TUI rendering
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

/// Restore the terminal to its original state
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    // Clear first so escape sequences don't leak to the shell
    terminal.clear()?;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}

/// Run the TUI event loop
///
/// Redraws after every poll notification on `updates` and after every key
/// that changes state. Runs until the user quits or a shutdown signal
/// arrives; on exit it broadcasts shutdown so the pollers stop too.
pub async fn run_tui(
    mut app: TuiApp,
    mut updates: broadcast::Receiver<()>,
    shutdown_tx: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let mut terminal = setup_terminal()?;

    // Leave raw mode even if rendering panics
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_app(&mut terminal, &mut app, &mut updates, &mut shutdown_rx).await;

    restore_terminal(&mut terminal)?;

    let _ = shutdown_tx.send(());

    result
}

/// Main TUI event loop
async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut TuiApp,
    updates: &mut broadcast::Receiver<()>,
    shutdown_rx: &mut broadcast::Receiver<()>,
) -> Result<()> {
    let mut input_interval = tokio::time::interval(INPUT_POLL_INTERVAL);
    let mut redraw = true;

    loop {
        if redraw {
            terminal.draw(|f| ui::render_ui(f, app))?;
            redraw = false;
        }

        tokio::select! {
            _ = shutdown_rx.recv() => break,
            update = updates.recv() => match update {
                Ok(()) => {
                    app.update();
                    redraw = true;
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!("TUI skipped {} poll notifications", skipped);
                    app.update();
                    redraw = true;
                }
                Err(RecvError::Closed) => break,
            },
            _ = input_interval.tick() => {
                // Drain everything typed since the last tick
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            match app.handle_key(key) {
                                KeyAction::Quit => return Ok(()),
                                KeyAction::Redraw => redraw = true,
                                KeyAction::Ignored => {}
                            }
                        }
                        Event::Resize(_, _) => redraw = true,
                        _ => {}
                    }
                }
                // Keep the log panel current
                if app.log_buffer().is_some() {
                    redraw = true;
                }
            }
        }
    }

    Ok(())
}
