// Terminal UI - the face of songbook
// Built with ratatui; everything here renders session state and forwards keys

mod app;
pub mod debounce;
pub mod events;
pub mod theme;

pub use app::App;
pub use debounce::Debouncer;
pub use events::{key_to_app_event, AppEvent, InputMode};
pub use theme::Theme;

use anyhow::Result;
use crossterm::{
    cursor, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;

/// Raw-mode terminal for the lifetime of the app. Restores the shell on drop,
/// including when the app bails out with an error.
pub struct TerminalManager {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    _restore: RestoreGuard,
}

struct RestoreGuard;

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, cursor::Show);
    }
}

impl TerminalManager {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;

        Ok(Self {
            terminal,
            _restore: RestoreGuard,
        })
    }

    pub fn draw<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame),
    {
        self.terminal.draw(f)?;
        Ok(())
    }
}
