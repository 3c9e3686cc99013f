use anyhow::{Context, Result};
use crossterm::cursor::{Hide, Show};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use std::io::stdout;

/// Raw-mode + alternate-screen guard. Restores the terminal on drop so a
/// panic or early return never leaves the shell unusable.
pub struct TerminalGuard {
    active: bool,
}

impl TerminalGuard {
    pub fn enter() -> Result<Self> {
        enable_raw_mode().context("enabling raw mode")?;
        stdout()
            .execute(EnterAlternateScreen)
            .and_then(|out| out.execute(Hide))
            .context("entering alternate screen")?;
        Ok(Self { active: true })
    }

    /// Headless variant for surfaces that never touch a tty.
    pub fn detached() -> Self {
        Self { active: false }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        let _ = stdout().execute(Show);
        let _ = stdout().execute(LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}
