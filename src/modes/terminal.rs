use anyhow::{Context, Result};
use crossterm::{cursor, execute, terminal::{LeaveAlternateScreen, disable_raw_mode}};
use std::io::Write;

/// Undoes raw mode, the alternate screen and the hidden cursor.
///
/// Created right after raw mode is enabled. Every restore step runs even if an
/// earlier one fails, and dropping the guard without calling
/// [`TerminalGuard::restore`] still restores on a best-effort basis.
pub struct TerminalGuard<W: Write> {
    out: W,
    restored: bool,
}

impl<W: Write> TerminalGuard<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            restored: false,
        }
    }

    /// Restore the terminal, returning the first error met
    pub fn restore(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;

        let raw = disable_raw_mode().context("Failed to disable raw mode");
        let screen =
            execute!(self.out, LeaveAlternateScreen).context("Failed to leave alternate screen");
        let cursor = execute!(self.out, cursor::Show).context("Failed to show cursor");

        raw.and(screen).and(cursor)
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}
