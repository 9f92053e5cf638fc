//! Terminal session management: raw mode, alternate screen, size queries.
//!
//! `CrosstermBackend::enter_guard` returns a [`TerminalGuard`] that restores
//! the terminal when dropped, including during unwinding. [`restore`] performs
//! the same teardown without a backend and is meant for panic hooks, which run
//! before unwinding reaches the guard.

use anyhow::Result;
use crossterm::{
    cursor::{Hide, Show},
    execute,
    style::ResetColor,
    terminal::{
        self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
        disable_raw_mode, enable_raw_mode,
    },
};
use std::io::{self, Write, stdout};
use tracing::debug;

pub trait TerminalBackend {
    fn enter(&mut self) -> Result<()>;
    fn leave(&mut self) -> Result<()>;
    fn set_title(&mut self, title: &str) -> Result<()>;
    /// Current size in (columns, rows).
    fn size(&self) -> Result<(u16, u16)>;
}

/// Raw-mode alternate-screen session on stdout.
#[derive(Debug, Default)]
pub struct CrosstermBackend {
    active: bool,
}

/// Leaves the session on drop.
pub struct TerminalGuard<'a> {
    backend: &'a mut CrosstermBackend,
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_entered(&self) -> bool {
        self.active
    }

    pub fn enter_guard(&mut self) -> Result<TerminalGuard<'_>> {
        self.enter()?;
        Ok(TerminalGuard { backend: self })
    }
}

fn teardown(out: &mut impl Write) -> io::Result<()> {
    execute!(out, ResetColor, LeaveAlternateScreen, Show)?;
    disable_raw_mode()
}

impl TerminalBackend for CrosstermBackend {
    fn enter(&mut self) -> Result<()> {
        if self.active {
            return Ok(());
        }
        enable_raw_mode()?;
        if let Err(e) = execute!(stdout(), EnterAlternateScreen, Hide, Clear(ClearType::All)) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }
        self.active = true;
        debug!(target: "terminal", "enter");
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        teardown(&mut stdout())?;
        debug!(target: "terminal", "leave");
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        Ok(execute!(stdout(), SetTitle(title))?)
    }

    fn size(&self) -> Result<(u16, u16)> {
        Ok(terminal::size()?)
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

impl TerminalGuard<'_> {
    pub fn backend(&mut self) -> &mut CrosstermBackend {
        self.backend
    }
}

impl Drop for TerminalGuard<'_> {
    fn drop(&mut self) {
        let _ = self.backend.leave();
    }
}

/// Best-effort teardown for panic hooks. Safe to call when the terminal was
/// never entered.
pub fn restore() {
    let _ = teardown(&mut stdout());
}
