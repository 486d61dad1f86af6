//! Exclusive, scoped control over the terminal's input mode.
//!
//! [`RawModeController`] is the single owner of the cooked/raw transition.
//! [`RawModeController::acquire`] hands out a [`RawModeGuard`] whose drop
//! restores the captured mode, so every exit path out of a raw-mode session
//! (early return, `?`, panic unwind) puts the terminal back the way it was.

use std::io::{self, IsTerminal};

use sakibox_core::error::{Result, ToolboxError};
use tracing::{debug, warn};

// ── Backend ───────────────────────────────────────────────────────────────────

/// Low-level terminal mode operations.
pub trait TerminalModeBackend {
    /// Whether standard input is an interactive terminal.
    fn is_interactive(&self) -> bool;
    /// Whether the terminal is currently in raw mode.
    fn is_raw(&self) -> io::Result<bool>;
    fn enter_raw(&mut self) -> io::Result<()>;
    fn leave_raw(&mut self) -> io::Result<()>;
}

/// [`TerminalModeBackend`] for the process's real terminal.
///
/// crossterm keeps the original termios itself and restores it on
/// `disable_raw_mode`. Key reads go through crossterm's event poller, which
/// is bounded by a timeout, so stdin's blocking flag is never touched.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrosstermModeBackend;

impl TerminalModeBackend for CrosstermModeBackend {
    fn is_interactive(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn is_raw(&self) -> io::Result<bool> {
        crossterm::terminal::is_raw_mode_enabled()
    }

    fn enter_raw(&mut self) -> io::Result<()> {
        crossterm::terminal::enable_raw_mode()
    }

    fn leave_raw(&mut self) -> io::Result<()> {
        crossterm::terminal::disable_raw_mode()
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

/// What [`RawModeController::enable`] actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Raw mode is active; keystrokes arrive byte by byte.
    Raw,
    /// Stdin is not a terminal; nothing was changed and no key will arrive.
    Bypassed,
}

/// Mode captured when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SavedMode {
    was_raw: bool,
}

/// Owner of the raw-mode state. At most one session is active at a time.
pub struct RawModeController<B: TerminalModeBackend> {
    backend: B,
    saved: Option<SavedMode>,
}

impl<B: TerminalModeBackend> RawModeController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            saved: None,
        }
    }

    /// `true` while a raw session is holding a captured mode.
    pub fn is_active(&self) -> bool {
        self.saved.is_some()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Capture the current mode and switch to raw.
    ///
    /// A no-op returning [`SessionKind::Bypassed`] when stdin is not a
    /// terminal. All-or-nothing: on error no state is recorded and the
    /// terminal is left as it was.
    pub fn enable(&mut self) -> Result<SessionKind> {
        if self.saved.is_some() {
            return Err(ToolboxError::Terminal(
                "raw mode session already active".to_string(),
            ));
        }
        if !self.backend.is_interactive() {
            debug!("stdin is not a terminal; raw mode bypassed");
            return Ok(SessionKind::Bypassed);
        }

        let was_raw = self
            .backend
            .is_raw()
            .map_err(|e| ToolboxError::Terminal(format!("cannot read terminal mode: {e}")))?;
        if !was_raw {
            self.backend
                .enter_raw()
                .map_err(|e| ToolboxError::Terminal(format!("cannot enable raw mode: {e}")))?;
        }
        self.saved = Some(SavedMode { was_raw });
        debug!(was_raw, "raw mode enabled");
        Ok(SessionKind::Raw)
    }

    /// Restore the mode captured by [`enable`](Self::enable).
    ///
    /// Idempotent: without an active session this does nothing.
    pub fn disable(&mut self) {
        let Some(saved) = self.saved.take() else {
            return;
        };
        if !saved.was_raw {
            if let Err(e) = self.backend.leave_raw() {
                warn!(error = %e, "failed to restore cooked mode");
            }
        }
        debug!("raw mode released");
    }

    /// Start a session whose guard releases raw mode when dropped.
    pub fn acquire(&mut self) -> Result<RawModeGuard<'_, B>> {
        let kind = self.enable()?;
        Ok(RawModeGuard {
            controller: self,
            kind,
        })
    }
}

impl<B: TerminalModeBackend> Drop for RawModeController<B> {
    fn drop(&mut self) {
        self.disable();
    }
}

// ── Guard ─────────────────────────────────────────────────────────────────────

/// Scoped raw-mode session. Dropping it restores the captured mode.
pub struct RawModeGuard<'a, B: TerminalModeBackend> {
    controller: &'a mut RawModeController<B>,
    kind: SessionKind,
}

impl<B: TerminalModeBackend> RawModeGuard<'_, B> {
    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    /// Whether keystrokes can be expected during this session.
    pub fn is_raw(&self) -> bool {
        self.kind == SessionKind::Raw
    }

    /// End the session now.
    pub fn release(self) {
        drop(self);
    }
}

impl<B: TerminalModeBackend> Drop for RawModeGuard<'_, B> {
    fn drop(&mut self) {
        self.controller.disable();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
