//! Bounded polling of standard input for the quit key.

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use tracing::debug;

/// Default poll granularity.
pub const DEFAULT_TICK: Duration = Duration::from_millis(50);

// ── KeySource ─────────────────────────────────────────────────────────────────

/// A source of single input bytes.
///
/// `next_byte` waits at most `wait` and returns `Ok(None)` when nothing
/// arrived. `WouldBlock`, `TimedOut` and `Interrupted` errors are treated as
/// "nothing yet" by the poller.
pub trait KeySource {
    fn next_byte(&mut self, wait: Duration) -> io::Result<Option<u8>>;
}

/// [`KeySource`] reading key presses through crossterm's event queue.
///
/// Only meaningful while the terminal is in raw mode. Non-ASCII keys and
/// non-key events (resize, focus) count as "nothing arrived".
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn next_byte(&mut self, wait: Duration) -> io::Result<Option<u8>> {
        if !event::poll(wait)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char(c) if c.is_ascii() => Ok(Some(c as u8)),
                KeyCode::Enter => Ok(Some(b'\r')),
                KeyCode::Esc => Ok(Some(0x1b)),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }
}

/// [`KeySource`] that never produces a byte; used when stdin is not a
/// terminal. It still sleeps for the requested wait so callers keep their
/// pacing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoKeys;

impl KeySource for NoKeys {
    fn next_byte(&mut self, wait: Duration) -> io::Result<Option<u8>> {
        std::thread::sleep(wait);
        Ok(None)
    }
}

// ── InputPoller ───────────────────────────────────────────────────────────────

/// Watches a [`KeySource`] for `q` / `Q` in short slices.
pub struct InputPoller<'a> {
    source: &'a mut dyn KeySource,
    tick: Duration,
}

impl<'a> InputPoller<'a> {
    /// `tick` is the longest single wait; a zero tick is raised to 1 ms.
    pub fn new(source: &'a mut dyn KeySource, tick: Duration) -> Self {
        Self {
            source,
            tick: tick.max(Duration::from_millis(1)),
        }
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Poll until a quit key arrives or `timeout` elapses.
    ///
    /// Returns `true` as soon as `q`/`Q` is read. Any other byte is discarded
    /// and polling continues inside the same window. A hard read error ends
    /// the window early with `false`. Returns within `timeout` plus one tick.
    pub fn wait_for_quit(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let slice = self.tick.min(deadline - now);

            match self.source.next_byte(slice) {
                Ok(Some(b'q' | b'Q')) => return true,
                Ok(Some(byte)) => debug!(byte, "ignoring key"),
                Ok(None) => {}
                Err(e) if is_transient(&e) => std::thread::sleep(slice),
                Err(e) => {
                    debug!(error = %e, "input read failed; no quit this window");
                    return false;
                }
            }
        }
    }
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
