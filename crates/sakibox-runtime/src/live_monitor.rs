//! Live process monitor loop.
//!
//! Drives snapshot → render → poll-for-quit cycles on the calling thread
//! until the user presses `q`/`Q` or a snapshot fails. Raw mode is held by a
//! [`RawModeGuard`](sakibox_ui::raw_mode::RawModeGuard) for the whole
//! `Running` phase and is released on every way out of it, before any
//! message is printed or any error reaches the caller.
//!
//! ```text
//! Starting ──enable ok──▶ Running ──quit key──▶ Stopping ──Enter──▶ Stopped
//!    │                       │
//!    └─enable err─▶ Stopped  └─snapshot/write err─▶ Failed
//! ```

use std::io::{BufRead, Write};
use std::time::Duration;

use chrono::Local;
use sakibox_core::error::Result;
use sakibox_data::process::SnapshotProvider;
use sakibox_ui::frame::render_frame;
use sakibox_ui::input::{InputPoller, KeySource, NoKeys, DEFAULT_TICK};
use sakibox_ui::palette::{self, Tone};
use sakibox_ui::raw_mode::{RawModeController, SessionKind, TerminalModeBackend};
use sakibox_ui::viewport::{current_viewport, ViewportProbe};
use tracing::{debug, info, warn};

// ── Configuration ─────────────────────────────────────────────────────────────

/// Timing and text of a monitor session.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// How long each cycle waits for the quit key before repainting.
    pub poll_window: Duration,
    /// Longest single wait inside the poll window.
    pub poll_tick: Duration,
    /// Bottom line of every frame; the snapshot time is appended.
    pub footer: String,
    /// Printed once cooked mode is back after a quit.
    pub completion_message: String,
    /// Printed before waiting for Enter.
    pub enter_prompt: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_window: Duration::from_secs(1),
            poll_tick: DEFAULT_TICK,
            footer: "Press q to quit".to_string(),
            completion_message: "Live process view closed.".to_string(),
            enter_prompt: "Press Enter to continue...".to_string(),
        }
    }
}

// ── State ─────────────────────────────────────────────────────────────────────

/// Lifecycle of one monitor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
}

/// Summary of a run that ended with the quit key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorReport {
    /// Frames written.
    pub cycles: u64,
    /// Whether raw mode was actually entered.
    pub session: SessionKind,
}

// ── LiveMonitor ───────────────────────────────────────────────────────────────

/// The live monitor and its collaborators.
pub struct LiveMonitor<'a> {
    snapshots: &'a dyn SnapshotProvider,
    viewport: &'a dyn ViewportProbe,
    keys: &'a mut dyn KeySource,
    config: MonitorConfig,
    state: MonitorState,
    cycles: u64,
}

impl<'a> LiveMonitor<'a> {
    pub fn new(
        snapshots: &'a dyn SnapshotProvider,
        viewport: &'a dyn ViewportProbe,
        keys: &'a mut dyn KeySource,
        config: MonitorConfig,
    ) -> Self {
        Self {
            snapshots,
            viewport,
            keys,
            config,
            state: MonitorState::Stopped,
            cycles: 0,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Frames written by the most recent run.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run the monitor until quit or failure.
    ///
    /// `out` receives one full frame per cycle as a single write. After a
    /// quit, `input` is read for the Enter that hands control back to the
    /// caller. When stdin is not a terminal no key is ever read and the loop
    /// only ends when a snapshot fails.
    pub fn run<B: TerminalModeBackend>(
        &mut self,
        raw: &mut RawModeController<B>,
        out: &mut dyn Write,
        input: &mut dyn BufRead,
    ) -> Result<MonitorReport> {
        let LiveMonitor {
            snapshots,
            viewport,
            keys,
            config,
            state,
            cycles,
        } = self;
        *cycles = 0;
        transition(state, MonitorState::Starting);

        let guard = match raw.acquire() {
            Ok(guard) => guard,
            Err(e) => {
                warn!(error = %e, "live monitor could not start");
                transition(state, MonitorState::Stopped);
                return Err(e);
            }
        };
        let session = guard.kind();
        transition(state, MonitorState::Running);

        let mut idle = NoKeys;
        let source: &mut dyn KeySource = if guard.is_raw() {
            &mut **keys
        } else {
            &mut idle
        };
        let mut poller = InputPoller::new(source, config.poll_tick);

        loop {
            let entries = match snapshots.fetch_snapshot() {
                Ok(entries) => entries,
                Err(e) => {
                    guard.release();
                    if *cycles > 0 {
                        end_last_frame(out);
                    }
                    transition(state, MonitorState::Failed);
                    warn!(error = %e, cycle = *cycles + 1, "process snapshot failed");
                    return Err(e);
                }
            };

            let vp = current_viewport(*viewport);
            let footer = format!("{}  [{}]", config.footer, Local::now().format("%H:%M:%S"));
            let frame = render_frame(
                &entries,
                usize::from(vp.rows),
                usize::from(vp.columns),
                &footer,
            );

            if let Err(e) = write_frame(out, &frame.to_buffer()) {
                guard.release();
                transition(state, MonitorState::Failed);
                warn!(error = %e, "writing frame failed");
                return Err(e.into());
            }
            *cycles += 1;
            debug!(
                cycle = *cycles,
                entries = entries.len(),
                shown = frame.shown(),
                columns = vp.columns,
                rows = vp.rows,
                "frame rendered"
            );

            if poller.wait_for_quit(config.poll_window) {
                break;
            }
        }

        guard.release();
        transition(state, MonitorState::Stopping);

        if let Err(e) = finish(out, input, config) {
            transition(state, MonitorState::Failed);
            return Err(e.into());
        }
        transition(state, MonitorState::Stopped);

        Ok(MonitorReport {
            cycles: *cycles,
            session,
        })
    }
}

fn transition(state: &mut MonitorState, next: MonitorState) {
    let from = *state;
    info!(?from, to = ?next, "live monitor state");
    *state = next;
}

fn write_frame(out: &mut dyn Write, buffer: &str) -> std::io::Result<()> {
    out.write_all(buffer.as_bytes())?;
    out.flush()
}

/// Terminate the unterminated last grid line so whatever the caller prints
/// next starts on a fresh line. Best effort: the snapshot error wins.
fn end_last_frame(out: &mut dyn Write) {
    if let Err(e) = writeln!(out).and_then(|()| out.flush()) {
        debug!(error = %e, "could not terminate last frame");
    }
}

/// Completion message and the wait for Enter, on the restored terminal.
fn finish(
    out: &mut dyn Write,
    input: &mut dyn BufRead,
    config: &MonitorConfig,
) -> std::io::Result<()> {
    // The last frame ends without a line break.
    writeln!(out)?;
    palette::line(out, Tone::Hint, &config.completion_message)?;
    palette::line(out, Tone::Prompt, &config.enter_prompt)?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
