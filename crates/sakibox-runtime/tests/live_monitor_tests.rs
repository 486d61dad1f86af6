//! End-to-end runs of the live monitor against fake terminal, keyboard and
//! process-table collaborators.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::{self, Cursor};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;
use std::time::{Duration, Instant};

use sakibox_runtime::core::error::{Result, ToolboxError};
use sakibox_runtime::core::models::ProcessEntry;
use sakibox_runtime::data::process::SnapshotProvider;
use sakibox_runtime::live_monitor::{LiveMonitor, MonitorConfig, MonitorState};
use sakibox_runtime::ui::frame::CLEAR_AND_HOME;
use sakibox_runtime::ui::input::KeySource;
use sakibox_runtime::ui::raw_mode::{RawModeController, SessionKind, TerminalModeBackend};
use sakibox_runtime::ui::viewport::ViewportProbe;

// ── Fakes ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Terminal {
    interactive: bool,
    raw: bool,
    fail_enter: bool,
    enters: usize,
    leaves: usize,
}

#[derive(Clone)]
struct FakeBackend(Rc<RefCell<Terminal>>);

impl TerminalModeBackend for FakeBackend {
    fn is_interactive(&self) -> bool {
        self.0.borrow().interactive
    }

    fn is_raw(&self) -> io::Result<bool> {
        Ok(self.0.borrow().raw)
    }

    fn enter_raw(&mut self) -> io::Result<()> {
        let mut t = self.0.borrow_mut();
        if t.fail_enter {
            return Err(io::Error::other("tcsetattr: not permitted"));
        }
        t.raw = true;
        t.enters += 1;
        Ok(())
    }

    fn leave_raw(&mut self) -> io::Result<()> {
        let mut t = self.0.borrow_mut();
        t.raw = false;
        t.leaves += 1;
        Ok(())
    }
}

/// Serves `count` processes per call; fails or panics on the given cycle.
/// Records whether raw mode was active during each fetch.
struct Processes {
    count: u32,
    fail_on: Option<u32>,
    panic_on: Option<u32>,
    calls: Cell<u32>,
    terminal: Rc<RefCell<Terminal>>,
    raw_during_fetch: RefCell<Vec<bool>>,
}

impl Processes {
    fn new(count: u32, terminal: &Rc<RefCell<Terminal>>) -> Self {
        Self {
            count,
            fail_on: None,
            panic_on: None,
            calls: Cell::new(0),
            terminal: terminal.clone(),
            raw_during_fetch: RefCell::new(Vec::new()),
        }
    }
}

impl SnapshotProvider for Processes {
    fn fetch_snapshot(&self) -> Result<Vec<ProcessEntry>> {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        self.raw_during_fetch
            .borrow_mut()
            .push(self.terminal.borrow().raw);

        if self.panic_on == Some(call) {
            panic!("process table exploded");
        }
        if self.fail_on == Some(call) {
            return Err(ToolboxError::CommandFailed {
                command: "ps -A -o pid,comm".to_string(),
                status: "exit status: 1".to_string(),
            });
        }
        Ok((1..=self.count)
            .map(|pid| ProcessEntry::new(pid, format!("proc-{pid}")))
            .collect())
    }
}

struct Size(u16, u16);

impl ViewportProbe for Size {
    fn probe(&self) -> io::Result<(u16, u16)> {
        Ok((self.0, self.1))
    }
}

/// Replays scripted bytes, then idles for the requested wait.
struct Keys {
    script: VecDeque<Option<u8>>,
    calls: usize,
}

impl Keys {
    fn new(script: &[Option<u8>]) -> Self {
        Self {
            script: script.iter().copied().collect(),
            calls: 0,
        }
    }

    fn silent() -> Self {
        Self::new(&[])
    }
}

impl KeySource for Keys {
    fn next_byte(&mut self, wait: Duration) -> io::Result<Option<u8>> {
        self.calls += 1;
        match self.script.pop_front() {
            Some(byte) => Ok(byte),
            None => {
                std::thread::sleep(wait);
                Ok(None)
            }
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn fast_config() -> MonitorConfig {
    MonitorConfig {
        poll_window: Duration::from_millis(30),
        poll_tick: Duration::from_millis(5),
        ..MonitorConfig::default()
    }
}

fn interactive_terminal() -> Rc<RefCell<Terminal>> {
    Rc::new(RefCell::new(Terminal {
        interactive: true,
        ..Default::default()
    }))
}

fn frames(output: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(output);
    text.split(CLEAR_AND_HOME)
        .skip(1)
        .map(str::to_string)
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn quit_key_restores_terminal_and_waits_for_enter() {
    let terminal = interactive_terminal();
    let processes = Processes::new(5, &terminal);
    let mut keys = Keys::new(&[Some(b'x'), Some(b'q')]);
    let mut raw = RawModeController::new(FakeBackend(terminal.clone()));
    let mut out = Vec::new();
    let mut input = Cursor::new(b"\n".to_vec());

    let mut monitor = LiveMonitor::new(&processes, &Size(80, 24), &mut keys, fast_config());
    let report = monitor
        .run(&mut raw, &mut out, &mut input)
        .expect("quit ends the run cleanly");

    assert_eq!(report.cycles, 1);
    assert_eq!(report.session, SessionKind::Raw);
    assert_eq!(monitor.state(), MonitorState::Stopped);

    let t = terminal.borrow();
    assert!(!t.raw, "cooked mode must be restored");
    assert_eq!((t.enters, t.leaves), (1, 1));
    drop(t);
    assert!(!raw.is_active());
    assert_eq!(processes.raw_during_fetch.borrow().as_slice(), &[true]);

    let text = String::from_utf8_lossy(&out);
    assert!(text.contains("Live process view closed."));
    assert_eq!(input.position(), 1, "the Enter line must be consumed");
}

#[test]
fn snapshot_failure_releases_raw_mode_before_error() {
    let terminal = interactive_terminal();
    let mut processes = Processes::new(3, &terminal);
    processes.fail_on = Some(3);
    let mut keys = Keys::silent();
    let mut raw = RawModeController::new(FakeBackend(terminal.clone()));
    let mut out = Vec::new();
    let mut input = Cursor::new(Vec::new());

    let mut monitor = LiveMonitor::new(&processes, &Size(80, 24), &mut keys, fast_config());
    let err = monitor
        .run(&mut raw, &mut out, &mut input)
        .expect_err("cycle 3 fails");

    assert!(matches!(err, ToolboxError::CommandFailed { .. }));
    assert_eq!(monitor.state(), MonitorState::Failed);
    assert_eq!(monitor.cycles(), 2);
    assert!(!terminal.borrow().raw);
    assert!(!raw.is_active());

    // Frames from cycles 1 and 2 are the last thing written, and the last
    // one is closed with a line break for the caller's error message.
    assert_eq!(frames(&out).len(), 2);
    assert!(out.ends_with(b"\n"));
    assert!(!String::from_utf8_lossy(&out).contains("Live process view closed."));
}

/// Output sink whose reader went away.
struct ClosedPipe {
    writes: usize,
}

impl io::Write for ClosedPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        self.writes += 1;
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn frame_write_failure_releases_raw_mode_before_error() {
    let terminal = interactive_terminal();
    let processes = Processes::new(3, &terminal);
    let mut keys = Keys::silent();
    let mut raw = RawModeController::new(FakeBackend(terminal.clone()));
    let mut out = ClosedPipe { writes: 0 };
    let mut input = Cursor::new(Vec::new());

    let mut monitor = LiveMonitor::new(&processes, &Size(80, 24), &mut keys, fast_config());
    let err = monitor
        .run(&mut raw, &mut out, &mut input)
        .expect_err("a closed output ends the run");

    assert!(matches!(err, ToolboxError::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    assert_eq!(monitor.state(), MonitorState::Failed);
    assert_eq!(monitor.cycles(), 0);
    assert_eq!(processes.calls.get(), 1);
    assert_eq!(out.writes, 1);

    let t = terminal.borrow();
    assert!(!t.raw, "cooked mode must be restored");
    assert_eq!((t.enters, t.leaves), (1, 1));
    drop(t);
    assert!(!raw.is_active());
}

#[test]
fn panic_during_cycle_still_restores_terminal() {
    let terminal = interactive_terminal();
    let mut processes = Processes::new(3, &terminal);
    processes.panic_on = Some(2);
    let mut keys = Keys::silent();
    let mut raw = RawModeController::new(FakeBackend(terminal.clone()));
    let mut out = Vec::new();
    let mut input = Cursor::new(Vec::new());

    let result = catch_unwind(AssertUnwindSafe(|| {
        let mut monitor = LiveMonitor::new(&processes, &Size(80, 24), &mut keys, fast_config());
        monitor.run(&mut raw, &mut out, &mut input)
    }));

    assert!(result.is_err());
    assert!(!terminal.borrow().raw);
    assert_eq!(terminal.borrow().leaves, 1);
}

#[test]
fn enable_failure_propagates_without_running() {
    let terminal = interactive_terminal();
    terminal.borrow_mut().fail_enter = true;
    let processes = Processes::new(3, &terminal);
    let mut keys = Keys::silent();
    let mut raw = RawModeController::new(FakeBackend(terminal.clone()));
    let mut out = Vec::new();
    let mut input = Cursor::new(Vec::new());

    let mut monitor = LiveMonitor::new(&processes, &Size(80, 24), &mut keys, fast_config());
    let err = monitor.run(&mut raw, &mut out, &mut input).unwrap_err();

    assert!(matches!(err, ToolboxError::Terminal(_)));
    assert_eq!(monitor.state(), MonitorState::Stopped);
    assert_eq!(processes.calls.get(), 0);
    assert!(out.is_empty());
    assert!(!terminal.borrow().raw);
}

#[test]
fn zero_viewport_renders_fallback_grid() {
    let terminal = interactive_terminal();
    let processes = Processes::new(40, &terminal);
    let mut keys = Keys::new(&[Some(b'Q')]);
    let mut raw = RawModeController::new(FakeBackend(terminal.clone()));
    let mut out = Vec::new();
    let mut input = Cursor::new(b"\n".to_vec());

    let mut monitor = LiveMonitor::new(&processes, &Size(0, 0), &mut keys, fast_config());
    monitor.run(&mut raw, &mut out, &mut input).unwrap();

    let frames = frames(&out);
    assert_eq!(frames.len(), 1);
    let mut lines: Vec<&str> = frames[0].split("\r\n").collect();
    // Completion text follows the last grid line after a bare line break.
    if let Some(last) = lines.last_mut() {
        *last = last.split('\n').next().unwrap_or_default();
    }
    assert_eq!(lines.len(), 24);
    assert!(lines.iter().all(|l| l.chars().count() == 80));
    assert!(lines[20].starts_with("20    proc-20"));
    assert!(lines[21].starts_with("showing 20 of 40 processes"));
}

#[test]
fn small_viewport_truncates_body() {
    let terminal = interactive_terminal();
    let mut processes = Processes::new(20, &terminal);
    processes.fail_on = Some(2);
    let mut keys = Keys::silent();
    let mut raw = RawModeController::new(FakeBackend(terminal.clone()));
    let mut out = Vec::new();
    let mut input = Cursor::new(Vec::new());

    let mut monitor = LiveMonitor::new(&processes, &Size(40, 10), &mut keys, fast_config());
    assert!(monitor.run(&mut raw, &mut out, &mut input).is_err());

    let frame = &frames(&out)[0];
    assert!(frame.contains("6     proc-6"));
    assert!(!frame.contains("proc-7"));
    assert_eq!(frame.split("\r\n").count(), 10);
}

#[test]
fn non_interactive_stdin_never_reads_keys() {
    let terminal = Rc::new(RefCell::new(Terminal::default()));
    let mut processes = Processes::new(2, &terminal);
    processes.fail_on = Some(3);
    let mut keys = Keys::new(&[Some(b'q')]);
    let mut raw = RawModeController::new(FakeBackend(terminal.clone()));
    let mut out = Vec::new();
    let mut input = Cursor::new(Vec::new());

    let mut monitor = LiveMonitor::new(&processes, &Size(80, 24), &mut keys, fast_config());
    let result = monitor.run(&mut raw, &mut out, &mut input);
    drop(monitor);

    // Without a terminal the loop only stops when a snapshot fails.
    assert!(result.is_err());
    assert_eq!(keys.calls, 0);
    assert_eq!(frames(&out).len(), 2);
    let t = terminal.borrow();
    assert_eq!((t.enters, t.leaves), (0, 0));
}

#[test]
fn each_cycle_is_bounded_by_the_poll_window() {
    let terminal = interactive_terminal();
    let mut processes = Processes::new(1, &terminal);
    processes.fail_on = Some(4);
    let mut keys = Keys::silent();
    let mut raw = RawModeController::new(FakeBackend(terminal.clone()));
    let mut out = Vec::new();
    let mut input = Cursor::new(Vec::new());

    let config = fast_config();
    let window = config.poll_window;
    let tick = config.poll_tick;
    let mut monitor = LiveMonitor::new(&processes, &Size(80, 24), &mut keys, config);

    let start = Instant::now();
    assert!(monitor.run(&mut raw, &mut out, &mut input).is_err());
    let elapsed = start.elapsed();

    assert!(elapsed >= window * 3);
    assert!(elapsed < (window + tick) * 3 + Duration::from_millis(300), "{elapsed:?}");
}

#[test]
fn controller_can_be_reused_after_a_run() {
    let terminal = interactive_terminal();
    let mut raw = RawModeController::new(FakeBackend(terminal.clone()));

    for _ in 0..2 {
        let processes = Processes::new(1, &terminal);
        let mut keys = Keys::new(&[Some(b'q')]);
        let mut out = Vec::new();
        let mut input = Cursor::new(b"\n".to_vec());
        let mut monitor = LiveMonitor::new(&processes, &Size(80, 24), &mut keys, fast_config());
        monitor.run(&mut raw, &mut out, &mut input).unwrap();
        assert!(!terminal.borrow().raw);
    }

    assert_eq!(terminal.borrow().enters, 2);
    assert_eq!(terminal.borrow().leaves, 2);
}
