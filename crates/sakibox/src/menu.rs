//! Cooked-mode text menus.
//!
//! Every prompt reads one line from the shared reader; the live monitor gets
//! the same reader for its closing "press Enter".

use std::io::{BufRead, Write};

use anyhow::Result;
use sakibox_core::models::{PortEntry, ProcessEntry};
use sakibox_core::settings::Settings;
use sakibox_data::port::{self, PortSource};
use sakibox_data::process::{self, SnapshotProvider};
use sakibox_runtime::live_monitor::{LiveMonitor, MonitorConfig};
use sakibox_ui::input::TerminalKeys;
use sakibox_ui::palette::{self, Tone};
use sakibox_ui::raw_mode::{RawModeController, TerminalModeBackend};
use sakibox_ui::viewport::CrosstermViewport;

const LOGO: &str = r"           _    _ _
  ___  __ _| | _(_) |__   _____  __
 / __|/ _` | |/ / | '_ \ / _ \ \/ /
 \__ \ (_| |   <| | |_) | (_) >  <
 |___/\__,_|_|\_\_|_.__/ \___/_/\_\";

/// What the caller should do after a submenu returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub struct Menu<'a, B: TerminalModeBackend> {
    settings: &'a Settings,
    snapshots: &'a dyn SnapshotProvider,
    ports: &'a dyn PortSource,
    raw: &'a mut RawModeController<B>,
    reader: &'a mut dyn BufRead,
    out: &'a mut dyn Write,
}

impl<'a, B: TerminalModeBackend> Menu<'a, B> {
    pub fn new(
        settings: &'a Settings,
        snapshots: &'a dyn SnapshotProvider,
        ports: &'a dyn PortSource,
        raw: &'a mut RawModeController<B>,
        reader: &'a mut dyn BufRead,
        out: &'a mut dyn Write,
    ) -> Self {
        Self {
            settings,
            snapshots,
            ports,
            raw,
            reader,
            out,
        }
    }

    // ── Main menu ─────────────────────────────────────────────────────────

    /// Run the main menu until the user exits or stdin closes.
    pub fn run(&mut self) -> Result<()> {
        loop {
            palette::line(self.out, Tone::Title, LOGO)?;
            palette::line(self.out, Tone::Hint, "What shall we look at today?")?;
            writeln!(self.out)?;
            writeln!(self.out, "  1. Process monitor")?;
            writeln!(self.out, "  2. Port tools")?;
            writeln!(self.out, "  0. Exit")?;

            let Some(choice) = self.ask("\n  Choose an option: ")? else {
                return Ok(());
            };
            match choice.as_str() {
                "1" => {
                    if self.process_menu()? == Flow::Exit {
                        return Ok(());
                    }
                }
                "2" => {
                    if self.port_menu()? == Flow::Exit {
                        return Ok(());
                    }
                }
                "0" => {
                    palette::line(self.out, Tone::Hint, "Bye.")?;
                    return Ok(());
                }
                _ => self.invalid_option()?,
            }
        }
    }

    // ── Process menu ──────────────────────────────────────────────────────

    fn process_menu(&mut self) -> Result<Flow> {
        loop {
            palette::line(self.out, Tone::Title, "[Process monitor]")?;
            writeln!(self.out, "  1. Live process list")?;
            writeln!(self.out, "  2. Top processes by CPU")?;
            writeln!(self.out, "  3. Search processes")?;
            writeln!(self.out, "  4. Kill a process")?;
            writeln!(self.out, "  5. Browse all processes")?;
            writeln!(self.out, "  0. Back")?;

            let Some(choice) = self.ask("\n  Choose an option: ")? else {
                return Ok(Flow::Exit);
            };
            let flow = match choice.as_str() {
                "1" => self.live_view()?,
                "2" => self.top_view()?,
                "3" => self.search()?,
                "4" => self.kill()?,
                "5" => self.browse()?,
                "0" => return Ok(Flow::Continue),
                _ => {
                    self.invalid_option()?;
                    Flow::Continue
                }
            };
            if flow == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
    }

    /// Live monitor with the user's timing settings.
    ///
    /// Failures are reported here; the terminal is already back in cooked
    /// mode when the error arrives.
    fn live_view(&mut self) -> Result<Flow> {
        palette::line(self.out, Tone::Hint, "Starting live view, press q to stop.")?;
        match self.live_monitor() {
            Ok(()) => Ok(Flow::Continue),
            Err(e) => {
                palette::line(self.out, Tone::Error, &format!("Live view stopped: {e}"))?;
                self.wait_for_enter()
            }
        }
    }

    /// Enter the live monitor directly.
    pub fn live_monitor(&mut self) -> Result<()> {
        let config = MonitorConfig {
            poll_window: self.settings.refresh_interval(),
            poll_tick: self.settings.poll_tick(),
            ..MonitorConfig::default()
        };
        let viewport = CrosstermViewport;
        let mut keys = TerminalKeys;
        let mut monitor = LiveMonitor::new(self.snapshots, &viewport, &mut keys, config);
        let report = monitor.run(self.raw, self.out, self.reader)?;
        tracing::info!(cycles = report.cycles, session = ?report.session, "live view finished");
        Ok(())
    }

    fn top_view(&mut self) -> Result<Flow> {
        let limit = usize::try_from(self.settings.top_count).unwrap_or(usize::MAX);
        loop {
            match process::top(limit) {
                Ok(rows) => {
                    palette::line(self.out, Tone::Prompt, "\n  PID   NAME          CPU%   MEM%")?;
                    for row in rows {
                        writeln!(
                            self.out,
                            "  {:<5} {:<12} {:<6.1} {:<6.1}",
                            row.pid, row.name, row.cpu, row.mem
                        )?;
                    }
                }
                Err(e) => palette::line(self.out, Tone::Error, &e.to_string())?,
            }
            palette::line(self.out, Tone::Hint, "r: refresh, 0: back")?;

            let Some(input) = self.ask("\n  Choose: ")? else {
                return Ok(Flow::Exit);
            };
            match input.as_str() {
                "0" => return Ok(Flow::Continue),
                "r" | "R" => continue,
                _ => palette::line(self.out, Tone::Error, "Invalid option.")?,
            }
        }
    }

    fn search(&mut self) -> Result<Flow> {
        let Some(keyword) = self.ask("\n  Process name contains: ")? else {
            return Ok(Flow::Exit);
        };
        match process::search(self.snapshots, &keyword) {
            Ok(found) if found.is_empty() => {
                palette::line(self.out, Tone::Warning, "No matching process.")?;
            }
            Ok(found) => {
                self.print_entries(&found)?;
                palette::line(
                    self.out,
                    Tone::Success,
                    &format!("{} matching processes.", found.len()),
                )?;
            }
            Err(e) => palette::line(self.out, Tone::Error, &e.to_string())?,
        }
        self.wait_for_enter()
    }

    fn kill(&mut self) -> Result<Flow> {
        let Some(input) = self.ask("\n  PID to kill: ")? else {
            return Ok(Flow::Exit);
        };
        let Ok(pid) = input.parse::<i64>() else {
            palette::line(self.out, Tone::Error, "That is not a PID.")?;
            return self.wait_for_enter();
        };
        let Some(confirm) = self.ask(&format!("  Send SIGKILL to {pid}? (y/N): "))? else {
            return Ok(Flow::Exit);
        };
        if !confirm.eq_ignore_ascii_case("y") {
            palette::line(self.out, Tone::Warning, "Cancelled.")?;
            return self.wait_for_enter();
        }
        match process::kill(pid) {
            Ok(()) => palette::line(self.out, Tone::Success, &format!("Process {pid} killed."))?,
            Err(e) => palette::line(self.out, Tone::Error, &e.to_string())?,
        }
        self.wait_for_enter()
    }

    fn browse(&mut self) -> Result<Flow> {
        let entries = match self.snapshots.fetch_snapshot() {
            Ok(entries) => entries,
            Err(e) => {
                palette::line(self.out, Tone::Error, &e.to_string())?;
                return self.wait_for_enter();
            }
        };
        let page_size = usize::try_from(self.settings.page_size)
            .unwrap_or(1)
            .max(1);
        let pages = entries.len().div_ceil(page_size).max(1);
        let mut current = 0;

        loop {
            self.print_entries(process::page(&entries, current, page_size))?;
            palette::line(
                self.out,
                Tone::Hint,
                &format!("Page {}/{}  n: next, p: previous, 0: back", current + 1, pages),
            )?;
            let Some(input) = self.ask("\n  Choose: ")? else {
                return Ok(Flow::Exit);
            };
            match input.as_str() {
                "0" => return Ok(Flow::Continue),
                "n" | "N" if current + 1 < pages => current += 1,
                "p" | "P" if current > 0 => current -= 1,
                "n" | "N" | "p" | "P" => {
                    palette::line(self.out, Tone::Warning, "No more pages that way.")?
                }
                _ => palette::line(self.out, Tone::Error, "Invalid option.")?,
            }
        }
    }

    // ── Port menu ─────────────────────────────────────────────────────────

    fn port_menu(&mut self) -> Result<Flow> {
        loop {
            palette::line(self.out, Tone::Title, "[Port tools]")?;
            writeln!(self.out, "  1. List listening ports")?;
            writeln!(self.out, "  2. Find a port")?;
            writeln!(self.out, "  3. Kill the process on a port")?;
            writeln!(self.out, "  0. Back")?;

            let Some(choice) = self.ask("\n  Choose an option: ")? else {
                return Ok(Flow::Exit);
            };
            let flow = match choice.as_str() {
                "1" => self.list_ports()?,
                "2" => self.find_port()?,
                "3" => self.kill_port()?,
                "0" => return Ok(Flow::Continue),
                _ => {
                    self.invalid_option()?;
                    Flow::Continue
                }
            };
            if flow == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
    }

    fn list_ports(&mut self) -> Result<Flow> {
        match self.ports.listening_ports() {
            Ok(entries) if entries.is_empty() => {
                palette::line(self.out, Tone::Warning, "Nothing is listening.")?;
            }
            Ok(entries) => self.print_ports(&entries)?,
            Err(e) => palette::line(self.out, Tone::Error, &e.to_string())?,
        }
        self.wait_for_enter()
    }

    fn find_port(&mut self) -> Result<Flow> {
        let Some(number) = self.ask_port("\n  Port to look up: ")? else {
            return Ok(Flow::Exit);
        };
        if let Some(number) = number {
            match port::find_port(self.ports, number) {
                Ok(entry) => self.print_ports(std::slice::from_ref(&entry))?,
                Err(e) => palette::line(self.out, Tone::Error, &e.to_string())?,
            }
        }
        self.wait_for_enter()
    }

    fn kill_port(&mut self) -> Result<Flow> {
        let Some(number) = self.ask_port("\n  Port whose process to kill: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(number) = number else {
            return self.wait_for_enter();
        };
        let Some(confirm) =
            self.ask(&format!("  Send SIGKILL to the process on port {number}? (y/N): "))?
        else {
            return Ok(Flow::Exit);
        };
        if !confirm.eq_ignore_ascii_case("y") {
            palette::line(self.out, Tone::Warning, "Cancelled.")?;
            return self.wait_for_enter();
        }
        match port::kill_by_port(self.ports, number) {
            Ok(entry) => palette::line(
                self.out,
                Tone::Success,
                &format!("Killed {} (PID {}) on port {number}.", entry.process, entry.pid),
            )?,
            Err(e) => palette::line(self.out, Tone::Error, &e.to_string())?,
        }
        self.wait_for_enter()
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn print_ports(&mut self, entries: &[PortEntry]) -> Result<()> {
        palette::line(self.out, Tone::Prompt, "\n  PORT  PROCESS       PID")?;
        for entry in entries {
            writeln!(self.out, "  {:<5} {:<12} {}", entry.port, entry.process, entry.pid)?;
        }
        Ok(())
    }

    /// Ask for a port number. The inner `None` means the input was rejected
    /// and already reported.
    fn ask_port(&mut self, prompt: &str) -> Result<Option<Option<u16>>> {
        let Some(input) = self.ask(prompt)? else {
            return Ok(None);
        };
        match input.parse::<u16>() {
            Ok(number) => Ok(Some(Some(number))),
            Err(_) => {
                palette::line(self.out, Tone::Error, "That is not a port number.")?;
                Ok(Some(None))
            }
        }
    }

    fn print_entries(&mut self, entries: &[ProcessEntry]) -> Result<()> {
        palette::line(self.out, Tone::Prompt, "\n  PID   NAME")?;
        for entry in entries {
            writeln!(self.out, "  {:<5} {}", entry.pid, entry.name)?;
        }
        Ok(())
    }

    /// Prompt and read one trimmed line. `None` means stdin is closed.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        palette::prompt(self.out, prompt)?;
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn wait_for_enter(&mut self) -> Result<Flow> {
        palette::line(self.out, Tone::Prompt, "Press Enter to continue...")?;
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(Flow::Exit);
        }
        Ok(Flow::Continue)
    }

    fn invalid_option(&mut self) -> Result<()> {
        palette::line(self.out, Tone::Error, "Invalid option.")?;
        self.wait_for_enter()?;
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
