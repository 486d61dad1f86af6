//! Process listings backed by `ps`, plus the search / top / kill tools built
//! on top of them.
//!
//! Every call takes a fresh snapshot; nothing is cached between calls.

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use sakibox_core::error::{Result, ToolboxError};
use sakibox_core::models::{ProcessEntry, ProcessUsage};
use tracing::{debug, warn};

use crate::command;

const LIST_ARGS: [&str; 3] = ["-A", "-o", "pid,comm"];
const USAGE_ARGS: [&str; 3] = ["-A", "-o", "pid,comm,%cpu,%mem"];

// ── SnapshotProvider ──────────────────────────────────────────────────────────

/// Source of the current OS process list.
///
/// Implementations are pure queries: each call reflects the system as of that
/// call and keeps no state between calls. No ordering is promised.
pub trait SnapshotProvider {
    fn fetch_snapshot(&self) -> Result<Vec<ProcessEntry>>;
}

/// [`SnapshotProvider`] that shells out to `ps -A -o pid,comm`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PsSnapshotProvider;

impl SnapshotProvider for PsSnapshotProvider {
    fn fetch_snapshot(&self) -> Result<Vec<ProcessEntry>> {
        let output = run_ps(&LIST_ARGS)?;
        let entries = parse_ps_listing(&output);
        debug!(count = entries.len(), "process snapshot taken");
        Ok(entries)
    }
}

// ── Tools ─────────────────────────────────────────────────────────────────────

/// Return page `page` (zero-based) of `entries`. A page past the end is empty.
pub fn page(entries: &[ProcessEntry], page: usize, page_size: usize) -> &[ProcessEntry] {
    let start = page.saturating_mul(page_size);
    if start >= entries.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(entries.len());
    &entries[start..end]
}

/// Processes whose name contains `keyword`.
pub fn search(provider: &dyn SnapshotProvider, keyword: &str) -> Result<Vec<ProcessEntry>> {
    let entries = provider.fetch_snapshot()?;
    Ok(filter_by_name(entries, keyword))
}

/// The `limit` processes using the most CPU, memory as tie-break.
pub fn top(limit: usize) -> Result<Vec<ProcessUsage>> {
    let output = run_ps(&USAGE_ARGS)?;
    Ok(rank_by_usage(parse_usage_listing(&output), limit))
}

/// Send SIGKILL to `pid`.
///
/// Non-positive PIDs address process groups (or every process), so they are
/// rejected before anything is signalled.
pub fn kill(pid: i64) -> Result<()> {
    let raw = i32::try_from(pid)
        .ok()
        .filter(|p| *p > 0)
        .ok_or(ToolboxError::InvalidPid(pid))?;

    signal::kill(Pid::from_raw(raw), Signal::SIGKILL).map_err(|errno| {
        warn!(pid = raw, error = %errno, "kill failed");
        ToolboxError::Signal {
            pid: raw,
            source: errno.into(),
        }
    })?;
    debug!(pid = raw, "sent SIGKILL");
    Ok(())
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `ps -o pid,comm` output.
///
/// The first line is the column header. Rows without a positive PID are
/// skipped; the name is everything after the PID column.
pub fn parse_ps_listing(text: &str) -> Vec<ProcessEntry> {
    text.lines()
        .skip(1)
        .filter_map(|line| {
            let (pid, rest) = split_pid(line)?;
            let name = rest.trim();
            if name.is_empty() {
                return None;
            }
            Some(ProcessEntry::new(pid, name))
        })
        .collect()
}

/// Parse `ps -o pid,comm,%cpu,%mem` output.
///
/// CPU and memory are the last two columns so that names containing spaces
/// survive.
pub fn parse_usage_listing(text: &str) -> Vec<ProcessUsage> {
    text.lines()
        .skip(1)
        .filter_map(|line| {
            let (pid, rest) = split_pid(line)?;
            let mut fields = rest.split_whitespace().collect::<Vec<_>>();
            if fields.len() < 3 {
                return None;
            }
            let mem = fields.pop()?.parse::<f64>().unwrap_or(0.0);
            let cpu = fields.pop()?.parse::<f64>().unwrap_or(0.0);
            Some(ProcessUsage {
                pid,
                name: fields.join(" "),
                cpu,
                mem,
            })
        })
        .collect()
}

fn split_pid(line: &str) -> Option<(u32, &str)> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    let split = trimmed
        .find(char::is_whitespace)
        .unwrap_or(trimmed.len());
    let (pid, rest) = trimmed.split_at(split);
    let pid = pid.parse::<u32>().ok().filter(|p| *p > 0)?;
    Some((pid, rest))
}

fn filter_by_name(entries: Vec<ProcessEntry>, keyword: &str) -> Vec<ProcessEntry> {
    entries
        .into_iter()
        .filter(|e| e.name.contains(keyword))
        .collect()
}

fn rank_by_usage(mut rows: Vec<ProcessUsage>, limit: usize) -> Vec<ProcessUsage> {
    rows.sort_by(|a, b| {
        b.cpu
            .total_cmp(&a.cpu)
            .then_with(|| b.mem.total_cmp(&a.mem))
    });
    rows.truncate(limit);
    rows
}

fn run_ps(args: &[&str]) -> Result<String> {
    command::run("ps", args)?.into_stdout()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
