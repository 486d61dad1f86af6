//! Listening TCP ports, backed by `lsof`.
//!
//! Like the process tools, every call reads a fresh listing.

use sakibox_core::error::{Result, ToolboxError};
use sakibox_core::models::PortEntry;
use tracing::debug;

use crate::command;
use crate::process;

const LSOF_ARGS: [&str; 3] = ["-iTCP", "-sTCP:LISTEN", "-Pn"];

/// Minimum column count of an `lsof` socket row.
const MIN_FIELDS: usize = 9;

// ── PortSource ────────────────────────────────────────────────────────────────

/// Source of the sockets currently listening for TCP connections.
pub trait PortSource {
    fn listening_ports(&self) -> Result<Vec<PortEntry>>;
}

/// [`PortSource`] that shells out to `lsof -iTCP -sTCP:LISTEN -Pn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LsofPortSource;

impl PortSource for LsofPortSource {
    fn listening_ports(&self) -> Result<Vec<PortEntry>> {
        let output = command::run("lsof", &LSOF_ARGS)?;
        // lsof exits 1 without output when nothing matches.
        if !output.status.success() && output.stdout.trim().is_empty() {
            debug!("no listening sockets");
            return Ok(Vec::new());
        }
        let entries = parse_lsof_listing(&output.into_stdout()?);
        debug!(count = entries.len(), "port listing taken");
        Ok(entries)
    }
}

// ── Tools ─────────────────────────────────────────────────────────────────────

/// First listening socket bound to `port`.
pub fn find_port(source: &dyn PortSource, port: u16) -> Result<PortEntry> {
    source
        .listening_ports()?
        .into_iter()
        .find(|entry| entry.port == port)
        .ok_or(ToolboxError::PortNotFound(port))
}

/// SIGKILL the process listening on `port`. Returns the entry that was hit.
pub fn kill_by_port(source: &dyn PortSource, port: u16) -> Result<PortEntry> {
    let entry = find_port(source, port)?;
    process::kill(i64::from(entry.pid))?;
    Ok(entry)
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `lsof -iTCP -sTCP:LISTEN -Pn` output.
///
/// Columns are `COMMAND PID USER FD TYPE DEVICE SIZE/OFF NODE NAME`, where
/// NAME is `host:port` optionally followed by `(LISTEN)`. A socket listening
/// on both IPv4 and IPv6 is reported once.
pub fn parse_lsof_listing(text: &str) -> Vec<PortEntry> {
    let mut entries: Vec<PortEntry> = Vec::new();
    for line in text.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < MIN_FIELDS {
            continue;
        }
        let Some(port) = fields.iter().rev().find_map(|f| port_of(f)) else {
            continue;
        };
        let pid = fields[1].parse::<u32>().unwrap_or(0);
        let entry = PortEntry::new(port, fields[0], pid);
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    }
    entries
}

/// Port of a `host:port` address such as `*:8080` or `[::1]:5432`.
fn port_of(address: &str) -> Option<u16> {
    let (_, port) = address.rsplit_once(':')?;
    port.parse().ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
