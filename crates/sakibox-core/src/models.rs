//! Plain data records shared across the toolbox crates.

// ── ProcessEntry ──────────────────────────────────────────────────────────────

/// One row of a process snapshot.
///
/// Entries are rebuilt on every poll; nothing tracks a process across
/// snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    /// Process ID, always positive.
    pub pid: u32,
    /// Command name as reported by the OS.
    pub name: String,
}

impl ProcessEntry {
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
        }
    }
}

// ── ProcessUsage ──────────────────────────────────────────────────────────────

/// A process row with resource usage, used by the top view.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessUsage {
    pub pid: u32,
    pub name: String,
    /// CPU usage in percent.
    pub cpu: f64,
    /// Resident memory in percent of physical memory.
    pub mem: f64,
}

// ── PortEntry ─────────────────────────────────────────────────────────────────

/// A listening TCP socket and the process that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortEntry {
    pub port: u16,
    /// Command name of the owning process.
    pub process: String,
    /// Owning PID, or 0 when the listing did not carry a usable one.
    pub pid: u32,
}

impl PortEntry {
    pub fn new(port: u16, process: impl Into<String>, pid: u32) -> Self {
        Self {
            port,
            process: process.into(),
            pid,
        }
    }
}

// ── Viewport ──────────────────────────────────────────────────────────────────

/// Terminal grid dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub columns: u16,
    pub rows: u16,
}

impl Viewport {
    /// Dimensions used whenever the terminal cannot report a usable size.
    pub const FALLBACK: Viewport = Viewport {
        columns: 80,
        rows: 24,
    };

    /// Build a viewport, rejecting zero-sized readings.
    pub fn new(columns: u16, rows: u16) -> Option<Self> {
        if columns == 0 || rows == 0 {
            None
        } else {
            Some(Self { columns, rows })
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::FALLBACK
    }
}
