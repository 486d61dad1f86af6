//! Full-screen frame composition for the live process monitor.
//!
//! A frame is a fixed grid: every line is padded or truncated to exactly the
//! viewport width so a repaint never leaves cells from an earlier, wider
//! frame behind. Frames are never diffed; each cycle repaints everything.
//!
//! Layout, top to bottom:
//!
//! 1. header (`PID   NAME`)
//! 2. body: `max(rows - 4, 5)` process rows, blank when there are fewer
//! 3. summary (`showing M of N processes`)
//! 4. blank separator
//! 5. footer

use sakibox_core::models::ProcessEntry;
use unicode_width::UnicodeWidthChar;

/// Clears the screen and homes the cursor.
pub const CLEAR_AND_HOME: &str = "\x1b[2J\x1b[H";

/// Column header above the process rows.
pub const HEADER: &str = "PID   NAME";

/// Smallest body the renderer will lay out, whatever the viewport.
pub const MIN_BODY_ROWS: usize = 5;

/// Lines that are not body rows: header, summary, separator, footer.
pub const FIXED_ROWS: usize = 4;

/// Line separator. Raw mode disables output post-processing, so a bare
/// `\n` would not return the cursor to column 0.
const LINE_BREAK: &str = "\r\n";

/// Number of process rows a frame of `rows` lines can show.
pub fn body_capacity(rows: usize) -> usize {
    rows.saturating_sub(FIXED_ROWS).max(MIN_BODY_ROWS)
}

// ── Frame ─────────────────────────────────────────────────────────────────────

/// One rendered screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    lines: Vec<String>,
    shown: usize,
}

impl Frame {
    /// Grid lines, each exactly as wide as the viewport.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of process entries that made it into the body.
    pub fn shown(&self) -> usize {
        self.shown
    }

    /// Escape-prefixed buffer ready to be written in one call. The last line
    /// is not terminated so the screen never scrolls.
    pub fn to_buffer(&self) -> String {
        let width = self.lines.first().map_or(0, |l| l.len() + LINE_BREAK.len());
        let mut buffer = String::with_capacity(CLEAR_AND_HOME.len() + width * self.lines.len());
        buffer.push_str(CLEAR_AND_HOME);
        buffer.push_str(&self.lines.join(LINE_BREAK));
        buffer
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Compose a frame for a `cols` × `rows` viewport.
///
/// Entries beyond the body capacity are dropped for this frame.
pub fn render_frame(entries: &[ProcessEntry], rows: usize, cols: usize, footer: &str) -> Frame {
    let capacity = body_capacity(rows);
    let shown = entries.len().min(capacity);

    let mut lines = Vec::with_capacity(capacity + FIXED_ROWS);
    lines.push(pad_line(HEADER, cols));
    lines.extend(
        entries[..shown]
            .iter()
            .map(|entry| pad_line(&format_entry(entry), cols)),
    );
    lines.extend((shown..capacity).map(|_| pad_line("", cols)));
    lines.push(pad_line(
        &format!("showing {} of {} processes", shown, entries.len()),
        cols,
    ));
    lines.push(pad_line("", cols));
    lines.push(pad_line(footer, cols));

    Frame { lines, shown }
}

/// `PID` left-aligned in five columns, then the name, matching [`HEADER`].
pub fn format_entry(entry: &ProcessEntry) -> String {
    format!("{:<5} {}", entry.pid, entry.name)
}

/// Pad or truncate `text` to exactly `cols` terminal columns.
///
/// Control characters are replaced with `?` so they cannot move the cursor.
/// A double-width character that would straddle the edge is replaced by
/// padding.
pub fn pad_line(text: &str, cols: usize) -> String {
    let mut line = String::with_capacity(cols);
    let mut used = 0;
    for c in text.chars() {
        let c = if c.is_control() { '?' } else { c };
        let w = c.width().unwrap_or(0);
        if used + w > cols {
            break;
        }
        line.push(c);
        used += w;
    }
    line.extend(std::iter::repeat(' ').take(cols - used));
    line
}

// ── Tests ─────────────────────────────────────────────────────────────────────
