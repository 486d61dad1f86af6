//! Terminal size probing with a fixed fallback.

use std::io;

use sakibox_core::models::Viewport;
use tracing::warn;

/// Reports the terminal's `(columns, rows)`.
pub trait ViewportProbe {
    fn probe(&self) -> io::Result<(u16, u16)>;
}

/// [`ViewportProbe`] backed by `crossterm::terminal::size`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrosstermViewport;

impl ViewportProbe for CrosstermViewport {
    fn probe(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }
}

/// Query `probe`, substituting [`Viewport::FALLBACK`] for errors and zero
/// readings. Never fails.
pub fn current_viewport(probe: &dyn ViewportProbe) -> Viewport {
    match probe.probe() {
        Ok((columns, rows)) => Viewport::new(columns, rows).unwrap_or_else(|| {
            warn!(columns, rows, "unusable viewport reading; using fallback");
            Viewport::FALLBACK
        }),
        Err(e) => {
            warn!(error = %e, "viewport probe failed; using fallback");
            Viewport::FALLBACK
        }
    }
}
