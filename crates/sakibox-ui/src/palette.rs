//! Coloured line output for the cooked-mode menus.
//!
//! Each role maps to one foreground colour. Writers take any `io::Write` so
//! menu text can be captured in tests.

use std::io::{self, Write};

use crossterm::style::{Color, Stylize};

/// Semantic role of a menu line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Section titles.
    Title,
    /// Hints and narration.
    Hint,
    /// Successful outcomes.
    Success,
    /// Failures.
    Error,
    /// Cancelled or empty results.
    Warning,
    /// Prompts such as "press Enter".
    Prompt,
}

impl Tone {
    pub fn color(self) -> Color {
        match self {
            Tone::Title => Color::Cyan,
            Tone::Hint => Color::Magenta,
            Tone::Success => Color::Green,
            Tone::Error => Color::Red,
            Tone::Warning => Color::Yellow,
            Tone::Prompt => Color::White,
        }
    }
}

/// Write `msg` in the colour of `tone`, followed by a newline.
pub fn line(out: &mut dyn Write, tone: Tone, msg: &str) -> io::Result<()> {
    writeln!(out, "{}", msg.with(tone.color()))
}

/// Write an uncoloured prompt without a newline and flush it.
pub fn prompt(out: &mut dyn Write, msg: &str) -> io::Result<()> {
    write!(out, "{msg}")?;
    out.flush()
}
