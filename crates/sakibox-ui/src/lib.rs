//! Terminal layer for sakibox.
//!
//! Owns everything that touches the terminal directly: viewport probing,
//! raw-mode acquisition and release, bounded keyboard polling, frame
//! composition for the live process monitor, and coloured menu output.

pub mod frame;
pub mod input;
pub mod palette;
pub mod raw_mode;
pub mod viewport;

pub use sakibox_core as core;
