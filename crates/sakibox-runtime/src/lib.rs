//! Runtime layer for sakibox.
//!
//! Ties the data and terminal layers together into the live process
//! monitor loop.

pub mod live_monitor;

pub use sakibox_core as core;
pub use sakibox_data as data;
pub use sakibox_ui as ui;
