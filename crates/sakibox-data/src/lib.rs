//! Data layer for sakibox.
//!
//! Wraps the OS process table and the listening-socket table: snapshots for
//! the live monitor, the listing, search, top and kill tools of the process
//! menu, and the port tools.

mod command;
pub mod port;
pub mod process;

pub use sakibox_core as core;
